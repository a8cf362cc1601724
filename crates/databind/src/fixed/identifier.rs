//! Record identification by a fixed byte region.

use std::collections::BTreeMap;

use super::config::RecordIdentifier;
use crate::{
    charset::{self, Charset},
    error::{DataBindError, Result},
};

/// Maps the text of a byte region to a record name.
///
/// A region value without a mapping yields the default record name, or
/// the region text itself when no default is set.
///
/// # Examples
///
/// ```
/// use databind::charset;
/// use databind::fixed::{RecordIdentifier, RegionIdentifier};
///
/// let identifier = RegionIdentifier::new(1, 1, charset::UTF_8)
///     .unwrap()
///     .value("1", "header")
///     .default_record("data");
///
/// assert_eq!(identifier.identify(b"1test"), "header");
/// assert_eq!(identifier.identify(b"2aaa"), "data");
/// ```
#[derive(Debug, Clone)]
pub struct RegionIdentifier {
    offset: usize,
    length: usize,
    charset: Charset,
    values: BTreeMap<String, String>,
    default_record: Option<String>,
}

impl RegionIdentifier {
    /// Region of `length` bytes starting at the 1-based `offset`.
    pub fn new(offset: usize, length: usize, charset: Charset) -> Result<Self> {
        if offset == 0 || length == 0 || offset.checked_add(length).is_none() {
            return Err(DataBindError::Layout(format!(
                "record identifier region is invalid. offset:{offset}, length:{length}"
            )));
        }
        Ok(Self { offset, length, charset, values: BTreeMap::new(), default_record: None })
    }

    /// Maps region text `value` to `record_name`.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>, record_name: impl Into<String>) -> Self {
        self.values.insert(value.into(), record_name.into());
        self
    }

    #[must_use]
    pub fn default_record(mut self, record_name: impl Into<String>) -> Self {
        self.default_record = Some(record_name.into());
        self
    }
}

impl RecordIdentifier for RegionIdentifier {
    fn identify(&self, record: &[u8]) -> String {
        let start = (self.offset - 1).min(record.len());
        let end = start.saturating_add(self.length).min(record.len());
        let region = charset::decode(self.charset, &record[start..end]);

        match self.values.get(region.as_ref()) {
            Some(name) => name.clone(),
            None => self.default_record.clone().unwrap_or_else(|| region.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_and_default() {
        let identifier = RegionIdentifier::new(2, 2, charset::UTF_8)
            .unwrap()
            .value("01", "header")
            .value("02", "data")
            .default_record("trailer");

        assert_eq!(identifier.identify(b"x01yyy"), "header");
        assert_eq!(identifier.identify(b"x02yyy"), "data");
        assert_eq!(identifier.identify(b"x99yyy"), "trailer");
    }

    #[test]
    fn test_unmapped_region_text_is_returned() {
        let identifier = RegionIdentifier::new(1, 1, charset::UTF_8).unwrap().value("1", "header");
        assert_eq!(identifier.identify(b"9abc"), "9");
    }

    #[test]
    fn test_region_past_record_end() {
        let identifier = RegionIdentifier::new(4, 3, charset::UTF_8).unwrap();
        assert_eq!(identifier.identify(b"abcde"), "de");
        assert_eq!(identifier.identify(b"ab"), "");
    }

    #[test]
    fn test_shift_jis_region() {
        let identifier =
            RegionIdentifier::new(1, 2, charset::SHIFT_JIS).unwrap().value("あ", "kana");
        let record = charset::encode(charset::SHIFT_JIS, "あいう").unwrap();
        assert_eq!(identifier.identify(&record), "kana");
    }

    #[test]
    fn test_invalid_region() {
        assert!(RegionIdentifier::new(0, 1, charset::UTF_8).is_err());
        assert!(RegionIdentifier::new(1, 0, charset::UTF_8).is_err());
        assert!(RegionIdentifier::new(usize::MAX, 2, charset::UTF_8).is_err());
    }
}
