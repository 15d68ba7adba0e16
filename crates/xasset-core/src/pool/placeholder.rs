//! Placeholder classification for pool records

use tracing::trace;

use crate::error::Result;
use crate::schema::{Field, Record};

use super::AssetStatus;

/// Classifies records as placeholders by sentinel name, by name prefix, or by
/// matching the data pointers of the first sentinel record seen.
///
/// The template is captured once per walk; every later record whose
/// fingerprint equals it is a placeholder regardless of its name.
#[derive(Debug, Clone)]
pub struct PlaceholderFilter {
    sentinels: &'static [&'static str],
    prefixes: &'static [&'static str],
    fields: Vec<Field>,
    template: Option<Vec<u64>>,
}

impl PlaceholderFilter {
    pub fn new(
        sentinels: &'static [&'static str],
        prefixes: &'static [&'static str],
        fields: Vec<Field>,
    ) -> Self {
        Self {
            sentinels,
            prefixes,
            fields,
            template: None,
        }
    }

    /// Filter that never matches
    pub fn none() -> Self {
        Self::new(&[], &[], Vec::new())
    }

    pub fn template(&self) -> Option<&[u64]> {
        self.template.as_deref()
    }

    pub fn classify(&mut self, name: &str, record: &Record) -> Result<AssetStatus> {
        if self.sentinels.contains(&name) {
            if self.template.is_none() && !self.fields.is_empty() {
                let fingerprint = record.fingerprint(&self.fields)?;
                trace!("Placeholder template from {} at {:#x}", name, record.address());
                self.template = Some(fingerprint);
            }
            return Ok(AssetStatus::Placeholder);
        }

        if let Some(template) = &self.template
            && record.fingerprint(&self.fields)? == *template
        {
            return Ok(AssetStatus::Placeholder);
        }

        if self.prefixes.iter().any(|p| name.starts_with(p)) {
            return Ok(AssetStatus::Placeholder);
        }

        Ok(AssetStatus::Loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::PointerWidth;
    use crate::schema::{ptr_at, u8_at};

    fn record(address: u64, pointers: [u32; 2], bones: u8) -> Record {
        let mut data = vec![0u8; 12];
        data[0..4].copy_from_slice(&pointers[0].to_le_bytes());
        data[4..8].copy_from_slice(&pointers[1].to_le_bytes());
        data[8] = bones;
        Record::from_bytes(address, data, PointerWidth::U32)
    }

    fn filter() -> PlaceholderFilter {
        PlaceholderFilter::new(&["void"], &["*"], vec![ptr_at(0), ptr_at(4), u8_at(8)])
    }

    #[test]
    fn test_template_matches_identical_records() {
        let mut filter = filter();
        assert_eq!(
            filter.classify("void", &record(0, [0x10, 0x20], 1)).unwrap(),
            AssetStatus::Placeholder
        );
        assert_eq!(filter.template(), Some(&[0x10, 0x20, 1][..]));

        // Classification is stable for every bit-identical record
        for address in [0x100, 0x200, 0x300] {
            assert_eq!(
                filter
                    .classify("helmet_mk1", &record(address, [0x10, 0x20], 1))
                    .unwrap(),
                AssetStatus::Placeholder
            );
        }
        assert_eq!(
            filter
                .classify("helmet_mk1", &record(0x400, [0x10, 0x24], 1))
                .unwrap(),
            AssetStatus::Loaded
        );
    }

    #[test]
    fn test_template_is_kept_from_first_sentinel() {
        let mut filter = filter();
        filter.classify("void", &record(0, [0x10, 0x20], 1)).unwrap();
        filter.classify("void", &record(0x10, [0x30, 0x40], 1)).unwrap();
        assert_eq!(filter.template(), Some(&[0x10, 0x20, 1][..]));
    }

    #[test]
    fn test_no_template_before_sentinel() {
        let mut filter = filter();
        assert_eq!(
            filter.classify("body_a", &record(0, [0, 0], 0)).unwrap(),
            AssetStatus::Loaded
        );
    }

    #[test]
    fn test_prefix_marks_placeholder() {
        let mut filter = filter();
        assert_eq!(
            filter.classify("*12", &record(0, [1, 2], 3)).unwrap(),
            AssetStatus::Placeholder
        );
        assert_eq!(
            PlaceholderFilter::none()
                .classify("void", &record(0, [0, 0], 0))
                .unwrap(),
            AssetStatus::Loaded
        );
    }
}
