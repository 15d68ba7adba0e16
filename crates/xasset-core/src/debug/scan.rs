use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::memory::ReadMemory;
use crate::offset::{OffsetSignatureSet, ScanRegion, SignatureScanner};

/// Raw matches of one signature
#[derive(Debug, Clone, Serialize)]
pub struct SignatureHit {
    pub entry: String,
    pub pattern: String,
    pub matches: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub signature_set: String,
    pub region_start: u64,
    pub region_len: u64,
    pub hits: Vec<SignatureHit>,
}

impl ScanResult {
    /// Scan the main module for every signature of `signatures`
    pub fn collect<R: ReadMemory + ?Sized>(reader: &R, signatures: &OffsetSignatureSet) -> Result<Self> {
        let region = ScanRegion::main_module(reader);
        let scanner = SignatureScanner::new(reader);

        let mut hits = Vec::new();
        for entry in &signatures.entries {
            for signature in &entry.signatures {
                let matches = scanner.scan(&signature.pattern_bytes()?, region)?;
                debug!("  {}: {} matches for {}", entry.name, matches.len(), signature.pattern);
                hits.push(SignatureHit {
                    entry: entry.name.clone(),
                    pattern: signature.pattern.clone(),
                    matches,
                });
            }
        }

        Ok(Self {
            signature_set: signatures.version.clone(),
            region_start: region.start,
            region_len: region.len,
            hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;
    use crate::offset::CodeSignature;

    #[test]
    fn test_scan_reports_every_signature() {
        let reader = MockMemoryBuilder::new()
            .module(0x40_0000, 0x1000)
            .zeroed(0x40_0000, 0x1000)
            .write(0x40_0100, &[0xF7, 0xEE, 0xD1, 0xFA])
            .build();
        let signatures = OffsetSignatureSet::new("test")
            .with_entry("stringTable", vec![CodeSignature::absolute("F7 EE ?? FA", 0)])
            .with_entry("poolTable", vec![CodeSignature::absolute("AA BB CC", 0)]);

        let result = ScanResult::collect(&reader, &signatures).unwrap();
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].matches, vec![0x40_0100]);
        assert!(result.hits[1].matches.is_empty());
    }
}
