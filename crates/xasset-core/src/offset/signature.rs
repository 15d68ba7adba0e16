use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// How the operand found next to a signature match turns into an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// `next_ip + i32 displacement` (RIP-relative LEA/MOV)
    #[default]
    Relative,
    /// The operand is itself a 32-bit absolute address
    Absolute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSignature {
    pub pattern: String,
    /// Offset from the match to the instruction holding the operand (may be negative)
    pub instr_offset: i64,
    /// Offset of the operand inside the instruction
    pub disp_offset: usize,
    /// Instruction length, used for relative addressing
    #[serde(default)]
    pub instr_len: usize,
    #[serde(default)]
    pub addressing: Addressing,
    /// Read a pointer at the computed address
    #[serde(default)]
    pub deref: bool,
    /// Add the main module base to the result
    #[serde(default)]
    pub add_module_base: bool,
    #[serde(default)]
    pub addend: i64,
}

impl CodeSignature {
    /// Signature whose operand is a 32-bit absolute address `operand_offset` bytes from the match
    pub fn absolute(pattern: &str, operand_offset: i64) -> Self {
        Self {
            pattern: pattern.to_string(),
            instr_offset: operand_offset,
            disp_offset: 0,
            instr_len: 0,
            addressing: Addressing::Absolute,
            deref: false,
            add_module_base: false,
            addend: 0,
        }
    }

    /// Signature resolving a RIP-relative operand
    pub fn relative(pattern: &str, instr_offset: i64, disp_offset: usize, instr_len: usize) -> Self {
        Self {
            pattern: pattern.to_string(),
            instr_offset,
            disp_offset,
            instr_len,
            addressing: Addressing::Relative,
            deref: false,
            add_module_base: false,
            addend: 0,
        }
    }

    pub fn with_deref(mut self) -> Self {
        self.deref = true;
        self
    }

    /// Treat the operand as an offset from the main module base
    pub fn with_module_base(mut self) -> Self {
        self.add_module_base = true;
        self
    }

    pub fn pattern_bytes(&self) -> Result<Vec<Option<u8>>> {
        parse_pattern(&self.pattern)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetSignatureEntry {
    pub name: String,
    pub signatures: Vec<CodeSignature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OffsetSignatureSet {
    pub version: String,
    pub entries: Vec<OffsetSignatureEntry>,
}

impl OffsetSignatureSet {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, name: &str, signatures: Vec<CodeSignature>) -> Self {
        self.entries.push(OffsetSignatureEntry {
            name: name.to_string(),
            signatures,
        });
        self
    }

    pub fn entry(&self, name: &str) -> Option<&OffsetSignatureEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<OffsetSignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &OffsetSignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidSignature(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidSignature("Signature pattern is empty".to_string()));
    }
    if bytes.iter().all(Option::is_none) {
        return Err(Error::InvalidSignature(format!(
            "Signature pattern '{}' has no fixed bytes",
            pattern
        )));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[Option<u8>]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            Some(value) => format!("{:02X}", value),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let bytes = parse_pattern("8B 44 24 04 2B 05 ?? ?? ?? ?? 3D").unwrap();
        assert_eq!(bytes.len(), 11);
        assert_eq!(bytes[0], Some(0x8B));
        assert_eq!(bytes[5], Some(0x05));
        assert_eq!(bytes[6], None);
    }

    #[test]
    fn test_parse_pattern_rejects_bad_input() {
        assert!(parse_pattern("").is_err());
        assert!(parse_pattern("?? ??").is_err());
        assert!(parse_pattern("FF GG").is_err());
    }

    #[test]
    fn test_format_pattern_roundtrip() {
        let pattern = vec![Some(0x63), Some(0xC1), Some(0x48), None, Some(0xFF)];
        let formatted = format_pattern(&pattern);
        assert_eq!(formatted, "63 C1 48 ?? FF");
        let parsed = parse_pattern(&formatted).unwrap();
        assert_eq!(parsed, pattern);
    }

    #[test]
    fn test_signature_set_json_roundtrip() {
        let set = OffsetSignatureSet::new("ModernWarfare3").with_entry(
            "stringTable",
            vec![CodeSignature::absolute("8B 44 24 04 2B 05", 6).with_deref()],
        );

        let temp = tempfile::NamedTempFile::new().unwrap();
        save_signatures(temp.path(), &set).unwrap();
        let loaded = load_signatures(temp.path()).unwrap();

        let entry = loaded.entry("STRINGTABLE").unwrap();
        assert_eq!(entry.signatures[0].addressing, Addressing::Absolute);
        assert!(entry.signatures[0].deref);
        assert_eq!(entry.signatures[0].instr_offset, 6);
    }

    #[test]
    fn test_signature_defaults_when_fields_missing() {
        let json = r#"{"pattern": "48 8D 05", "instr_offset": 0, "disp_offset": 3, "instr_len": 7}"#;
        let sig: CodeSignature = serde_json::from_str(json).unwrap();
        assert_eq!(sig.addressing, Addressing::Relative);
        assert!(!sig.deref);
        assert!(!sig.add_module_base);
    }
}
