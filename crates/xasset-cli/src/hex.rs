//! Hexadecimal command-line values.

/// clap value parser for addresses and package keys: hex digits with an
/// optional `0x` prefix, `_` allowed as a separator
pub fn parse_hex(s: &str) -> Result<u64, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
        .replace('_', "");
    u64::from_str_radix(&digits, 16).map_err(|e| format!("'{}' is not a hex number: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Args {
        #[arg(long, value_parser = parse_hex, default_value = "0x400000")]
        base: u64,
    }

    #[test]
    fn test_prefix_is_optional() {
        assert_eq!(parse_hex("0x7FF6A0000000"), Ok(0x7FF6_A000_0000));
        assert_eq!(parse_hex("0Xdeadbeef"), Ok(0xDEAD_BEEF));
        assert_eq!(parse_hex("1f0"), Ok(0x1F0));
        assert_eq!(parse_hex("0x1_4000_0000"), Ok(0x1_4000_0000));
    }

    #[test]
    fn test_rejects_non_hex() {
        assert!(parse_hex("0xZZZ").is_err());
        assert!(parse_hex("").is_err());
        assert!(parse_hex("0x1_0000_0000_0000_0000").is_err());
    }

    #[test]
    fn test_parses_as_clap_argument() {
        assert_eq!(Args::try_parse_from(["t"]).unwrap().base, 0x40_0000);
        assert_eq!(Args::try_parse_from(["t", "--base", "140000000"]).unwrap().base, 0x1_4000_0000);
        let err = Args::try_parse_from(["t", "--base", "fortytwo"]).err().unwrap();
        assert!(err.to_string().contains("not a hex number"));
    }
}
