//! Mode S transponder codes.
//!
//! The registration database stores the 24-bit Mode S address as an eight
//! digit octal number (`MODE S CODE`). Everything downstream (ADS-B receivers,
//! OGN, flight trackers) uses the six digit hexadecimal form.

const MAX_ADDRESS: u32 = 0xFF_FFFF;

/// Parses an octal Mode S code into its 24-bit address.
pub fn parse_octal(code: &str) -> Option<u32> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    u32::from_str_radix(code, 8).ok().filter(|&address| address <= MAX_ADDRESS)
}

/// Parses a hexadecimal Mode S code into its 24-bit address.
pub fn parse_hex(code: &str) -> Option<u32> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    u32::from_str_radix(code, 16).ok().filter(|&address| address <= MAX_ADDRESS)
}

pub fn to_hex(address: u32) -> String {
    format!("{:06X}", address)
}

pub fn to_octal(address: u32) -> String {
    format!("{:08o}", address)
}

/// Converts an octal Mode S code into its hexadecimal form, e.g. `51106413`
/// into `A48D0B`.
pub fn octal_to_hex(code: &str) -> Option<String> {
    parse_octal(code).map(to_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octal_to_hex() {
        assert_eq!(octal_to_hex("51106413").as_deref(), Some("A48D0B"));
        assert_eq!(octal_to_hex("50000001").as_deref(), Some("A00001"));
        assert_eq!(octal_to_hex("00000001").as_deref(), Some("000001"));
        assert_eq!(octal_to_hex("77777777").as_deref(), Some("FFFFFF"));
    }

    #[test]
    fn test_octal_to_hex_invalid() {
        assert_eq!(octal_to_hex(""), None);
        assert_eq!(octal_to_hex("   "), None);
        assert_eq!(octal_to_hex("51106418"), None);
        assert_eq!(octal_to_hex("100000000"), None);
        assert_eq!(octal_to_hex("A48D0B"), None);
    }

    #[test]
    fn test_reversible() {
        for code in &["51106413", "50000001", "00000000", "77777777", "1234"] {
            let address = parse_octal(code).unwrap();
            let hex = to_hex(address);
            assert_eq!(parse_hex(&hex), Some(address));
            assert_eq!(parse_octal(&to_octal(address)), Some(address));
        }
    }

    #[test]
    fn test_to_octal() {
        assert_eq!(to_octal(0xA48D0B), "51106413");
        assert_eq!(to_octal(1), "00000001");
    }
}
