//! Control-key encoding.

/// Byte sent for Ctrl+`key`.
///
/// Letters map case-insensitively to `ord(letter) - ord('A') + 1`, so
/// `'A'` is `0x01` and `'c'` is `0x03`. The remaining C0 controls are
/// reachable through their usual keys (`@`, `[`, `\`, `]`, `^`, `_`) and
/// `?` gives DEL.
pub fn control_code(key: char) -> Option<u8> {
    match key {
        'a'..='z' => Some(key as u8 - b'a' + 1),
        'A'..='Z' => Some(key as u8 - b'A' + 1),
        '@' => Some(0x00),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' => Some(0x1f),
        '?' => Some(0x7f),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters() {
        assert_eq!(control_code('A'), Some(1));
        assert_eq!(control_code('a'), Some(1));
        assert_eq!(control_code('C'), Some(3));
        assert_eq!(control_code('Z'), Some(26));
        for c in 'A'..='Z' {
            assert_eq!(control_code(c), Some(c as u8 - b'A' + 1));
        }
    }

    #[test]
    fn test_symbols() {
        assert_eq!(control_code('@'), Some(0));
        assert_eq!(control_code('['), Some(27));
        assert_eq!(control_code(']'), Some(29));
        assert_eq!(control_code('?'), Some(127));
    }

    #[test]
    fn test_unmapped() {
        assert_eq!(control_code('1'), None);
        assert_eq!(control_code(' '), None);
        assert_eq!(control_code('é'), None);
    }
}
