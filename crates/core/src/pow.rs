//! Proof-of-work predicate.

/// Returns true if `hash_hex` starts with at least `difficulty` `'0'` digits.
///
/// A difficulty of zero accepts every hash. A difficulty longer than the
/// hash itself can never be satisfied.
pub fn is_valid_pow(hash_hex: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    hash_hex.len() >= required && hash_hex.bytes().take(required).all(|b| b == b'0')
}

/// Number of leading `'0'` hex digits in `hash_hex`.
pub fn leading_zeros(hash_hex: &str) -> u32 {
    hash_hex.bytes().take_while(|&b| b == b'0').count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_difficulty_accepts_anything() {
        assert!(is_valid_pow("ffff", 0));
        assert!(is_valid_pow("", 0));
    }

    #[test]
    fn test_prefix_rules() {
        assert!(is_valid_pow("0000abcd", 4));
        assert!(is_valid_pow("00000bcd", 4));
        assert!(!is_valid_pow("000abcde", 4));
        assert!(!is_valid_pow("a0000bcd", 4));
    }

    #[test]
    fn test_difficulty_longer_than_hash() {
        assert!(!is_valid_pow("000", 4));
        assert!(is_valid_pow("0000", 4));
    }

    #[test]
    fn test_difficulty_monotonic() {
        let hashes = ["0000a1", "000b22", "00c333", "0d4444", "e55555", "000000"];
        for h in hashes {
            for d2 in 0..=6 {
                for d1 in 0..d2 {
                    if is_valid_pow(h, d2) {
                        assert!(is_valid_pow(h, d1), "{h} valid at {d2} but not {d1}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(leading_zeros("000a0"), 3);
        assert_eq!(leading_zeros("a000"), 0);
        assert_eq!(leading_zeros("0000"), 4);
    }
}
