//! Random payload generation for probes.

use rand::Rng;

/// Letters a text payload is drawn from.
pub const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate `size` letters, each picked independently from [`ALPHABET`].
pub fn generate_text(size: usize) -> String {
    let mut rng = rand::rng();
    (0..size)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate `size` uniformly random bytes.
///
/// The result may contain the frame delimiter, in which case the echo is
/// cut short on read-back and the probe fails.
pub fn generate_binary(size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; size];
    rand::rng().fill(&mut buf[..]);
    buf
}

/// Generate `size` random bytes, none of which equal `excluded`.
///
/// Every other byte value stays equally likely.
pub fn generate_binary_excluding(size: usize, excluded: u8) -> Vec<u8> {
    let mut buf = generate_binary(size);
    let mut rng = rand::rng();
    for b in buf.iter_mut().filter(|b| **b == excluded) {
        let pick: u8 = rng.random_range(0..=254);
        *b = if pick >= excluded { pick + 1 } else { pick };
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_length_and_alphabet() {
        for size in [0, 1, 52, 100, 65536] {
            let text = generate_text(size);
            assert_eq!(text.len(), size);
            assert!(text.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_text_empty() {
        assert!(generate_text(0).is_empty());
    }

    #[test]
    fn test_text_mixes_case() {
        let text = generate_text(4096);
        assert!(text.bytes().any(|b| b.is_ascii_lowercase()));
        assert!(text.bytes().any(|b| b.is_ascii_uppercase()));
    }

    #[test]
    fn test_binary_length() {
        for size in [0, 1, 200, 65536] {
            assert_eq!(generate_binary(size).len(), size);
        }
    }

    #[test]
    fn test_binary_excluding_never_contains_byte() {
        for _ in 0..64 {
            let bytes = generate_binary_excluding(200, b'\n');
            assert_eq!(bytes.len(), 200);
            assert!(!bytes.contains(&b'\n'));
        }
    }

    #[test]
    fn test_binary_excluding_edge_values() {
        assert!(!generate_binary_excluding(4096, 0x00).contains(&0x00));
        assert!(!generate_binary_excluding(4096, 0xff).contains(&0xff));
    }

    #[test]
    fn test_binary_is_not_constant() {
        let bytes = generate_binary(1024);
        assert!(bytes.iter().any(|&b| b != bytes[0]));
    }
}
