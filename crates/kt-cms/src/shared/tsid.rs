//! Record identifiers
//!
//! Time-sorted 64-bit ids rendered as 13-character Crockford Base32 strings.
//! Layout: 42 bits of millisecond timestamp, 10 random bits, 12 counter bits.

use std::sync::atomic::{AtomicU16, Ordering};

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const ENCODED_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new id, e.g. `0HZXEQ5Y8JY5Z`
    pub fn generate() -> String {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) as u64;
        let random = (uuid::Uuid::new_v4().as_u128() as u64) & 0x3FF;

        let value = ((millis & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);
        encode(value)
    }

    /// Whether `id` has the shape of a generated id.
    ///
    /// Lookups use this to answer 404 for malformed path segments without
    /// touching the database.
    pub fn is_valid(id: &str) -> bool {
        decode(id).is_some()
    }
}

fn encode(mut value: u64) -> String {
    let mut out = [b'0'; ENCODED_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    out.iter().map(|&b| b as char).collect()
}

fn decode(s: &str) -> Option<u64> {
    if s.len() != ENCODED_LEN {
        return None;
    }

    s.chars().try_fold(0u64, |acc, c| {
        let c = c.to_ascii_uppercase();
        let digit = ALPHABET.iter().position(|&a| a as char == c)? as u64;
        Some((acc << 5) | digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        let id = TsidGenerator::generate();
        assert_eq!(id.len(), 13);
        assert!(TsidGenerator::is_valid(&id));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(ids.insert(TsidGenerator::generate()));
        }
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(!TsidGenerator::is_valid(""));
        assert!(!TsidGenerator::is_valid("short"));
        assert!(!TsidGenerator::is_valid("0HZXEQ5Y8JY5U"));
        assert!(!TsidGenerator::is_valid("../etc/passwd"));
    }

    #[test]
    fn test_sortability() {
        let id1 = TsidGenerator::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TsidGenerator::generate();
        assert!(id1 < id2);
    }
}
