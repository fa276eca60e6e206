// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXXXX (e.g., P_K7NP3XQ2 for a product)
//!
//! Product ids show up inside assistant replies as `[Title](ID:P_K7NP3XQ2)`, so
//! they stay short and unambiguous when read back.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const ID_LENGTH: usize = 8;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User account (U_)
    User,
    /// Product listing (P_)
    Product,
    /// Stored object: product image, avatar, shop image (F_)
    File,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Product => "P",
            EntityPrefix::File => "F",
        }
    }
}

fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID, e.g. "P_K7NP3XQ2"
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(ID_LENGTH))
}

/// Generate a raw Crockford Base32 string without prefix (file names, OAuth state)
pub fn generate_raw_id(length: usize) -> String {
    generate_crockford_string(length)
}

pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

pub fn generate_product_id() -> String {
    generate_id(EntityPrefix::Product)
}

pub fn generate_file_id() -> String {
    generate_id(EntityPrefix::File)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let product_id = generate_product_id();
        assert!(product_id.starts_with("P_"));
        assert_eq!(product_id.len(), 2 + ID_LENGTH);

        assert!(generate_user_id().starts_with("U_"));
        assert!(generate_file_id().starts_with("F_"));
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_product_id();
        for c in id[2..].chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            assert!(ids.insert(generate_product_id()), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_raw_id() {
        let raw = generate_raw_id(12);
        assert_eq!(raw.len(), 12);
        assert!(!raw.contains('_'));
    }
}
