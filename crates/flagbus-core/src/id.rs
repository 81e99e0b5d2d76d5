#![forbid(unsafe_code)]

//! Opaque identifier generation for channel scopes.
//!
//! Identifiers only need to be unique enough that two live scopes do not
//! hear each other's events. A collision causes cross-talk, not memory or
//! logic corruption, so the default generator is purely random.
//!
//! # Invariants
//!
//! 1. Output is exactly `length` characters.
//! 2. Every character is an ASCII digit or letter.
//! 3. [`SequentialIdGenerator`] never repeats within a process among ids of
//!    one length. Lengths that hold the process id plus a full 64-bit counter
//!    are unique for the whole counter range; shorter lengths drop the
//!    process id and are unique for the first `62^length` ids.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

/// Default identifier length.
pub const DEFAULT_ID_LENGTH: usize = 40;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Base-62 digits of `u64::MAX`.
const MAX_COUNTER_DIGITS: usize = 11;

/// Process-wide counter for sequential identifiers.
static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Source of opaque scope identifiers.
pub trait IdGenerator {
    /// Produce an identifier of exactly `length` alphanumeric characters.
    fn generate(&self, length: usize) -> String;
}

/// Uniform random identifiers from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Deterministic identifiers built from the process id and a monotonic
/// counter.
///
/// Useful where reproducible ordering matters more than unpredictability
/// (snapshot tests, logs that get diffed).
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialIdGenerator;

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, length: usize) -> String {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let pid = encode(u64::from(std::process::id()));

        // The layout depends only on `length`, so ids of one length never
        // mix a pid-prefixed form with a bare counter.
        if length >= pid.len() + MAX_COUNTER_DIGITS {
            let mut out = pid;
            out.push_str(&pad(seq, length - out.len()));
            out
        } else {
            pad(seq, length)
        }
    }
}

/// Generate a random identifier of [`DEFAULT_ID_LENGTH`] characters.
#[must_use]
pub fn generate_id() -> String {
    RandomIdGenerator.generate(DEFAULT_ID_LENGTH)
}

fn encode(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Base-62 `value` left-padded with '0' to `width`, keeping the low digits
/// when it does not fit.
fn pad(value: u64, width: usize) -> String {
    let digits = encode(value);
    if digits.len() >= width {
        digits[digits.len() - width..].to_string()
    } else {
        let mut out = "0".repeat(width - digits.len());
        out.push_str(&digits);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_has_requested_length() {
        for len in [0, 1, 8, DEFAULT_ID_LENGTH, 128] {
            assert_eq!(RandomIdGenerator.generate(len).len(), len);
        }
    }

    #[test]
    fn random_is_alphanumeric() {
        let id = RandomIdGenerator.generate(512);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()), "{id}");
    }

    #[test]
    fn random_uses_both_cases_and_digits() {
        let id = RandomIdGenerator.generate(4096);
        assert!(id.chars().any(|c| c.is_ascii_digit()));
        assert!(id.chars().any(|c| c.is_ascii_uppercase()));
        assert!(id.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn generate_id_uses_default_length() {
        assert_eq!(generate_id().len(), DEFAULT_ID_LENGTH);
    }

    #[test]
    fn sequential_is_unique_and_fixed_length() {
        let ids: Vec<String> = (0..1000)
            .map(|_| SequentialIdGenerator.generate(DEFAULT_ID_LENGTH))
            .collect();
        assert!(ids.iter().all(|id| id.len() == DEFAULT_ID_LENGTH));
        assert!(ids.iter().all(|id| id.chars().all(|c| c.is_ascii_alphanumeric())));
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn sequential_truncates_to_short_length() {
        let a = SequentialIdGenerator.generate(3);
        let b = SequentialIdGenerator.generate(3);
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        assert_ne!(a, b);
    }

    #[test]
    fn sequential_short_ids_do_not_repeat() {
        let ids: Vec<String> = (0..2000).map(|_| SequentialIdGenerator.generate(2)).collect();
        assert!(ids.iter().all(|id| id.len() == 2));
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn sequential_long_ids_carry_the_process_id() {
        let pid = encode(u64::from(std::process::id()));
        let id = SequentialIdGenerator.generate(pid.len() + MAX_COUNTER_DIGITS);
        assert!(id.starts_with(&pid), "{id}");
    }

    #[test]
    fn pad_widths() {
        assert_eq!(pad(1, 3), "001");
        assert_eq!(pad(62, 2), "10");
        assert_eq!(pad(62, 1), "0");
        assert_eq!(pad(7, 0), "");
    }

    #[test]
    fn max_counter_fits_digit_budget() {
        assert_eq!(encode(u64::MAX).len(), MAX_COUNTER_DIGITS);
    }

    #[test]
    fn encode_base62() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(61), "z");
        assert_eq!(encode(62), "10");
    }
}
