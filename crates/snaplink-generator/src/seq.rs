use crate::{Generator, ALPHABET};
use snaplink_core::ShortCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic short code generator using a sequential counter.
///
/// Each call encodes the next counter value in base 62 over [`ALPHABET`],
/// left-padded with `ALPHABET[0]` so the code reaches the requested length
/// (`"aaaaaa"`, `"aaaaab"`, ...). An optional prefix is placed in front and
/// counts toward the length; it must itself be alphanumeric. A counter
/// value too large for the remaining width yields a longer code.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl Default for SeqGenerator {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

impl SeqGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new sequential generator with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a new sequential generator starting from a specific counter value.
    ///
    /// Useful for resuming from a known state.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

fn encode_base62(mut value: u64, width: usize) -> String {
    let base = ALPHABET.len() as u64;
    let mut digits = Vec::with_capacity(width);
    loop {
        digits.push(ALPHABET[(value % base) as usize]);
        value /= base;
        if value == 0 {
            break;
        }
    }
    while digits.len() < width {
        digits.push(ALPHABET[0]);
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}

impl Generator for SeqGenerator {
    fn generate(&self, length: usize) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        let width = length.saturating_sub(self.prefix.len());
        ShortCode::generated(format!("{}{}", self.prefix, encode_base62(count, width)))
    }
}
