pub mod seq;

use rand::Rng;
use snaplink_core::ShortCode;

/// Symbols a generated code is drawn from: 62 mixed-case letters and digits.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// The caller checks each candidate against its table and asks again on
/// collision, so a generator may return a code that is already taken.
pub trait Generator: Send + Sync + 'static {
    /// Produces a candidate code of `length` characters.
    fn generate(&self, length: usize) -> ShortCode;
}

/// Draws every character uniformly from [`ALPHABET`] using the thread-local RNG.
///
/// The RNG is not cryptographically secure; codes are identifiers, not secrets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self, length: usize) -> ShortCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..length)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        ShortCode::generated(code)
    }
}
