//! Short link tokens.

use rand::Rng;

/// Symbols a token may contain.
pub const ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const DEFAULT_TOKEN_LENGTH: usize = 6;

/// Longest token the generator will produce.
pub const MAX_TOKEN_LENGTH: usize = 64;

/// Generates fixed-length random tokens over [`ALPHABET`].
///
/// Tokens are not checked for uniqueness here; the link table reports a
/// conflict on insert and the caller draws a fresh one.
#[derive(Debug, Clone, Copy)]
pub struct TokenGenerator {
    len: usize,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self {
            len: DEFAULT_TOKEN_LENGTH,
        }
    }
}

impl TokenGenerator {
    pub fn new(len: usize) -> Self {
        debug_assert!(
            (1..=MAX_TOKEN_LENGTH).contains(&len),
            "token length out of range"
        );
        Self { len }
    }

    pub fn generate(&self) -> String {
        generate_with(&mut rand::thread_rng(), self.len)
    }
}

/// Draw `len` characters independently and uniformly from [`ALPHABET`].
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `s` could have been produced by a [`TokenGenerator`] of any length.
pub fn is_valid_token(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_TOKEN_LENGTH && s.bytes().all(|b| ALPHABET.contains(&b))
}
