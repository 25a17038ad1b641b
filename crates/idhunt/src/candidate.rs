//! Random candidate identifiers.
//!
//! A [`CandidateGenerator`] combines a validated [`Alphabet`], a validated
//! [`IdLength`] and a [`RandSource`]. Parameters are checked once, when the
//! generator is configured; `generate` itself cannot fail.

use crate::{Error, RandSource, Result, ThreadRandom};
use core::fmt;

/// Upper bound accepted for [`IdLength`].
pub const MAX_ID_LENGTH: usize = 100;

/// Characters used by the default alphabet: ASCII letters, digits, `-` and
/// `_`.
pub const DEFAULT_ID_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

/// Default candidate length.
pub const DEFAULT_ID_LENGTH: usize = 11;

/// An immutable identifier submitted for probing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Candidate(Box<str>);

impl Candidate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

/// A non-empty set of characters candidates are drawn from.
///
/// Duplicate characters are removed (first occurrence wins) so every distinct
/// symbol has the same probability of being picked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Builds an alphabet from the characters of `chars`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `chars` is empty.
    pub fn new(chars: &str) -> Result<Self> {
        let mut unique = Vec::with_capacity(chars.len());
        for c in chars.chars() {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }

        if unique.is_empty() {
            return Err(Error::config("ID alphabet must contain at least one character"));
        }

        Ok(Self { chars: unique })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always `false`; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            chars: DEFAULT_ID_CHARS.chars().collect(),
        }
    }
}

/// Number of characters per candidate, in `1..=MAX_ID_LENGTH`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdLength(usize);

impl IdLength {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `len` is zero or above [`MAX_ID_LENGTH`].
    pub fn new(len: usize) -> Result<Self> {
        if !(1..=MAX_ID_LENGTH).contains(&len) {
            return Err(Error::config(format!(
                "ID length must be between 1 and {MAX_ID_LENGTH} (got {len})"
            )));
        }
        Ok(Self(len))
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for IdLength {
    fn default() -> Self {
        Self(DEFAULT_ID_LENGTH)
    }
}

/// Produces random [`Candidate`]s of a fixed length from a fixed alphabet.
#[derive(Clone, Debug)]
pub struct CandidateGenerator<R = ThreadRandom> {
    alphabet: Alphabet,
    length: IdLength,
    rand: R,
}

impl CandidateGenerator<ThreadRandom> {
    /// Creates a generator backed by the thread-local CSPRNG.
    pub fn new(alphabet: Alphabet, length: IdLength) -> Self {
        Self::with_rand(alphabet, length, ThreadRandom)
    }
}

impl<R> CandidateGenerator<R>
where
    R: RandSource,
{
    pub fn with_rand(alphabet: Alphabet, length: IdLength, rand: R) -> Self {
        Self {
            alphabet,
            length,
            rand,
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn length(&self) -> IdLength {
        self.length
    }

    /// Returns a fresh candidate. Each character is picked independently and
    /// uniformly from the alphabet.
    pub fn generate(&mut self) -> Candidate {
        let chars = self.alphabet.as_chars();
        let id: String = (0..self.length.get())
            .map(|_| chars[self.rand.index(chars.len())])
            .collect();
        Candidate(id.into_boxed_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed sequence of indices.
    struct Scripted {
        indices: Vec<usize>,
        pos: usize,
    }

    impl RandSource for Scripted {
        fn index(&mut self, bound: usize) -> usize {
            let i = self.indices[self.pos % self.indices.len()] % bound;
            self.pos += 1;
            i
        }
    }

    #[test]
    fn generated_candidates_have_configured_shape() {
        let alphabet = Alphabet::default();
        let mut generator = CandidateGenerator::new(alphabet.clone(), IdLength::default());

        for _ in 0..1_000 {
            let candidate = generator.generate();
            assert_eq!(candidate.as_str().chars().count(), DEFAULT_ID_LENGTH);
            assert!(candidate.as_str().chars().all(|c| alphabet.contains(c)));
        }
    }

    #[test]
    fn single_char_alphabet_is_deterministic() {
        let mut generator =
            CandidateGenerator::new(Alphabet::new("z").unwrap(), IdLength::new(5).unwrap());
        assert_eq!(generator.generate().as_str(), "zzzzz");
    }

    #[test]
    fn scripted_source_selects_expected_chars() {
        let rand = Scripted {
            indices: vec![0, 1, 2, 1],
            pos: 0,
        };
        let mut generator = CandidateGenerator::with_rand(
            Alphabet::new("abc").unwrap(),
            IdLength::new(4).unwrap(),
            rand,
        );
        assert_eq!(generator.generate().as_str(), "abcb");
        assert_eq!(generator.generate().as_str(), "abcb");
    }

    #[test]
    fn every_symbol_is_reachable() {
        let alphabet = Alphabet::new("ab").unwrap();
        let mut generator = CandidateGenerator::new(alphabet, IdLength::new(1).unwrap());
        let mut seen_a = false;
        let mut seen_b = false;
        for _ in 0..512 {
            match generator.generate().as_str() {
                "a" => seen_a = true,
                "b" => seen_b = true,
                other => panic!("unexpected candidate {other}"),
            }
        }
        assert!(seen_a && seen_b);
    }

    #[test]
    fn alphabet_rejects_empty_input() {
        assert!(matches!(Alphabet::new(""), Err(Error::Config { .. })));
    }

    #[test]
    fn alphabet_drops_duplicates_in_order() {
        let alphabet = Alphabet::new("abca-b").unwrap();
        assert_eq!(alphabet.as_chars(), &['a', 'b', 'c', '-']);
    }

    #[test]
    fn id_length_bounds() {
        assert!(IdLength::new(0).is_err());
        assert!(IdLength::new(MAX_ID_LENGTH + 1).is_err());
        assert_eq!(IdLength::new(1).unwrap().get(), 1);
        assert_eq!(IdLength::new(MAX_ID_LENGTH).unwrap().get(), MAX_ID_LENGTH);
    }

    #[test]
    fn default_alphabet_has_64_symbols() {
        assert_eq!(Alphabet::default().len(), 64);
    }
}
