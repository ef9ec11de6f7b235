//! # Tape Encoder
//!
//! Maps domain elements and tuples of them to words over a shared tape
//! alphabet.
//!
//! - `TapeAlphabet` names the per-tape letters and packs product symbols
//! - `Encoding` is the numeric element codec (naturals or integers, LSBF)
//! - `ElementCodec` abstracts decoding for the enumerator
//!
//! ## Convolution
//!
//! A tuple of words is turned into one word over the product alphabet by
//! padding every shorter tape with the padding letter up to the length of the
//! longest tape (`TapeAlphabet::convolve`). A well-formed convolution never
//! has a digit after padding on the same tape.

use crate::primitives::{BINARY_DIGITS, MAX_SYMBOLS, PADDING_CHAR};
use crate::types::{AutstrError, Letter, Symbol};
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TAPE ALPHABET
// =============================================================================

/// The letters of one tape: the digits followed by the padding letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TapeAlphabet {
    digits: Vec<char>,
    padding: char,
}

impl Default for TapeAlphabet {
    fn default() -> Self {
        Self::binary()
    }
}

impl TapeAlphabet {
    /// Create an alphabet from distinct digit characters and a padding character.
    pub fn new(digits: Vec<char>, padding: char) -> Result<Self, AutstrError> {
        if digits.is_empty() {
            return Err(AutstrError::AlphabetMismatch(
                "a tape alphabet needs at least one digit".to_string(),
            ));
        }
        if digits.len() >= usize::from(u8::MAX) {
            return Err(AutstrError::AlphabetMismatch(format!(
                "too many digits: {}",
                digits.len()
            )));
        }
        for (i, c) in digits.iter().enumerate() {
            if *c == padding || digits[..i].contains(c) {
                return Err(AutstrError::AlphabetMismatch(format!(
                    "letter {:?} is not unique",
                    c
                )));
            }
        }
        Ok(Self { digits, padding })
    }

    /// The binary alphabet `{0, 1}` with padding `*`.
    #[must_use]
    pub fn binary() -> Self {
        Self {
            digits: BINARY_DIGITS.to_vec(),
            padding: PADDING_CHAR,
        }
    }

    /// Number of letters per tape, padding included.
    #[must_use]
    pub fn width(&self) -> usize {
        self.digits.len() + 1
    }

    /// Number of digit letters.
    #[must_use]
    pub fn digit_count(&self) -> usize {
        self.digits.len()
    }

    /// The padding letter.
    #[must_use]
    pub fn padding(&self) -> Letter {
        self.digits.len() as Letter
    }

    /// True if `letter` is the padding letter.
    #[must_use]
    pub fn is_padding(&self, letter: Letter) -> bool {
        letter == self.padding()
    }

    /// Letter for a character, if it belongs to the alphabet.
    #[must_use]
    pub fn letter(&self, c: char) -> Option<Letter> {
        if c == self.padding {
            return Some(self.padding());
        }
        self.digits.iter().position(|d| *d == c).map(|i| i as Letter)
    }

    /// Character of a letter.
    #[must_use]
    pub fn char_of(&self, letter: Letter) -> char {
        self.digits
            .get(usize::from(letter))
            .copied()
            .unwrap_or(self.padding)
    }

    /// Number of product symbols over `arity` tapes.
    pub fn symbol_count(&self, arity: usize) -> Result<usize, AutstrError> {
        let exponent = u32::try_from(arity)
            .map_err(|_| AutstrError::AlphabetMismatch(format!("arity {} too large", arity)))?;
        self.width()
            .checked_pow(exponent)
            .filter(|&n| n <= MAX_SYMBOLS)
            .ok_or_else(|| {
                AutstrError::AlphabetMismatch(format!(
                    "{} tapes exceed the product alphabet cap of {} symbols",
                    arity, MAX_SYMBOLS
                ))
            })
    }

    /// Weight of `tape` in the packed symbol representation.
    #[must_use]
    pub fn place(&self, tape: usize) -> u32 {
        (0..tape).fold(1u32, |acc, _| acc.saturating_mul(self.width() as u32))
    }

    /// Pack one letter per tape into a symbol.
    #[must_use]
    pub fn pack(&self, letters: &[Letter]) -> Symbol {
        let width = self.width() as u32;
        let packed = letters
            .iter()
            .rev()
            .fold(0u32, |acc, &l| acc * width + u32::from(l));
        Symbol(packed)
    }

    /// Unpack a symbol into one letter per tape.
    #[must_use]
    pub fn unpack(&self, symbol: Symbol, arity: usize) -> Vec<Letter> {
        let width = self.width() as u32;
        let mut rest = symbol.0;
        let mut letters = Vec::with_capacity(arity);
        for _ in 0..arity {
            letters.push((rest % width) as Letter);
            rest /= width;
        }
        letters
    }

    /// Letter of `symbol` on `tape`.
    #[must_use]
    pub fn component(&self, symbol: Symbol, tape: usize) -> Letter {
        ((symbol.0 / self.place(tape)) % self.width() as u32) as Letter
    }

    /// The symbol that is padding on every tape.
    #[must_use]
    pub fn all_padding(&self, arity: usize) -> Symbol {
        self.pack(&vec![self.padding(); arity])
    }

    /// Parse a word of digit characters.
    pub fn parse_word(&self, text: &str) -> Result<Vec<Letter>, AutstrError> {
        text.chars()
            .map(|c| {
                self.letter(c)
                    .filter(|&l| !self.is_padding(l))
                    .ok_or_else(|| {
                        AutstrError::MalformedEncoding(format!(
                            "character {:?} is not a digit of the tape alphabet",
                            c
                        ))
                    })
            })
            .collect()
    }

    /// Render a word as characters.
    #[must_use]
    pub fn render_word(&self, word: &[Letter]) -> String {
        word.iter().map(|&l| self.char_of(l)).collect()
    }

    /// Convolve words into one word over the product alphabet, padding every
    /// tape to the length of the longest.
    pub fn convolve(&self, words: &[Vec<Letter>]) -> Result<Vec<Symbol>, AutstrError> {
        for word in words {
            if word.iter().any(|&l| usize::from(l) >= self.width() || self.is_padding(l)) {
                return Err(AutstrError::MalformedEncoding(format!(
                    "word {:?} contains padding or foreign letters",
                    self.render_word(word)
                )));
            }
        }
        let length = words.iter().map(Vec::len).max().unwrap_or(0);
        let padding = self.padding();
        Ok((0..length)
            .map(|i| {
                let letters: Vec<Letter> = words
                    .iter()
                    .map(|w| w.get(i).copied().unwrap_or(padding))
                    .collect();
                self.pack(&letters)
            })
            .collect())
    }

    /// Split a convolution back into its tape words, dropping padding.
    ///
    /// Fails if a tape carries a digit after padding.
    pub fn deconvolve(&self, word: &[Symbol], arity: usize) -> Result<Vec<Vec<Letter>>, AutstrError> {
        let mut tapes: Vec<Vec<Letter>> = vec![Vec::new(); arity];
        let mut ended = vec![false; arity];
        for &symbol in word {
            for (tape, letter) in self.unpack(symbol, arity).into_iter().enumerate() {
                if self.is_padding(letter) {
                    ended[tape] = true;
                } else if ended[tape] {
                    return Err(AutstrError::MalformedEncoding(format!(
                        "tape {} continues after padding",
                        tape
                    )));
                } else {
                    tapes[tape].push(letter);
                }
            }
        }
        Ok(tapes)
    }
}

impl fmt::Display for TapeAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits: String = self.digits.iter().collect();
        write!(f, "{{{}}}+{}", digits, self.padding)
    }
}

// =============================================================================
// ELEMENT CODECS
// =============================================================================

/// Decodes tape words into domain elements.
pub trait ElementCodec {
    /// The decoded element type; its order is the tie-break order of enumeration.
    type Element: Ord + Clone + fmt::Debug;

    /// Decode one tape word.
    fn decode(&self, word: &[Letter]) -> Result<Self::Element, AutstrError>;
}

/// Numeric encodings over the binary tape alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// Least-significant-bit-first binary; `0` encodes zero, no trailing zeros.
    Natural,
    /// A sign letter (`0` non-negative, `1` negative) followed by the natural
    /// encoding of the magnitude; `-0` is not a valid word.
    Integer,
}

impl Encoding {
    /// Encode a value.
    pub fn encode(self, value: i64) -> Result<Vec<Letter>, AutstrError> {
        match self {
            Self::Natural => {
                let n = u64::try_from(value).map_err(|_| {
                    AutstrError::MalformedEncoding(format!(
                        "{} is not a natural number",
                        value
                    ))
                })?;
                Ok(lsbf_bits(n))
            }
            Self::Integer => {
                let sign = Letter::from(value < 0);
                let mut word = vec![sign];
                word.extend(lsbf_bits(value.unsigned_abs()));
                Ok(word)
            }
        }
    }

    /// Decode a word that fits in 64 bits.
    pub fn decode(self, word: &[Letter]) -> Result<i64, AutstrError> {
        let value = self.decode_big(word)?;
        i64::try_from(&value).map_err(|_| overflow(word))
    }

    /// Decode a word of any length.
    pub fn decode_big(self, word: &[Letter]) -> Result<BigInt, AutstrError> {
        match self {
            Self::Natural => Ok(BigInt::from(decode_magnitude(word)?)),
            Self::Integer => {
                let (&sign, bits) = word
                    .split_first()
                    .ok_or_else(|| AutstrError::MalformedEncoding("empty word".to_string()))?;
                let magnitude = BigInt::from(decode_magnitude(bits)?);
                match sign {
                    0 => Ok(magnitude),
                    1 if bits == [0] => Err(AutstrError::MalformedEncoding(
                        "negative zero".to_string(),
                    )),
                    1 => Ok(-magnitude),
                    _ => Err(AutstrError::MalformedEncoding(format!(
                        "invalid sign letter {}",
                        sign
                    ))),
                }
            }
        }
    }
}

/// Enumeration decodes without a size cap: an infinite relation has
/// elements past every machine integer.
impl ElementCodec for Encoding {
    type Element = BigInt;

    fn decode(&self, word: &[Letter]) -> Result<BigInt, AutstrError> {
        self.decode_big(word)
    }
}

/// Codec that renders tape words verbatim.
#[derive(Debug, Clone, Default)]
pub struct RawCodec {
    alphabet: TapeAlphabet,
}

impl RawCodec {
    /// Raw codec for an alphabet.
    #[must_use]
    pub fn new(alphabet: TapeAlphabet) -> Self {
        Self { alphabet }
    }
}

impl ElementCodec for RawCodec {
    type Element = String;

    fn decode(&self, word: &[Letter]) -> Result<String, AutstrError> {
        Ok(self.alphabet.render_word(word))
    }
}

fn lsbf_bits(mut n: u64) -> Vec<Letter> {
    if n == 0 {
        return vec![0];
    }
    let mut bits = Vec::new();
    while n > 0 {
        bits.push((n & 1) as Letter);
        n >>= 1;
    }
    bits
}

fn decode_magnitude(bits: &[Letter]) -> Result<BigUint, AutstrError> {
    match bits {
        [] => Err(AutstrError::MalformedEncoding("empty magnitude".to_string())),
        [0] => Ok(BigUint::default()),
        [.., last] if *last != 1 => Err(AutstrError::MalformedEncoding(
            "trailing zero in magnitude".to_string(),
        )),
        _ => BigUint::from_radix_le(bits, 2).ok_or_else(|| {
            AutstrError::MalformedEncoding("magnitude letters must be binary digits".to_string())
        }),
    }
}

fn overflow(word: &[Letter]) -> AutstrError {
    AutstrError::MalformedEncoding(format!(
        "value of {}-letter word does not fit in 64 bits",
        word.len()
    ))
}

// =============================================================================
// TESTS
// =============================================================================
