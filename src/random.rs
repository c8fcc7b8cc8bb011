//! Random text payload generation.
//!
//! 随机文本载荷生成。

use crate::text::TextInfo;
use rand::Rng;
use rand::distributions::Uniform;
use std::ops::RangeInclusive;

// Letters weighted roughly by English letter frequency
const ALPHABET: &[u8] = b"aaaaaaaaaaaaaaaabbbccccccdddddddd\
                          eeeeeeeeeeeeeeeeeeeeeeeefffffgggghhhhhhhhhhhh\
                          iiiiiiiiiiiiiijkkllllllllmmmmmnnnnnnnnnnnnnn\
                          oooooooooooooopppqrrrrrrrrrrrrsssssssssssss\
                          ttttttttttttttttttuuuuuuvvwwwwxyyyyyz";

/// Builds `TextInfo` exemplars of random shape.
///
/// Each payload has a number of chunks drawn from `chunks`; each chunk has a number of
/// words drawn from `words_per_chunk`; each word has a number of letters drawn from
/// `chars_per_word` and is followed by a single space.
///
/// 生成形状随机的 `TextInfo` 样本。
#[derive(Debug, Clone)]
pub struct TextMaker {
    chunks: Uniform<u32>,
    words_per_chunk: Uniform<u32>,
    chars_per_word: Uniform<u32>,
    letter: Uniform<usize>,
}

impl TextMaker {
    /// Create a maker from inclusive ranges.
    ///
    /// # Panics
    /// If any range is empty (`start > end`). `HarnessConfig::builder()` rejects such
    /// ranges before they get here.
    pub fn new(
        chunks: RangeInclusive<u32>,
        words_per_chunk: RangeInclusive<u32>,
        chars_per_word: RangeInclusive<u32>,
    ) -> Self {
        Self {
            chunks: Uniform::from(chunks),
            words_per_chunk: Uniform::from(words_per_chunk),
            chars_per_word: Uniform::from(chars_per_word),
            letter: Uniform::from(0..ALPHABET.len()),
        }
    }

    /// Generate one chunk of text.
    pub fn make_chunk<R: Rng>(&self, rng: &mut R) -> String {
        let mut chunk = String::new();
        for _ in 0..rng.sample(&self.words_per_chunk) {
            for _ in 0..rng.sample(&self.chars_per_word) {
                chunk.push(char::from(ALPHABET[rng.sample(&self.letter)]));
            }
            chunk.push(' ');
        }
        chunk
    }

    /// Generate a payload.
    pub fn make<R: Rng>(&self, rng: &mut R) -> TextInfo {
        let mut info = TextInfo::new();
        for _ in 0..rng.sample(&self.chunks) {
            info.add_text_chunk(self.make_chunk(rng));
        }
        info
    }
}
