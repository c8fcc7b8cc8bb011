//! Field-by-field capture and comparison of text statistics.
//!
//! 文本统计信息的逐字段采集与比较。

use crate::error::Result;
use crate::text::{TextInfo, TextStats};
use std::fmt;

/// The character and word whose occurrences are captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probes {
    pub chr: char,
    pub word: String,
}

impl Probes {
    pub fn new(chr: char, word: impl Into<String>) -> Self {
        Self {
            chr,
            word: word.into(),
        }
    }
}

/// Statistics of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSnapshot {
    pub text: String,
    pub char_count: usize,
    pub word_count: usize,
    pub char_occurrence: usize,
    pub word_occurrence: usize,
}

/// Every statistic a `TextStats` exposes, read in one pass.
///
/// 一次读取中获得的 `TextStats` 暴露的全部统计信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub number_of_chunks: usize,
    pub text: String,
    pub char_count: usize,
    pub word_count: usize,
    pub char_occurrence: usize,
    pub word_occurrence: usize,
    pub chunks: Vec<ChunkSnapshot>,
}

/// One field whose read value differed from the expected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub field: String,
    pub read: String,
    pub expected: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {} of {}, expected {}",
            self.read, self.field, self.expected
        )
    }
}

impl Snapshot {
    /// Read every statistic through `stats`.
    ///
    /// Stops at the first error, so a snapshot is never partial.
    ///
    /// # Errors
    /// Whatever the first failing accessor returns.
    pub fn capture<S: TextStats + ?Sized>(stats: &S, probes: &Probes) -> Result<Self> {
        let number_of_chunks = stats.number_of_chunks()?;
        let mut chunks = Vec::with_capacity(number_of_chunks);
        for index in 0..number_of_chunks {
            chunks.push(ChunkSnapshot {
                text: stats.chunk_text(index)?,
                char_count: stats.chunk_char_count(index)?,
                word_count: stats.chunk_word_count(index)?,
                char_occurrence: stats.chunk_char_occurrence(index, probes.chr)?,
                word_occurrence: stats.chunk_word_occurrence(index, &probes.word)?,
            });
        }
        Ok(Self {
            number_of_chunks,
            text: stats.text()?,
            char_count: stats.char_count()?,
            word_count: stats.word_count()?,
            char_occurrence: stats.char_occurrence(probes.chr)?,
            word_occurrence: stats.word_occurrence(&probes.word)?,
            chunks,
        })
    }

    /// Build the snapshot of a plain payload by traversing it directly.
    pub fn of(info: &TextInfo, probes: &Probes) -> Self {
        let word = crate::text::to_lower(&probes.word);
        let chunks = info
            .chunks()
            .map(|chunk| ChunkSnapshot {
                text: chunk.chunk.clone(),
                char_count: chunk.char_count,
                word_count: chunk.word_count,
                char_occurrence: chunk.char_occurrences.get(&probes.chr).copied().unwrap_or(0),
                word_occurrence: chunk.word_occurrences.get(&word).copied().unwrap_or(0),
            })
            .collect();
        Self {
            number_of_chunks: info.number_of_chunks(),
            text: info.text(),
            char_count: info.char_count(),
            word_count: info.word_count(),
            char_occurrence: info.char_occurrence(probes.chr),
            word_occurrence: info.word_occurrence(&probes.word),
            chunks,
        }
    }

    /// Compare against `expected`, one `Mismatch` per differing field.
    pub fn diff(&self, expected: &Snapshot) -> Vec<Mismatch> {
        let mut mismatches = Vec::new();
        let mut check = |field: String, read: &dyn fmt::Display, want: &dyn fmt::Display| {
            let (read, want) = (read.to_string(), want.to_string());
            if read != want {
                mismatches.push(Mismatch {
                    field,
                    read,
                    expected: want,
                });
            }
        };

        check("number_of_chunks".into(), &self.number_of_chunks, &expected.number_of_chunks);
        check("text".into(), &self.text, &expected.text);
        check("char_count".into(), &self.char_count, &expected.char_count);
        check("word_count".into(), &self.word_count, &expected.word_count);
        check("char_occurrence".into(), &self.char_occurrence, &expected.char_occurrence);
        check("word_occurrence".into(), &self.word_occurrence, &expected.word_occurrence);

        for (index, (read, want)) in self.chunks.iter().zip(&expected.chunks).enumerate() {
            check(format!("chunk[{index}].text"), &read.text, &want.text);
            check(format!("chunk[{index}].char_count"), &read.char_count, &want.char_count);
            check(format!("chunk[{index}].word_count"), &read.word_count, &want.word_count);
            check(
                format!("chunk[{index}].char_occurrence"),
                &read.char_occurrence,
                &want.char_occurrence,
            );
            check(
                format!("chunk[{index}].word_occurrence"),
                &read.word_occurrence,
                &want.word_occurrence,
            );
        }

        mismatches
    }
}
