//! Text statistics payload: the mutable state the guard protects.
//!
//! 文本统计载荷：受保护的可变状态。

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Characters that separate words, in addition to ASCII whitespace and punctuation.
const EXTRA_SEPARATORS: [char; 2] = ['£', '¬'];

/// Space, tab, newline or carriage return, or separator punctuation. Other Unicode
/// whitespace belongs to words.
#[inline]
fn is_separator(chr: char) -> bool {
    matches!(chr, ' ' | '\t' | '\n' | '\r')
        || chr.is_ascii_punctuation()
        || EXTRA_SEPARATORS.contains(&chr)
}

/// Return the next word at or after byte position `pos` in `text`, advancing `pos`
/// past its end.
///
/// A word is a maximal run of characters that are neither whitespace nor separator
/// punctuation. Returns `None`, leaving `pos` unchanged, when no word remains.
///
/// 返回 `text` 中从字节位置 `pos` 开始的下一个单词，并将 `pos` 推进到其末尾之后。
pub fn split_next_word<'a>(text: &'a str, pos: &mut usize) -> Option<&'a str> {
    let rest = text.get(*pos..)?;
    let start = *pos + rest.find(|c: char| !is_separator(c))?;
    let end = text[start..]
        .find(is_separator)
        .map_or(text.len(), |offset| start + offset);
    *pos = end;
    Some(&text[start..end])
}

/// ASCII-lowercase copy of `word`; other characters are left unchanged.
#[inline]
pub fn to_lower(word: &str) -> String {
    word.to_ascii_lowercase()
}

/// Statistics of one added chunk of text, computed once when the chunk is added.
///
/// 单个已添加文本块的统计信息，在添加时一次性计算。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkInfo {
    /// The chunk's text.
    pub chunk: String,
    /// Number of characters.
    pub char_count: usize,
    /// Number of words.
    pub word_count: usize,
    /// Occurrences per character.
    pub char_occurrences: BTreeMap<char, usize>,
    /// Occurrences per lowercase word.
    pub word_occurrences: BTreeMap<String, usize>,
}

impl ChunkInfo {
    /// Analyse `chunk`.
    pub fn new(chunk: String) -> Self {
        let mut char_occurrences = BTreeMap::new();
        let mut char_count = 0;
        for chr in chunk.chars() {
            *char_occurrences.entry(chr).or_insert(0) += 1;
            char_count += 1;
        }

        let mut word_occurrences = BTreeMap::new();
        let mut word_count = 0;
        let mut pos = 0;
        while let Some(word) = split_next_word(&chunk, &mut pos) {
            *word_occurrences.entry(to_lower(word)).or_insert(0) += 1;
            word_count += 1;
        }

        Self {
            chunk,
            char_count,
            word_count,
            char_occurrences,
            word_occurrences,
        }
    }

    #[inline]
    fn char_occurrence(&self, chr: char) -> usize {
        self.char_occurrences.get(&chr).copied().unwrap_or(0)
    }

    /// `word` must already be lowercase.
    #[inline]
    fn word_occurrence(&self, word: &str) -> usize {
        self.word_occurrences.get(word).copied().unwrap_or(0)
    }
}

/// Read-only statistics offered by a text payload.
///
/// Implemented by the plain payload (`TextInfo`) and by the guarded wrapper
/// (`GuardedAggregate`), whose implementation may fail with a call context violation.
/// The harness compares the two through this trait.
///
/// 文本载荷提供的只读统计接口。
/// 由普通载荷（`TextInfo`）和受保护包装（`GuardedAggregate`）实现，后者可能因调用上下文违规而失败。
pub trait TextStats {
    /// Number of chunks added.
    fn number_of_chunks(&self) -> Result<usize>;
    /// Text of chunk `index`.
    fn chunk_text(&self, index: usize) -> Result<String>;
    /// Character count of chunk `index`.
    fn chunk_char_count(&self, index: usize) -> Result<usize>;
    /// Word count of chunk `index`.
    fn chunk_word_count(&self, index: usize) -> Result<usize>;
    /// Occurrences of `chr` in chunk `index`.
    fn chunk_char_occurrence(&self, index: usize, chr: char) -> Result<usize>;
    /// Case-insensitive occurrences of `word` in chunk `index`.
    fn chunk_word_occurrence(&self, index: usize, word: &str) -> Result<usize>;
    /// Concatenated text of all chunks in insertion order.
    fn text(&self) -> Result<String>;
    /// Total character count.
    fn char_count(&self) -> Result<usize>;
    /// Total word count.
    fn word_count(&self) -> Result<usize>;
    /// Total occurrences of `chr`.
    fn char_occurrence(&self, chr: char) -> Result<usize>;
    /// Total case-insensitive occurrences of `word`.
    fn word_occurrence(&self, word: &str) -> Result<usize>;
}

/// An ordered sequence of text chunks with per-chunk and aggregate statistics.
///
/// Not synchronized in any way; see `GuardedAggregate` for the shared form.
///
/// 有序的文本块序列，带有逐块及汇总统计信息。本身不做任何同步；共享形式见 `GuardedAggregate`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInfo {
    chunks: Vec<ChunkInfo>,
}

impl TextInfo {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyse `text` and append it as the last chunk.
    pub fn add_text_chunk(&mut self, text: impl Into<String>) {
        self.chunks.push(ChunkInfo::new(text.into()));
    }

    /// Number of chunks added.
    #[inline]
    pub fn number_of_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Per-chunk statistics for chunk `index`.
    pub fn chunk(&self, index: usize) -> Result<&ChunkInfo> {
        self.chunks.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.chunks.len(),
        })
    }

    /// Iterate over the chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &ChunkInfo> {
        self.chunks.iter()
    }

    pub fn chunk_text(&self, index: usize) -> Result<String> {
        Ok(self.chunk(index)?.chunk.clone())
    }

    pub fn chunk_char_count(&self, index: usize) -> Result<usize> {
        Ok(self.chunk(index)?.char_count)
    }

    pub fn chunk_word_count(&self, index: usize) -> Result<usize> {
        Ok(self.chunk(index)?.word_count)
    }

    pub fn chunk_char_occurrence(&self, index: usize, chr: char) -> Result<usize> {
        Ok(self.chunk(index)?.char_occurrence(chr))
    }

    pub fn chunk_word_occurrence(&self, index: usize, word: &str) -> Result<usize> {
        Ok(self.chunk(index)?.word_occurrence(&to_lower(word)))
    }

    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.chunk.as_str()).collect()
    }

    pub fn char_count(&self) -> usize {
        self.chunks.iter().map(|c| c.char_count).sum()
    }

    pub fn word_count(&self) -> usize {
        self.chunks.iter().map(|c| c.word_count).sum()
    }

    pub fn char_occurrence(&self, chr: char) -> usize {
        self.chunks.iter().map(|c| c.char_occurrence(chr)).sum()
    }

    pub fn word_occurrence(&self, word: &str) -> usize {
        let word = to_lower(word);
        self.chunks.iter().map(|c| c.word_occurrence(&word)).sum()
    }
}

impl TextStats for TextInfo {
    fn number_of_chunks(&self) -> Result<usize> {
        Ok(TextInfo::number_of_chunks(self))
    }

    fn chunk_text(&self, index: usize) -> Result<String> {
        TextInfo::chunk_text(self, index)
    }

    fn chunk_char_count(&self, index: usize) -> Result<usize> {
        TextInfo::chunk_char_count(self, index)
    }

    fn chunk_word_count(&self, index: usize) -> Result<usize> {
        TextInfo::chunk_word_count(self, index)
    }

    fn chunk_char_occurrence(&self, index: usize, chr: char) -> Result<usize> {
        TextInfo::chunk_char_occurrence(self, index, chr)
    }

    fn chunk_word_occurrence(&self, index: usize, word: &str) -> Result<usize> {
        TextInfo::chunk_word_occurrence(self, index, word)
    }

    fn text(&self) -> Result<String> {
        Ok(TextInfo::text(self))
    }

    fn char_count(&self) -> Result<usize> {
        Ok(TextInfo::char_count(self))
    }

    fn word_count(&self) -> Result<usize> {
        Ok(TextInfo::word_count(self))
    }

    fn char_occurrence(&self, chr: char) -> Result<usize> {
        Ok(TextInfo::char_occurrence(self, chr))
    }

    fn word_occurrence(&self, word: &str) -> Result<usize> {
        Ok(TextInfo::word_occurrence(self, word))
    }
}
