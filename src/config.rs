use crate::error::{Error, Result};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Default number of stress iterations.
pub(crate) const DEFAULT_ITERATIONS: usize = 300;

/// Default range of chunks per exemplar.
pub(crate) const DEFAULT_CHUNKS: RangeInclusive<u32> = 10..=50;

/// Default range of words per chunk.
pub(crate) const DEFAULT_WORDS_PER_CHUNK: RangeInclusive<u32> = 80..=1500;

/// Default range of letters per word.
pub(crate) const DEFAULT_CHARS_PER_WORD: RangeInclusive<u32> = 2..=7;

/// Default range of threads per iteration.
pub(crate) const DEFAULT_THREADS: RangeInclusive<usize> = 8..=30;

/// How long a reader waits for the aggregate to appear and then to be published.
pub(crate) const DEFAULT_READER_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause between placing the aggregate in the slot and adding the first chunk.
/// Widens the window in which readers find an unpublished aggregate.
pub(crate) const DEFAULT_CREATOR_PAUSE: Duration = Duration::from_millis(1);

/// Configuration of a `StressHarness` run.
///
/// Created through [`HarnessConfig::builder()`], which validates every range.
///
/// `StressHarness` 运行的配置。通过 [`HarnessConfig::builder()`] 创建，构建器会验证所有范围。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    iterations: usize,
    chunks: RangeInclusive<u32>,
    words_per_chunk: RangeInclusive<u32>,
    chars_per_word: RangeInclusive<u32>,
    threads: RangeInclusive<usize>,
    reader_timeout: Duration,
    creator_pause: Duration,
    probe_char: char,
    probe_word: String,
    seed: Option<u64>,
}

impl HarnessConfig {
    /// Create a builder starting from the default settings.
    #[inline]
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::new()
    }

    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[inline]
    pub fn chunks(&self) -> RangeInclusive<u32> {
        self.chunks.clone()
    }

    #[inline]
    pub fn words_per_chunk(&self) -> RangeInclusive<u32> {
        self.words_per_chunk.clone()
    }

    #[inline]
    pub fn chars_per_word(&self) -> RangeInclusive<u32> {
        self.chars_per_word.clone()
    }

    #[inline]
    pub fn threads(&self) -> RangeInclusive<usize> {
        self.threads.clone()
    }

    #[inline]
    pub fn reader_timeout(&self) -> Duration {
        self.reader_timeout
    }

    #[inline]
    pub fn creator_pause(&self) -> Duration {
        self.creator_pause
    }

    /// Character whose occurrence readers compare.
    #[inline]
    pub fn probe_char(&self) -> char {
        self.probe_char
    }

    /// Word whose occurrence readers compare.
    #[inline]
    pub fn probe_word(&self) -> &str {
        &self.probe_word
    }

    /// Seed for the run's random number generator, if fixed.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            chunks: DEFAULT_CHUNKS,
            words_per_chunk: DEFAULT_WORDS_PER_CHUNK,
            chars_per_word: DEFAULT_CHARS_PER_WORD,
            threads: DEFAULT_THREADS,
            reader_timeout: DEFAULT_READER_TIMEOUT,
            creator_pause: DEFAULT_CREATOR_PAUSE,
            probe_char: 'z',
            probe_word: "ee".to_owned(),
            seed: None,
        }
    }
}

/// Builder for configuring a `StressHarness` run.
///
/// # Example
/// ```
/// use sies::HarnessConfig;
/// use std::time::Duration;
///
/// let config = HarnessConfig::builder()
///     .iterations(20)
///     .chunks(1..=4)
///     .threads(2..=6)
///     .reader_timeout(Duration::from_secs(1))
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(config.iterations(), 20);
/// ```
///
/// 用于配置 `StressHarness` 运行的构建器。
#[derive(Debug, Clone)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
        }
    }

    /// Set the number of iterations.
    ///
    /// Default: `300`
    #[inline]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Set the range of chunks per exemplar.
    ///
    /// Default: `10..=50`
    #[inline]
    pub fn chunks(mut self, chunks: RangeInclusive<u32>) -> Self {
        self.config.chunks = chunks;
        self
    }

    /// Set the range of words per chunk.
    ///
    /// Default: `80..=1500`
    #[inline]
    pub fn words_per_chunk(mut self, words: RangeInclusive<u32>) -> Self {
        self.config.words_per_chunk = words;
        self
    }

    /// Set the range of letters per word. Must start at 1 or more.
    ///
    /// Default: `2..=7`
    #[inline]
    pub fn chars_per_word(mut self, chars: RangeInclusive<u32>) -> Self {
        self.config.chars_per_word = chars;
        self
    }

    /// Set the range of threads per iteration (one creator, the rest readers). Must
    /// start at 1 or more.
    ///
    /// Default: `8..=30`
    #[inline]
    pub fn threads(mut self, threads: RangeInclusive<usize>) -> Self {
        self.config.threads = threads;
        self
    }

    /// Set how long a reader waits, first for the aggregate to appear in the slot and
    /// then for it to be published.
    ///
    /// Default: 3 seconds
    #[inline]
    pub fn reader_timeout(mut self, timeout: Duration) -> Self {
        self.config.reader_timeout = timeout;
        self
    }

    /// Set the creator's pause after placing the aggregate in the slot.
    ///
    /// Default: 1 millisecond
    #[inline]
    pub fn creator_pause(mut self, pause: Duration) -> Self {
        self.config.creator_pause = pause;
        self
    }

    /// Set the character and word whose occurrences readers compare.
    ///
    /// Default: `'z'` and `"ee"`
    #[inline]
    pub fn probes(mut self, chr: char, word: impl Into<String>) -> Self {
        self.config.probe_char = chr;
        self.config.probe_word = word.into();
        self
    }

    /// Fix the random seed. Pass `None` to seed from entropy.
    ///
    /// Default: `None`
    #[inline]
    pub fn seed(mut self, seed: impl Into<Option<u64>>) -> Self {
        self.config.seed = seed.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    /// `InvalidConfig` if any range is empty, or the thread or letter ranges start at 0.
    pub fn build(self) -> Result<HarnessConfig> {
        let config = self.config;
        check_range("chunks", &config.chunks)?;
        check_range("words per chunk", &config.words_per_chunk)?;
        check_range("chars per word", &config.chars_per_word)?;
        check_range("threads", &config.threads)?;
        if *config.threads.start() == 0 {
            return Err(Error::InvalidConfig(
                "at least one thread is required".to_owned(),
            ));
        }
        if *config.chars_per_word.start() == 0 {
            return Err(Error::InvalidConfig(
                "words need at least one character".to_owned(),
            ));
        }
        Ok(config)
    }
}

impl Default for HarnessConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    name: &str,
    range: &RangeInclusive<T>,
) -> Result<()> {
    if range.start() > range.end() {
        return Err(Error::InvalidConfig(format!(
            "{name} range {}..={} is empty",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}
