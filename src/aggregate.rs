use crate::error::Result;
use crate::flag::{PublishPolicy, ReleaseAcquire, Synchronizing};
use crate::sync::UnsafeCell;
use crate::text::{TextInfo, TextStats};
use crate::validator::CallContextValidator;

/// Values computed once in `setup_complete()` and served after publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CachedTotals {
    char_count: usize,
    word_count: usize,
}

/// A shared-immutable, exclusive-setup text registry.
///
/// Holds a `TextInfo` payload and a `CallContextValidator`, and routes every call
/// through the validator before touching the payload:
/// - `add()` is mutating: only the creator thread, only before publish.
/// - `setup_complete()` is the final mutating call: it caches the totals and publishes.
/// - Every read accessor may be called by the creator at any time, and by any thread
///   once published.
///
/// No lock is taken anywhere. Cross-thread visibility of the setup writes rests solely
/// on the publish flag, so the aggregate is only `Sync` for `Synchronizing` policies.
///
/// **Typical Usage**:
/// ```
/// use sies::GuardedAggregate;
///
/// let registry: GuardedAggregate = GuardedAggregate::new();
/// registry.add("Hello!").unwrap();
/// registry.setup_complete().unwrap();
///
/// std::thread::scope(|s| {
///     s.spawn(|| assert_eq!(registry.char_count().unwrap(), 6));
/// });
/// ```
///
/// 共享不可变、独占构建的文本注册表。
///
/// 持有 `TextInfo` 载荷和 `CallContextValidator`，在访问载荷之前，每个调用都先经过验证器：
/// - `add()` 是修改操作：仅限创建者线程，仅限发布之前。
/// - `setup_complete()` 是最后一个修改操作：缓存汇总值并发布。
/// - 所有读取操作：创建者随时可调用，发布之后任何线程都可调用。
///
/// 全程不使用锁。构建期写入的跨线程可见性完全依赖发布标志，因此只有在 `Synchronizing` 策略下才是 `Sync` 的。
pub struct GuardedAggregate<P: PublishPolicy = ReleaseAcquire> {
    validator: CallContextValidator<P>,
    data: UnsafeCell<TextInfo>,
    cached: UnsafeCell<CachedTotals>,
}

// SAFETY: `data` and `cached` are written only through `&self` methods that first pass
// `check_mutating_access()`, which restricts writers to the creator thread while
// unpublished. Reads from other threads first pass `check_read_access()`, which requires
// observing the published flag; with a `Synchronizing` policy that load synchronizes-with
// the creator's publish store, after which no further writes can happen.
unsafe impl<P: Synchronizing> Sync for GuardedAggregate<P> {}

impl<P: PublishPolicy> GuardedAggregate<P> {
    /// Create an empty aggregate owned by the calling thread.
    /// 创建一个由调用线程拥有的空聚合对象。
    pub fn new() -> Self {
        Self {
            validator: CallContextValidator::new(),
            data: UnsafeCell::new(TextInfo::new()),
            cached: UnsafeCell::new(CachedTotals::default()),
        }
    }

    /// Whether setup has completed.
    #[inline]
    pub fn is_published(&self) -> bool {
        self.validator.is_published()
    }

    /// Mutating operation: append a chunk of text.
    ///
    /// # Errors
    /// `CallContextViolation` if called from a thread other than the creator, or after
    /// setup has completed.
    ///
    /// 修改操作：追加一个文本块。
    pub fn add(&self, text: impl Into<String>) -> Result<()> {
        self.validator.check_mutating_access()?;
        let text = text.into();
        // SAFETY: creator thread, unpublished; no other thread may access `data` yet.
        self.data.with_mut(|data| unsafe { (*data).add_text_chunk(text) });
        Ok(())
    }

    /// Mutating operation: finish setup.
    ///
    /// Caches the aggregate character and word counts, then publishes. From then on the
    /// aggregate is immutable and readable from every thread.
    ///
    /// # Errors
    /// `CallContextViolation` if called from a thread other than the creator, or if setup
    /// has already completed. Nothing is cached in that case.
    ///
    /// 修改操作：完成构建。缓存汇总的字符数与单词数，然后发布。此后聚合对象不可变，且可被所有线程读取。
    pub fn setup_complete(&self) -> Result<()> {
        self.validator.check_mutating_access()?;
        // SAFETY: creator thread, unpublished.
        let totals = self.data.with(|data| {
            let data = unsafe { &*data };
            CachedTotals {
                char_count: data.char_count(),
                word_count: data.word_count(),
            }
        });
        self.cached.with_mut(|cached| unsafe { *cached = totals });
        self.validator.publish(self)
    }

    /// Run `f` on the payload after validating read access.
    #[inline]
    fn read<R>(&self, f: impl FnOnce(&TextInfo) -> R) -> Result<R> {
        self.validator.check_read_access()?;
        // SAFETY: either the creator thread (the only writer), or published, which makes
        // all setup writes visible and rules out further ones.
        Ok(self.data.with(|data| f(unsafe { &*data })))
    }

    /// Cached totals, valid once published.
    #[inline]
    fn totals(&self) -> CachedTotals {
        // SAFETY: only called after observing the published flag.
        self.cached.with(|cached| unsafe { *cached })
    }

    /// Number of chunks added so far.
    pub fn number_of_chunks(&self) -> Result<usize> {
        self.read(TextInfo::number_of_chunks)
    }

    /// Text of chunk `index`.
    ///
    /// # Errors
    /// `CallContextViolation` as for any read, or `OutOfRange` if `index` is not below
    /// `number_of_chunks()`.
    pub fn chunk_text(&self, index: usize) -> Result<String> {
        self.read(|data| data.chunk_text(index))?
    }

    pub fn chunk_char_count(&self, index: usize) -> Result<usize> {
        self.read(|data| data.chunk_char_count(index))?
    }

    pub fn chunk_word_count(&self, index: usize) -> Result<usize> {
        self.read(|data| data.chunk_word_count(index))?
    }

    pub fn chunk_char_occurrence(&self, index: usize, chr: char) -> Result<usize> {
        self.read(|data| data.chunk_char_occurrence(index, chr))?
    }

    pub fn chunk_word_occurrence(&self, index: usize, word: &str) -> Result<usize> {
        self.read(|data| data.chunk_word_occurrence(index, word))?
    }

    /// Concatenated text of all chunks.
    pub fn text(&self) -> Result<String> {
        self.read(TextInfo::text)
    }

    /// Total character count; served from the cache once published.
    pub fn char_count(&self) -> Result<usize> {
        self.validator.check_read_access()?;
        if self.validator.is_published() {
            return Ok(self.totals().char_count);
        }
        self.read(TextInfo::char_count)
    }

    /// Total word count; served from the cache once published.
    pub fn word_count(&self) -> Result<usize> {
        self.validator.check_read_access()?;
        if self.validator.is_published() {
            return Ok(self.totals().word_count);
        }
        self.read(TextInfo::word_count)
    }

    pub fn char_occurrence(&self, chr: char) -> Result<usize> {
        self.read(|data| data.char_occurrence(chr))
    }

    pub fn word_occurrence(&self, word: &str) -> Result<usize> {
        self.read(|data| data.word_occurrence(word))
    }
}

impl<P: PublishPolicy> Default for GuardedAggregate<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PublishPolicy> std::fmt::Debug for GuardedAggregate<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedAggregate")
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl<P: PublishPolicy> TextStats for GuardedAggregate<P> {
    fn number_of_chunks(&self) -> Result<usize> {
        GuardedAggregate::number_of_chunks(self)
    }

    fn chunk_text(&self, index: usize) -> Result<String> {
        GuardedAggregate::chunk_text(self, index)
    }

    fn chunk_char_count(&self, index: usize) -> Result<usize> {
        GuardedAggregate::chunk_char_count(self, index)
    }

    fn chunk_word_count(&self, index: usize) -> Result<usize> {
        GuardedAggregate::chunk_word_count(self, index)
    }

    fn chunk_char_occurrence(&self, index: usize, chr: char) -> Result<usize> {
        GuardedAggregate::chunk_char_occurrence(self, index, chr)
    }

    fn chunk_word_occurrence(&self, index: usize, word: &str) -> Result<usize> {
        GuardedAggregate::chunk_word_occurrence(self, index, word)
    }

    fn text(&self) -> Result<String> {
        GuardedAggregate::text(self)
    }

    fn char_count(&self) -> Result<usize> {
        GuardedAggregate::char_count(self)
    }

    fn word_count(&self) -> Result<usize> {
        GuardedAggregate::word_count(self)
    }

    fn char_occurrence(&self, chr: char) -> Result<usize> {
        GuardedAggregate::char_occurrence(self, chr)
    }

    fn word_occurrence(&self, word: &str) -> Result<usize> {
        GuardedAggregate::word_occurrence(self, word)
    }
}
