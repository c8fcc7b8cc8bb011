use crate::error::{Result, Violation};
use crate::flag::{PublishFlag, PublishPolicy};
use crate::sync::{self, ThreadId};

/// Call context validation with one-shot publish.
///
/// Meant to be held as a field of the guarded type (composition, not a wrapper
/// around it). The validator captures the identity of the thread that constructs
/// it, the *creator*, and holds a publish flag that starts out null.
///
/// **State machine**:
/// - *Setup* (initial): flag null. Only the creator may call anything.
/// - *Published* (terminal): flag non-null. Any thread may read; nobody may mutate.
///
/// 带一次性发布的调用上下文验证。
///
/// 作为受保护类型的字段持有（组合，而非包装）。验证器记录构造它的线程（即*创建者*）的标识，
/// 并持有一个初始为 null 的发布标志。
///
/// **状态机**：
/// - *构建中*（初始）：标志为 null。只有创建者可以调用任何操作。
/// - *已发布*（终态）：标志非 null。任何线程都可读取；任何线程都不可修改。
pub struct CallContextValidator<P: PublishPolicy> {
    published: P::Flag<()>,
    creator: ThreadId,
}

impl<P: PublishPolicy> CallContextValidator<P> {
    /// Create a validator owned by the calling thread, in the setup state.
    /// 创建一个由调用线程拥有、处于构建状态的验证器。
    #[inline]
    pub fn new() -> Self {
        Self {
            published: <P::Flag<()> as PublishFlag<()>>::new(std::ptr::null_mut()),
            creator: sync::current().id(),
        }
    }

    /// Identity of the creator thread.
    #[inline]
    pub fn creator(&self) -> ThreadId {
        self.creator
    }

    /// Whether the calling thread is the creator thread.
    #[inline]
    pub fn on_creator_thread(&self) -> bool {
        sync::current().id() == self.creator
    }

    /// Publish the object, making it immutable and readable from any thread.
    ///
    /// `that` is the containing object; only its address is recorded, as a non-null
    /// marker. Publishing counts as the final mutating operation.
    ///
    /// # Errors
    /// `CallContextViolation` if called from a thread other than the creator, or if the
    /// object is already published.
    ///
    /// 发布对象，使其不可变并可从任何线程读取。
    /// `that` 是包含本验证器的对象；只记录其地址作为非 null 标记。发布被视为最后一次修改操作。
    pub fn publish<T>(&self, that: &T) -> Result<()> {
        self.check_mutating_access()?;
        let marker = that as *const T as *mut ();
        self.published.store(marker);
        Ok(())
    }

    /// Unvalidated query: has the object been published?
    #[inline]
    pub fn is_published(&self) -> bool {
        !self.published.load().is_null()
    }

    /// Unvalidated query: is the object still in setup?
    #[inline]
    pub fn is_unpublished(&self) -> bool {
        self.published.load().is_null()
    }

    /// Validate a mutating operation.
    ///
    /// # Errors
    /// `CallContextViolation` if the object is published, or the caller is not the
    /// creator thread.
    ///
    /// 验证修改操作。若对象已发布或调用者不是创建者线程，返回 `CallContextViolation`。
    #[inline]
    pub fn check_mutating_access(&self) -> Result<()> {
        if self.is_published() || !self.on_creator_thread() {
            return Err(Violation::ConcurrentMutation.into());
        }
        Ok(())
    }

    /// Validate a read-only operation.
    ///
    /// The creator may always read its own object. Other threads may only read once the
    /// publish has made the creator's writes visible to them.
    ///
    /// # Errors
    /// `CallContextViolation` if the object is unpublished and the caller is not the
    /// creator thread.
    ///
    /// 验证只读操作。创建者总是可以读取自己的对象；其他线程只能在发布使创建者的写入对其可见之后读取。
    #[inline]
    pub fn check_read_access(&self) -> Result<()> {
        if self.is_unpublished() && !self.on_creator_thread() {
            return Err(Violation::ConcurrentRead.into());
        }
        Ok(())
    }
}

impl<P: PublishPolicy> Default for CallContextValidator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PublishPolicy> std::fmt::Debug for CallContextValidator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContextValidator")
            .field("policy", &P::name())
            .field("creator", &self.creator)
            .field("published", &self.is_published())
            .finish()
    }
}
