//! Error types for guarded objects and the stress harness.
//!
//! 受保护对象与压力测试框架的错误类型。

use thiserror::Error;

/// The way a call broke the exclusive-setup / shared-immutable invariant.
///
/// 调用违反"独占构建 / 共享不可变"不变式的方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    /// A mutating call after publish, or from a thread other than the creator.
    /// 发布之后的修改调用，或来自非创建者线程的修改调用。
    #[error("concurrent mutation of published object")]
    ConcurrentMutation,

    /// A read from a thread other than the creator before publish.
    /// 发布之前来自非创建者线程的读取调用。
    #[error("concurrent read of unpublished object")]
    ConcurrentRead,
}

/// All `sies` errors.
///
/// 所有 `sies` 错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The call context check failed; the operation had no effect.
    /// 调用上下文检查失败；操作没有产生任何效果。
    #[error("call context violation: {0}")]
    CallContextViolation(#[from] Violation),

    /// Chunk index past the end of the chunk sequence.
    /// 块索引超出块序列末尾。
    #[error("chunk index {index} out of range for {len} chunks")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Number of chunks present
        len: usize,
    },

    /// A one-shot `PublishSlot` already holds a value.
    /// 一次性的 `PublishSlot` 已经持有一个值。
    #[error("publish slot already occupied")]
    SlotOccupied,

    /// Harness configuration rejected by the builder.
    /// 构建器拒绝了框架配置。
    #[error("invalid harness configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for `sies` operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a call context violation.
    ///
    /// Readers treat these as "not published yet, try again".
    #[inline]
    pub fn is_call_context_violation(&self) -> bool {
        matches!(self, Error::CallContextViolation(_))
    }

    /// Check if this is an out-of-range chunk index.
    #[inline]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfRange { .. })
    }

    /// The violation carried by this error, if any.
    #[inline]
    pub fn violation(&self) -> Option<Violation> {
        match self {
            Error::CallContextViolation(v) => Some(*v),
            _ => None,
        }
    }
}
