//! Shared immutable, exclusive setup (SIES) objects.
//!
//! An object is built by exactly one thread, its *creator*, and then *published*. From
//! then on it is immutable and every thread may read it without locks; the single
//! publish store is the only synchronization.
//!
//! - [`CallContextValidator`] enforces the rule on every call: mutation only by the
//!   creator before publish, reads by other threads only after publish.
//! - [`PublishPolicy`] chooses the memory ordering of the publish flag, from
//!   [`Unsynchronized`] (relaxed) to [`ReleaseAcquire`] and [`SequentiallyConsistent`].
//! - [`GuardedAggregate`] is a text-statistics registry guarded this way.
//! - [`StressHarness`] races one creator against many readers to check that readers
//!   never see partial state.
//!
//! 共享不可变、独占构建（SIES）对象。
//!
//! 对象由唯一的线程（*创建者*）构建，然后被*发布*。此后对象不可变，所有线程都可以无锁读取；
//! 唯一的同步就是那一次发布存储。
//!
//! - [`CallContextValidator`] 在每次调用时强制规则：仅创建者可在发布前修改，其他线程仅可在发布后读取。
//! - [`PublishPolicy`] 选择发布标志的内存序。
//! - [`GuardedAggregate`] 是以此方式保护的文本统计注册表。
//! - [`StressHarness`] 让一个创建者与多个读者竞争，检查读者从不会看到不完整的状态。

mod aggregate;
mod config;
mod error;
mod flag;
mod harness;
mod random;
mod slot;
mod snapshot;
mod sync;
mod text;
mod validator;

pub use aggregate::GuardedAggregate;
pub use config::{HarnessConfig, HarnessConfigBuilder};
pub use error::{Error, Result, Violation};
pub use flag::{
    Acquire, AcquiringLoad, AtomicFlag, LoadOrdering, Ordered, PublishFlag, PublishPolicy,
    Relaxed, Release, ReleaseAcquire, ReleasingStore, SeqCst, SequentiallyConsistent,
    StoreOrdering, Synchronizing, Unsynchronized,
};
pub use harness::{IterationReport, Observation, Role, RoleObservation, RunSummary, StressHarness};
pub use random::TextMaker;
pub use slot::PublishSlot;
pub use snapshot::{ChunkSnapshot, Mismatch, Probes, Snapshot};
pub use text::{ChunkInfo, TextInfo, TextStats, split_next_word, to_lower};
pub use validator::CallContextValidator;

#[cfg(all(test, not(feature = "loom")))]
mod tests;
