use crate::sync::{AtomicPtr, Ordering};
use std::marker::PhantomData;

/// A minimal atomic-like holder of one pointer: the published "flag".
///
/// Only `new`, `store` and `load` are required, a small subset of the atomic pointer
/// interface. Callers store at most once per lifetime; the type itself does not
/// enforce single assignment.
///
/// 一个最小化的、类原子的单指针容器：即发布"标志"。
/// 只需要 `new`、`store` 和 `load`，是原子指针接口的一个小子集。
/// 调用者在整个生命周期内最多存储一次；类型本身不强制单次赋值。
pub trait PublishFlag<T>: Send + Sync {
    /// Create the flag holding `initial` (normally null).
    /// 创建持有 `initial`（通常为 null）的标志。
    fn new(initial: *mut T) -> Self;

    /// Write the flag.
    /// 写入标志。
    fn store(&self, value: *mut T);

    /// Read the flag.
    /// 读取标志。
    fn load(&self) -> *mut T;
}

/// A publish-flag policy: chooses the flag type used for any pointee type.
///
/// This is what guarded types are generic over, so the same validator and aggregate
/// logic can be instantiated with a correct or a racy policy.
///
/// 发布标志策略：为任意指向类型选择所用的标志类型。
/// 受保护类型以此为泛型参数，使同一套验证器与聚合逻辑可分别使用正确或存在竞争的策略实例化。
pub trait PublishPolicy: 'static {
    /// The flag type for pointers to `T`.
    type Flag<T>: PublishFlag<T> + Send + Sync;

    /// Short human-readable name, e.g. `release/acquire`.
    fn name() -> String;
}

/// Marker for policies whose publish establishes happens-before.
///
/// # Safety
///
/// Implementors guarantee that a `load` observing a `store`d value synchronizes-with
/// that store: every write performed by the storing thread before the `store` is
/// visible to the loading thread after the `load`. Guarded objects rely on this to be
/// `Sync`.
///
/// 发布操作能建立 happens-before 关系的策略标记。
/// 实现者保证：观察到某个 `store` 值的 `load` 与该 `store` 同步，
/// 存储线程在 `store` 之前的所有写入在 `load` 之后对加载线程可见。
pub unsafe trait Synchronizing: PublishPolicy {}

/// Memory ordering usable for a flag store.
pub trait StoreOrdering: 'static {
    /// The ordering passed to the atomic store.
    const ORDERING: Ordering;
    /// Name used in policy descriptions.
    const NAME: &'static str;
}

/// Memory ordering usable for a flag load.
pub trait LoadOrdering: 'static {
    /// The ordering passed to the atomic load.
    const ORDERING: Ordering;
    /// Name used in policy descriptions.
    const NAME: &'static str;
}

/// Store orderings with release semantics or stronger.
///
/// # Safety
///
/// `ORDERING` must be `Release` or `SeqCst`.
pub unsafe trait ReleasingStore: StoreOrdering {}

/// Load orderings with acquire semantics or stronger.
///
/// # Safety
///
/// `ORDERING` must be `Acquire` or `SeqCst`.
pub unsafe trait AcquiringLoad: LoadOrdering {}

/// `Ordering::Relaxed`, valid for both stores and loads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relaxed;

/// `Ordering::Release`, stores only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Release;

/// `Ordering::Acquire`, loads only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Acquire;

/// `Ordering::SeqCst`, valid for both stores and loads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeqCst;

impl StoreOrdering for Relaxed {
    const ORDERING: Ordering = Ordering::Relaxed;
    const NAME: &'static str = "relaxed";
}

impl LoadOrdering for Relaxed {
    const ORDERING: Ordering = Ordering::Relaxed;
    const NAME: &'static str = "relaxed";
}

impl StoreOrdering for Release {
    const ORDERING: Ordering = Ordering::Release;
    const NAME: &'static str = "release";
}

impl LoadOrdering for Acquire {
    const ORDERING: Ordering = Ordering::Acquire;
    const NAME: &'static str = "acquire";
}

impl StoreOrdering for SeqCst {
    const ORDERING: Ordering = Ordering::SeqCst;
    const NAME: &'static str = "seq_cst";
}

impl LoadOrdering for SeqCst {
    const ORDERING: Ordering = Ordering::SeqCst;
    const NAME: &'static str = "seq_cst";
}

unsafe impl ReleasingStore for Release {}
unsafe impl ReleasingStore for SeqCst {}
unsafe impl AcquiringLoad for Acquire {}
unsafe impl AcquiringLoad for SeqCst {}

/// An atomic pointer flag with fixed store and load orderings.
///
/// 具有固定存储与加载内存序的原子指针标志。
pub struct AtomicFlag<T, S, L> {
    ptr: AtomicPtr<T>,
    _orderings: PhantomData<fn() -> (S, L)>,
}

impl<T, S: StoreOrdering, L: LoadOrdering> PublishFlag<T> for AtomicFlag<T, S, L> {
    #[inline]
    fn new(initial: *mut T) -> Self {
        Self {
            ptr: AtomicPtr::new(initial),
            _orderings: PhantomData,
        }
    }

    #[inline]
    fn store(&self, value: *mut T) {
        self.ptr.store(value, S::ORDERING);
    }

    #[inline]
    fn load(&self) -> *mut T {
        self.ptr.load(L::ORDERING)
    }
}

impl<T, S, L> std::fmt::Debug for AtomicFlag<T, S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ptr = self.ptr.load(Ordering::Relaxed);
        f.debug_tuple("AtomicFlag").field(&ptr).finish()
    }
}

/// Policy using `AtomicFlag` with store ordering `S` and load ordering `L`.
///
/// 使用存储内存序 `S` 与加载内存序 `L` 的 `AtomicFlag` 策略。
#[derive(Debug, Clone, Copy, Default)]
pub struct Ordered<S, L = S>(PhantomData<fn() -> (S, L)>);

impl<S: StoreOrdering, L: LoadOrdering> PublishPolicy for Ordered<S, L> {
    type Flag<T> = AtomicFlag<T, S, L>;

    fn name() -> String {
        format!("{}/{}", S::NAME, L::NAME)
    }
}

unsafe impl<S: ReleasingStore, L: AcquiringLoad> Synchronizing for Ordered<S, L> {}

/// No ordering guarantee at all. A reader may see the flag set before it sees the
/// writes that preceded the store. Not `Synchronizing`.
///
/// 完全没有顺序保证。读者可能在看到 store 之前的写入之前就看到标志已被设置。
pub type Unsynchronized = Ordered<Relaxed, Relaxed>;

/// Store-release, load-acquire: the minimal correct publish.
///
/// 存储-释放、加载-获取：最小的正确发布方式。
pub type ReleaseAcquire = Ordered<Release, Acquire>;

/// Sequentially consistent store and load.
pub type SequentiallyConsistent = Ordered<SeqCst, SeqCst>;
