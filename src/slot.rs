use crate::error::{Error, Result};
use crate::sync::{AtomicPtr, Ordering};
use std::boxed::Box;
use std::marker::PhantomData;
use std::ptr;

/// A one-shot, owning slot for handing a heap object to other threads.
///
/// The slot starts empty. One `publish()` moves a `Box<T>` in; every `load()` after
/// that (on any thread) returns a reference to it. The slot owns the value and drops it
/// together with itself, so the value outlives every reference obtained through `load()`.
///
/// The publish is a release compare-exchange and `load()` is an acquire load, so a
/// reader that sees the value also sees its construction.
///
/// 一次性的、拥有所有权的槽，用于把堆对象交给其他线程。
///
/// 槽初始为空。一次 `publish()` 将 `Box<T>` 移入；此后任何线程的 `load()` 都返回其引用。
/// 槽拥有该值并随自身一起 drop，因此该值比所有通过 `load()` 获得的引用都活得更久。
///
/// 发布使用 release 语义的 compare-exchange，`load()` 使用 acquire 加载，
/// 因此看到该值的读者也能看到它的构造过程。
pub struct PublishSlot<T> {
    ptr: AtomicPtr<T>,
    _owns: PhantomData<Box<T>>,
}

// SAFETY: the slot hands out `&T` to any thread holding `&PublishSlot<T>` (needs
// `T: Sync`) and accepts a `Box<T>` from any such thread, dropping it wherever the slot
// is dropped (needs `T: Send`).
unsafe impl<T: Send + Sync> Sync for PublishSlot<T> {}
unsafe impl<T: Send> Send for PublishSlot<T> {}

impl<T> PublishSlot<T> {
    /// Create an empty slot.
    #[inline]
    pub fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            _owns: PhantomData,
        }
    }

    /// Move `value` into the slot and return a reference to it.
    ///
    /// # Errors
    /// `SlotOccupied` if the slot already holds a value; `value` is dropped.
    ///
    /// 将 `value` 移入槽中并返回其引用。若槽中已有值，返回 `SlotOccupied`，`value` 被 drop。
    pub fn publish(&self, value: Box<T>) -> Result<&T> {
        let new_ptr = Box::into_raw(value);
        match self.ptr.compare_exchange(
            ptr::null_mut(),
            new_ptr,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            // SAFETY: `new_ptr` came from `Box::into_raw` and is now owned by the slot,
            // which frees it only on drop.
            Ok(_) => Ok(unsafe { &*new_ptr }),
            Err(_) => {
                // SAFETY: the exchange failed, so `new_ptr` was never shared.
                drop(unsafe { Box::from_raw(new_ptr) });
                Err(Error::SlotOccupied)
            }
        }
    }

    /// The published value, or `None` while the slot is empty.
    #[inline]
    pub fn load(&self) -> Option<&T> {
        let ptr = self.ptr.load(Ordering::Acquire);
        // SAFETY: non-null pointers were installed by `publish` and stay valid until the
        // slot is dropped, which cannot happen while `&self` is borrowed.
        unsafe { ptr.as_ref() }
    }

    /// Whether nothing has been published yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.load(Ordering::Acquire).is_null()
    }
}

impl<T> Default for PublishSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PublishSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ptr = self.ptr.load(Ordering::Relaxed);
        f.debug_tuple("PublishSlot").field(&ptr).finish()
    }
}

impl<T> Drop for PublishSlot<T> {
    /// At drop time no other thread can hold a reference into the slot, so the value is
    /// taken back and dropped.
    ///
    /// 在 drop 时没有其他线程持有槽内的引用，因此可以安全地拿回并 drop 该值。
    #[inline]
    fn drop(&mut self) {
        let ptr = self.ptr.load(Ordering::Relaxed);
        if !ptr.is_null() {
            unsafe {
                drop(Box::from_raw(ptr));
            }
        }
    }
}
