use core::marker::PhantomData;
use std::sync::Arc;

use object::{HeapCast, Value};

use crate::Heap;

/// A typed weak reference.
///
/// The target may be reclaimed by any collection cycle. The only way to
/// reach it is [`WeakRef::try_get`], which re-checks liveness on every
/// call; a reclaimed target is an ordinary `None`.
#[repr(transparent)]
pub struct WeakRef<T> {
    value: Value,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WeakRef<T> {}

impl<T> PartialEq for WeakRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for WeakRef<T> {}

impl<T: HeapCast> WeakRef<T> {
    /// Weak view of `value`. Fixnums become cleared references.
    #[inline(always)]
    pub fn new(value: Value) -> Self {
        let value = if value.is_ref() {
            value.to_weak()
        } else {
            Value::CLEARED
        };
        Self {
            value,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn cleared() -> Self {
        Self::new(Value::CLEARED)
    }

    /// The weak word, suitable for storing into a feedback cell.
    #[inline(always)]
    pub fn value(self) -> Value {
        self.value
    }

    #[inline]
    pub fn try_get(&self, heap: &Heap) -> Option<Arc<T>> {
        heap.get_as::<T>(self.value)
    }
}

impl<T> core::fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "WeakRef({:?})", self.value)
    }
}
