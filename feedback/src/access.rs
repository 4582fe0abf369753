//! Read/write strategies plugged into [`FeedbackNexus`](crate::FeedbackNexus).
//!
//! - [`MainThread`]: the interpreter; reads, writes and allocates.
//! - [`NoAllocation`]: used while a collection cycle runs the vector's
//!   clear hook; writes existing values but never creates objects.
//! - [`Background`]: the concurrent compiler; read-only, and every read
//!   of a nexus sees the same snapshot of its slot.

use std::cell::OnceCell;

use heap::Heap;
use object::{HeapCast, Value};

use crate::metadata::FeedbackSlot;
use crate::vector::FeedbackVector;

pub trait NexusConfig {
    const CAN_WRITE: bool;
    const CAN_ALLOCATE: bool;

    /// `(feedback, extra)` of `slot`.
    fn read_pair(&self, vector: &FeedbackVector, slot: FeedbackSlot) -> (Value, Value);

    fn read_raw(&self, vector: &FeedbackVector, slot: FeedbackSlot) -> Value {
        self.read_pair(vector, slot).0
    }

    fn write_raw(&self, vector: &FeedbackVector, slot: FeedbackSlot, value: Value);

    fn write_extra(&self, vector: &FeedbackVector, slot: FeedbackSlot, value: Value);

    /// Stores `extra` before `feedback`.
    fn write_pair(
        &self,
        vector: &FeedbackVector,
        slot: FeedbackSlot,
        feedback: Value,
        extra: Value,
    );

    fn allocate<T: HeapCast>(&self, heap: &Heap, object: T) -> Value;
}

#[inline(always)]
fn barriered_write(vector: &FeedbackVector, slot: FeedbackSlot, value: Value) {
    vector.heap().write_barrier(value);
    vector.set(slot, value);
}

#[inline(always)]
fn barriered_write_extra(vector: &FeedbackVector, slot: FeedbackSlot, value: Value) {
    vector.heap().write_barrier(value);
    vector.set_extra(slot, value);
}

#[inline(always)]
fn barriered_write_pair(
    vector: &FeedbackVector,
    slot: FeedbackSlot,
    feedback: Value,
    extra: Value,
) {
    let heap = vector.heap();
    heap.write_barrier(extra);
    heap.write_barrier(feedback);
    vector.set_pair(slot, feedback, extra);
}

// ── MainThread ────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct MainThread;

impl NexusConfig for MainThread {
    const CAN_WRITE: bool = true;
    const CAN_ALLOCATE: bool = true;

    #[inline]
    fn read_pair(&self, vector: &FeedbackVector, slot: FeedbackSlot) -> (Value, Value) {
        vector.get_pair(slot)
    }

    #[inline]
    fn read_raw(&self, vector: &FeedbackVector, slot: FeedbackSlot) -> Value {
        vector.get(slot)
    }

    #[inline]
    fn write_raw(&self, vector: &FeedbackVector, slot: FeedbackSlot, value: Value) {
        barriered_write(vector, slot, value);
    }

    #[inline]
    fn write_extra(&self, vector: &FeedbackVector, slot: FeedbackSlot, value: Value) {
        barriered_write_extra(vector, slot, value);
    }

    #[inline]
    fn write_pair(
        &self,
        vector: &FeedbackVector,
        slot: FeedbackSlot,
        feedback: Value,
        extra: Value,
    ) {
        barriered_write_pair(vector, slot, feedback, extra);
    }

    #[inline]
    fn allocate<T: HeapCast>(&self, heap: &Heap, object: T) -> Value {
        heap.allocate(object)
    }
}

// ── NoAllocation ──────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct NoAllocation;

impl NexusConfig for NoAllocation {
    const CAN_WRITE: bool = true;
    const CAN_ALLOCATE: bool = false;

    #[inline]
    fn read_pair(&self, vector: &FeedbackVector, slot: FeedbackSlot) -> (Value, Value) {
        vector.get_pair(slot)
    }

    #[inline]
    fn read_raw(&self, vector: &FeedbackVector, slot: FeedbackSlot) -> Value {
        vector.get(slot)
    }

    #[inline]
    fn write_raw(&self, vector: &FeedbackVector, slot: FeedbackSlot, value: Value) {
        barriered_write(vector, slot, value);
    }

    #[inline]
    fn write_extra(&self, vector: &FeedbackVector, slot: FeedbackSlot, value: Value) {
        barriered_write_extra(vector, slot, value);
    }

    #[inline]
    fn write_pair(
        &self,
        vector: &FeedbackVector,
        slot: FeedbackSlot,
        feedback: Value,
        extra: Value,
    ) {
        barriered_write_pair(vector, slot, feedback, extra);
    }

    fn allocate<T: HeapCast>(&self, _heap: &Heap, _object: T) -> Value {
        panic!("{} allocation while allocation is disallowed", T::TYPE)
    }
}

// ── Background ────────────────────────────────────────────────────────

/// Read-only access from the concurrent compiler thread.
///
/// The first read of a slot loads both cells once; later reads through
/// the same nexus return that snapshot.
#[derive(Debug, Default)]
pub struct Background {
    snapshot: OnceCell<(Value, Value)>,
}

impl NexusConfig for Background {
    const CAN_WRITE: bool = false;
    const CAN_ALLOCATE: bool = false;

    #[inline]
    fn read_pair(&self, vector: &FeedbackVector, slot: FeedbackSlot) -> (Value, Value) {
        *self.snapshot.get_or_init(|| vector.get_pair(slot))
    }

    fn write_raw(&self, _vector: &FeedbackVector, slot: FeedbackSlot, _value: Value) {
        unreachable!("background feedback access is read-only (slot {slot})")
    }

    fn write_extra(&self, _vector: &FeedbackVector, slot: FeedbackSlot, _value: Value) {
        unreachable!("background feedback access is read-only (slot {slot})")
    }

    fn write_pair(
        &self,
        _vector: &FeedbackVector,
        slot: FeedbackSlot,
        _feedback: Value,
        _extra: Value,
    ) {
        unreachable!("background feedback access is read-only (slot {slot})")
    }

    fn allocate<T: HeapCast>(&self, _heap: &Heap, _object: T) -> Value {
        unreachable!("background feedback access cannot allocate {}", T::TYPE)
    }
}
