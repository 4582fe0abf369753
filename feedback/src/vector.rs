//! Per-closure feedback storage.
//!
//! Cells are plain atomic words so the background compiler can read them
//! while the interpreter thread writes. A two-cell update stores the
//! extra cell first and the feedback cell last (release), and readers load
//! the feedback cell first (acquire): a reader that sees the new feedback
//! also sees an extra cell at least as new.

use std::sync::{
    Arc,
    atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering},
};

use heap::{CycleHook, Heap};
use object::{SpecialObjects, Value};

use crate::metadata::{FeedbackMetadata, FeedbackSlot};
use crate::nexus::FeedbackNexus;
use crate::settings::FeedbackSettings;
use crate::slot_kind::FeedbackSlotKind;

/// Tiering request recorded in the vector header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OptimizationMarker {
    #[default]
    None = 0,
    LogFirstExecution,
    CompileOptimized,
    CompileOptimizedConcurrent,
    InOptimizationQueue,
}

impl OptimizationMarker {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::LogFirstExecution,
            2 => Self::CompileOptimized,
            3 => Self::CompileOptimizedConcurrent,
            4 => Self::InOptimizationQueue,
            _ => Self::None,
        }
    }
}

#[derive(Debug)]
pub struct FeedbackVector {
    metadata: Arc<FeedbackMetadata>,
    heap: Heap,
    settings: FeedbackSettings,
    /// Closure this vector belongs to.
    owner: Value,
    cells: Box<[AtomicU64]>,
    invocation_count: AtomicU32,
    profiler_ticks: AtomicU32,
    optimization_marker: AtomicU8,
}

impl FeedbackVector {
    #[must_use]
    pub fn new(heap: &Heap, metadata: Arc<FeedbackMetadata>) -> Self {
        Self::with_settings(heap, metadata, FeedbackSettings::default())
    }

    /// Panics on invalid settings.
    #[must_use]
    pub fn with_settings(
        heap: &Heap,
        metadata: Arc<FeedbackMetadata>,
        settings: FeedbackSettings,
    ) -> Self {
        if let Err(msg) = settings.validate() {
            panic!("invalid feedback settings: {msg}");
        }

        let mut cells = Vec::with_capacity(metadata.cell_count());
        for (_, kind) in metadata.slots() {
            let (feedback, extra) = Self::uninitialized_cells(kind);
            cells.push(AtomicU64::new(feedback.raw()));
            if kind.slot_size() == 2 {
                cells.push(AtomicU64::new(extra.raw()));
            }
        }
        debug_assert_eq!(cells.len(), metadata.cell_count());

        Self {
            metadata,
            heap: heap.clone(),
            settings,
            owner: SpecialObjects::UNINITIALIZED,
            cells: cells.into_boxed_slice(),
            invocation_count: AtomicU32::new(0),
            profiler_ticks: AtomicU32::new(0),
            optimization_marker: AtomicU8::new(OptimizationMarker::None as u8),
        }
    }

    pub fn with_owner(mut self, owner: Value) -> Self {
        self.owner = owner;
        self
    }

    /// `(feedback, extra)` a slot of `kind` holds before it has seen
    /// anything. One-cell kinds ignore the extra word.
    pub const fn uninitialized_cells(kind: FeedbackSlotKind) -> (Value, Value) {
        const UNINIT: Value = SpecialObjects::UNINITIALIZED;
        const ZERO: Value = Value::from_raw(0);
        match kind {
            FeedbackSlotKind::Call => (UNINIT, ZERO),
            FeedbackSlotKind::LoadGlobalNotInsideTypeof
            | FeedbackSlotKind::LoadGlobalInsideTypeof
            | FeedbackSlotKind::StoreGlobalSloppy
            | FeedbackSlotKind::StoreGlobalStrict => (Value::CLEARED, UNINIT),
            FeedbackSlotKind::BinaryOp
            | FeedbackSlotKind::CompareOp
            | FeedbackSlotKind::ForIn
            | FeedbackSlotKind::Literal => (ZERO, UNINIT),
            _ => (UNINIT, UNINIT),
        }
    }

    // ── Header ────────────────────────────────────────────────────────

    #[inline(always)]
    pub fn metadata(&self) -> &Arc<FeedbackMetadata> {
        &self.metadata
    }

    #[inline(always)]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    #[inline(always)]
    pub fn settings(&self) -> &FeedbackSettings {
        &self.settings
    }

    #[inline(always)]
    pub fn owner(&self) -> Value {
        self.owner
    }

    #[inline(always)]
    pub fn slot_count(&self) -> usize {
        self.metadata.slot_count()
    }

    #[inline(always)]
    pub fn kind(&self, slot: FeedbackSlot) -> FeedbackSlotKind {
        self.metadata.get_kind(slot)
    }

    pub fn invocation_count(&self) -> u32 {
        self.invocation_count.load(Ordering::Relaxed)
    }

    /// Saturates at `u32::MAX`.
    pub fn increment_invocation_count(&self) {
        let _ = self.invocation_count.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |count| count.checked_add(1),
        );
    }

    pub fn reset_invocation_count(&self) {
        self.invocation_count.store(0, Ordering::Relaxed);
    }

    pub fn profiler_ticks(&self) -> u32 {
        self.profiler_ticks.load(Ordering::Relaxed)
    }

    pub fn increment_profiler_ticks(&self) {
        let _ = self.profiler_ticks.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |ticks| ticks.checked_add(1),
        );
    }

    pub fn reset_profiler_ticks(&self) {
        self.profiler_ticks.store(0, Ordering::Relaxed);
    }

    pub fn optimization_marker(&self) -> OptimizationMarker {
        OptimizationMarker::from_u8(self.optimization_marker.load(Ordering::Acquire))
    }

    pub fn set_optimization_marker(&self, marker: OptimizationMarker) {
        log::debug!("optimization marker -> {marker:?}");
        self.optimization_marker
            .store(marker as u8, Ordering::Release);
    }

    pub fn clear_optimization_marker(&self) {
        self.set_optimization_marker(OptimizationMarker::None);
    }

    // ── Raw cells ─────────────────────────────────────────────────────

    #[inline(always)]
    fn cell(&self, slot: FeedbackSlot, index: usize) -> &AtomicU64 {
        &self.cells[self.metadata.cell_offset(slot) + index]
    }

    #[inline(always)]
    fn has_extra(&self, slot: FeedbackSlot) -> bool {
        self.kind(slot).slot_size() == 2
    }

    /// Feedback cell of `slot`.
    #[inline]
    pub fn get(&self, slot: FeedbackSlot) -> Value {
        Value::from_raw(self.cell(slot, 0).load(Ordering::Acquire))
    }

    /// Extra cell of a two-cell slot.
    #[inline]
    pub fn get_extra(&self, slot: FeedbackSlot) -> Value {
        debug_assert!(self.has_extra(slot), "slot {slot} has no extra cell");
        Value::from_raw(self.cell(slot, 1).load(Ordering::Acquire))
    }

    /// Both cells, feedback first. One-cell slots report the
    /// uninitialized sentinel as extra.
    #[inline]
    pub fn get_pair(&self, slot: FeedbackSlot) -> (Value, Value) {
        let feedback = self.get(slot);
        let extra = if self.has_extra(slot) {
            self.get_extra(slot)
        } else {
            SpecialObjects::UNINITIALIZED
        };
        (feedback, extra)
    }

    /// Raw store without write barrier; feedback writes go through a
    /// [`FeedbackNexus`].
    #[inline]
    pub fn set(&self, slot: FeedbackSlot, value: Value) {
        self.cell(slot, 0).store(value.raw(), Ordering::Release);
    }

    #[inline]
    pub fn set_extra(&self, slot: FeedbackSlot, value: Value) {
        debug_assert!(self.has_extra(slot), "slot {slot} has no extra cell");
        self.cell(slot, 1).store(value.raw(), Ordering::Release);
    }

    /// Stores extra before feedback.
    #[inline]
    pub fn set_pair(&self, slot: FeedbackSlot, feedback: Value, extra: Value) {
        if self.has_extra(slot) {
            self.set_extra(slot, extra);
        }
        self.set(slot, feedback);
    }

    // ── Nexus access ──────────────────────────────────────────────────

    #[inline]
    pub fn nexus(&self, slot: FeedbackSlot) -> FeedbackNexus<'_> {
        FeedbackNexus::new(self, slot)
    }

    /// Resets every slot whose kind does not keep its feedback across
    /// collections. Returns whether anything changed.
    pub fn clear_slots(&self) -> bool {
        let mut changed = false;
        for (slot, _) in self.metadata.slots() {
            changed |= FeedbackNexus::no_allocation(self, slot).clear();
        }
        if changed {
            log::debug!("cleared feedback in vector owned by {:?}", self.owner);
        }
        changed
    }
}

impl CycleHook for FeedbackVector {
    fn on_collection(&self) -> bool {
        self.clear_slots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FeedbackVectorSpec;
    use crate::slot_kind::{LanguageMode, TypeofMode};
    use heap::HeapSettings;

    fn create_test_vector() -> (Heap, FeedbackVector) {
        let heap = Heap::new(HeapSettings::default());
        let mut spec = FeedbackVectorSpec::new();
        spec.add_call_ic_slot();
        spec.add_load_ic_slot();
        spec.add_load_global_ic_slot(TypeofMode::NotInside);
        spec.add_binary_op_ic_slot();
        spec.add_instance_of_slot();
        spec.add_literal_slot();
        spec.add_keyed_store_ic_slot(LanguageMode::Sloppy);
        spec.add_type_profile_slot();
        let vector = FeedbackVector::new(&heap, FeedbackMetadata::new(&spec));
        (heap, vector)
    }

    #[test]
    fn default_initialization_per_kind() {
        let (_heap, vector) = create_test_vector();
        let uninit = SpecialObjects::UNINITIALIZED;
        let zero = Value::from_i64(0);

        assert_eq!(vector.slot_count(), 8);
        assert_eq!(vector.get_pair(FeedbackSlot(0)), (uninit, zero));
        assert_eq!(vector.get_pair(FeedbackSlot(1)), (uninit, uninit));
        assert_eq!(vector.get_pair(FeedbackSlot(2)), (Value::CLEARED, uninit));
        assert_eq!(vector.get(FeedbackSlot(3)), zero);
        assert_eq!(vector.get(FeedbackSlot(4)), uninit);
        assert_eq!(vector.get(FeedbackSlot(5)), zero);
        assert_eq!(vector.get_pair(FeedbackSlot(6)), (uninit, uninit));
        assert_eq!(vector.get(FeedbackSlot(7)), uninit);
    }

    #[test]
    fn raw_accessors_address_the_right_cells() {
        let (_heap, vector) = create_test_vector();
        vector.set_pair(FeedbackSlot(1), Value::from_i64(7), Value::from_i64(8));
        assert_eq!(
            vector.get_pair(FeedbackSlot(1)),
            (Value::from_i64(7), Value::from_i64(8))
        );
        // Neighbours untouched.
        assert_eq!(vector.get_extra(FeedbackSlot(0)), Value::from_i64(0));
        assert_eq!(vector.get(FeedbackSlot(2)), Value::CLEARED);
    }

    #[test]
    fn header_counters() {
        let (_heap, vector) = create_test_vector();
        assert_eq!(vector.invocation_count(), 0);
        vector.increment_invocation_count();
        vector.increment_invocation_count();
        assert_eq!(vector.invocation_count(), 2);
        vector.reset_invocation_count();
        assert_eq!(vector.invocation_count(), 0);

        vector.increment_profiler_ticks();
        assert_eq!(vector.profiler_ticks(), 1);
        vector.reset_profiler_ticks();
        assert_eq!(vector.profiler_ticks(), 0);

        assert_eq!(vector.optimization_marker(), OptimizationMarker::None);
        vector.set_optimization_marker(OptimizationMarker::CompileOptimizedConcurrent);
        assert_eq!(
            vector.optimization_marker(),
            OptimizationMarker::CompileOptimizedConcurrent
        );
        vector.clear_optimization_marker();
        assert_eq!(vector.optimization_marker(), OptimizationMarker::None);
    }

    #[test]
    fn owner_link() {
        let (heap, vector) = create_test_vector();
        assert_eq!(vector.owner(), SpecialObjects::UNINITIALIZED);
        let closure = heap.allocate(object::Function {
            name: heap.intern("f"),
        });
        let vector = vector.with_owner(closure);
        assert_eq!(vector.owner(), closure);
    }

    #[test]
    fn fresh_vector_has_nothing_to_clear() {
        let (_heap, vector) = create_test_vector();
        assert!(!vector.clear_slots());
    }

    #[test]
    #[should_panic(expected = "invalid feedback settings")]
    fn invalid_settings_panic() {
        let heap = Heap::new(HeapSettings::default());
        let _ = FeedbackVector::with_settings(
            &heap,
            FeedbackMetadata::new(&FeedbackVectorSpec::new()),
            FeedbackSettings {
                max_polymorphic_map_count: 0,
            },
        );
    }
}
