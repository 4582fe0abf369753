//! Per-function description of a feedback vector's layout.

use std::sync::Arc;

use crate::slot_kind::{FeedbackSlotKind, LanguageMode, TypeofMode};

/// Ordinal of a declared slot. `FeedbackSlot(i)` is the i-th slot added
/// to the [`FeedbackVectorSpec`], regardless of the widths before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedbackSlot(pub u32);

impl FeedbackSlot {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for FeedbackSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Builder for [`FeedbackMetadata`], filled in by the bytecode compiler
/// as it emits monitored instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackVectorSpec {
    kinds: Vec<FeedbackSlotKind>,
}

impl FeedbackVectorSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_slot(&mut self, kind: FeedbackSlotKind) -> FeedbackSlot {
        let slot = FeedbackSlot(self.kinds.len() as u32);
        self.kinds.push(kind);
        slot
    }

    pub fn add_call_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::Call)
    }

    pub fn add_load_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::LoadProperty)
    }

    pub fn add_load_global_ic_slot(&mut self, mode: TypeofMode) -> FeedbackSlot {
        self.add_slot(match mode {
            TypeofMode::Inside => FeedbackSlotKind::LoadGlobalInsideTypeof,
            TypeofMode::NotInside => FeedbackSlotKind::LoadGlobalNotInsideTypeof,
        })
    }

    pub fn add_keyed_load_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::LoadKeyed)
    }

    pub fn add_keyed_has_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::HasKeyed)
    }

    pub fn add_store_ic_slot(&mut self, mode: LanguageMode) -> FeedbackSlot {
        self.add_slot(match mode {
            LanguageMode::Sloppy => FeedbackSlotKind::StoreNamedSloppy,
            LanguageMode::Strict => FeedbackSlotKind::StoreNamedStrict,
        })
    }

    pub fn add_store_own_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::StoreOwnNamed)
    }

    pub fn add_store_global_ic_slot(&mut self, mode: LanguageMode) -> FeedbackSlot {
        self.add_slot(match mode {
            LanguageMode::Sloppy => FeedbackSlotKind::StoreGlobalSloppy,
            LanguageMode::Strict => FeedbackSlotKind::StoreGlobalStrict,
        })
    }

    pub fn add_keyed_store_ic_slot(&mut self, mode: LanguageMode) -> FeedbackSlot {
        self.add_slot(match mode {
            LanguageMode::Sloppy => FeedbackSlotKind::StoreKeyedSloppy,
            LanguageMode::Strict => FeedbackSlotKind::StoreKeyedStrict,
        })
    }

    pub fn add_store_in_array_literal_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::StoreInArrayLiteral)
    }

    pub fn add_store_data_property_in_literal_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::StoreDataPropertyInLiteral)
    }

    pub fn add_binary_op_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::BinaryOp)
    }

    pub fn add_compare_ic_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::CompareOp)
    }

    pub fn add_for_in_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::ForIn)
    }

    pub fn add_instance_of_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::InstanceOf)
    }

    pub fn add_literal_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::Literal)
    }

    pub fn add_clone_object_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::CloneObject)
    }

    pub fn add_type_profile_slot(&mut self) -> FeedbackSlot {
        self.add_slot(FeedbackSlotKind::TypeProfile)
    }

    pub fn slot_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn kinds(&self) -> &[FeedbackSlotKind] {
        &self.kinds
    }
}

/// Immutable slot layout shared by every closure of one function.
///
/// ```text
/// slot:   #0 Call   #1 BinaryOp   #2 LoadKeyed
/// cells:  [0, 1]    [2]           [3, 4]
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct FeedbackMetadata {
    kinds: Box<[FeedbackSlotKind]>,
    /// First cell of each slot.
    offsets: Box<[u32]>,
    cell_count: usize,
}

impl FeedbackMetadata {
    #[must_use]
    pub fn new(spec: &FeedbackVectorSpec) -> Arc<Self> {
        Arc::new(Self::from_kinds(spec.kinds()))
    }

    pub fn from_kinds(kinds: &[FeedbackSlotKind]) -> Self {
        let mut offsets = Vec::with_capacity(kinds.len());
        let mut cell_count = 0usize;
        for kind in kinds {
            offsets.push(cell_count as u32);
            cell_count += kind.slot_size();
        }
        Self {
            kinds: kinds.into(),
            offsets: offsets.into_boxed_slice(),
            cell_count,
        }
    }

    /// Panics when `slot` is out of range.
    #[inline]
    pub fn get_kind(&self, slot: FeedbackSlot) -> FeedbackSlotKind {
        match self.kinds.get(slot.index()) {
            Some(&kind) => kind,
            None => panic!(
                "feedback slot {slot} out of range ({} slots)",
                self.kinds.len()
            ),
        }
    }

    #[inline(always)]
    pub fn get_slot_size(kind: FeedbackSlotKind) -> usize {
        kind.slot_size()
    }

    /// Index of the first cell of `slot`.
    #[inline]
    pub fn cell_offset(&self, slot: FeedbackSlot) -> usize {
        match self.offsets.get(slot.index()) {
            Some(&offset) => offset as usize,
            None => panic!(
                "feedback slot {slot} out of range ({} slots)",
                self.kinds.len()
            ),
        }
    }

    #[inline(always)]
    pub fn slot_count(&self) -> usize {
        self.kinds.len()
    }

    #[inline(always)]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn slots(&self) -> impl Iterator<Item = (FeedbackSlot, FeedbackSlotKind)> + '_ {
        self.kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| (FeedbackSlot(i as u32), kind))
    }

    /// `true` if this metadata was built from an identical spec.
    pub fn spec_equals(&self, spec: &FeedbackVectorSpec) -> bool {
        *self.kinds == *spec.kinds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_spec() -> FeedbackVectorSpec {
        let mut spec = FeedbackVectorSpec::new();
        spec.add_call_ic_slot();
        spec.add_binary_op_ic_slot();
        spec.add_keyed_load_ic_slot();
        spec.add_store_ic_slot(LanguageMode::Strict);
        spec.add_literal_slot();
        spec.add_load_global_ic_slot(TypeofMode::Inside);
        spec
    }

    #[test]
    fn get_kind_matches_construction_order() {
        let spec = mixed_spec();
        let metadata = FeedbackMetadata::new(&spec);
        assert_eq!(metadata.slot_count(), spec.slot_count());
        for (i, &kind) in spec.kinds().iter().enumerate() {
            assert_eq!(metadata.get_kind(FeedbackSlot(i as u32)), kind);
        }
        assert!(metadata.spec_equals(&spec));
    }

    #[test]
    fn cell_count_is_sum_of_widths() {
        let metadata = FeedbackMetadata::new(&mixed_spec());
        assert_eq!(metadata.cell_count(), 2 + 1 + 2 + 2 + 1 + 2);
        let offsets: Vec<usize> = metadata
            .slots()
            .map(|(slot, _)| metadata.cell_offset(slot))
            .collect();
        assert_eq!(offsets, vec![0, 2, 3, 5, 7, 8]);
    }

    #[test]
    fn every_kind_sequence_round_trips() {
        let metadata = FeedbackMetadata::from_kinds(&FeedbackSlotKind::ALL);
        let total: usize = FeedbackSlotKind::ALL
            .iter()
            .map(|&kind| FeedbackMetadata::get_slot_size(kind))
            .sum();
        assert_eq!(metadata.cell_count(), total);
        for (slot, kind) in metadata.slots() {
            assert_eq!(FeedbackSlotKind::ALL[slot.index()], kind);
        }
    }

    #[test]
    fn empty_metadata() {
        let metadata = FeedbackMetadata::new(&FeedbackVectorSpec::new());
        assert_eq!(metadata.slot_count(), 0);
        assert_eq!(metadata.cell_count(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_kind_is_fatal() {
        let metadata = FeedbackMetadata::new(&mixed_spec());
        metadata.get_kind(FeedbackSlot(6));
    }
}
