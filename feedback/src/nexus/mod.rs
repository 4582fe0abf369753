//! Kind-aware view of one feedback slot.
//!
//! Property access slots move through:
//! ```text
//!                 miss           miss (new map)        miss (> max maps)
//! UNINITIALIZED ───────> MONOMORPHIC ───────> POLYMORPHIC ───────> MEGAMORPHIC
//!                          │   ▲
//!                          └───┘ miss (same or cleared map): new handler
//! ```
//! Call sites use `GENERIC` in place of `MEGAMORPHIC`. Nothing leaves
//! `MEGAMORPHIC` on a miss; only an explicit configure call or a clear
//! resets the slot.
//!
//! Cell layouts (feedback / extra):
//! - property IC, unnamed: `weak map / handler`, `weak array / uninit`,
//!   `megamorphic / key type`
//! - keyed IC, named: `name / [weak map, handler, ...]`
//! - global: `weak property cell / uninit`, `lexical slot fixnum / uninit`,
//!   `cleared / handler`
//! - call: `weak target or megamorphic / packed call count`

mod call;
mod global;
mod hints;
mod literal;
mod property;
mod type_profile;

use std::sync::Arc;

use heap::WeakRef;
use object::{HeapCast, SpecialObjects, Symbol, Value, WeakArray};

use crate::access::{Background, MainThread, NexusConfig, NoAllocation};
use crate::hints::{BinaryOperationHint, CompareOperationHint, ForInHint};
use crate::metadata::FeedbackSlot;
use crate::slot_kind::FeedbackSlotKind;
use crate::vector::FeedbackVector;

pub use call::{CallCountBits, SpeculationModeBits, decode_call_feedback, encode_call_feedback};
pub use global::{ContextIndexBits, ImmutabilityBit, SlotIndexBits};

/// Specialization level of a slot, derived from its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineCacheState {
    Uninitialized,
    Monomorphic,
    Polymorphic,
    Megamorphic,
    /// Call sites only: too many targets, stop specializing.
    Generic,
}

impl core::fmt::Display for InlineCacheState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Monomorphic => "MONOMORPHIC",
            Self::Polymorphic => "POLYMORPHIC",
            Self::Megamorphic => "MEGAMORPHIC",
            Self::Generic => "GENERIC",
        })
    }
}

pub struct FeedbackNexus<'v, C: NexusConfig = MainThread> {
    vector: &'v FeedbackVector,
    slot: FeedbackSlot,
    kind: FeedbackSlotKind,
    config: C,
}

impl<'v> FeedbackNexus<'v, MainThread> {
    #[inline]
    pub fn new(vector: &'v FeedbackVector, slot: FeedbackSlot) -> Self {
        Self::with_config(vector, slot, MainThread)
    }
}

impl<'v> FeedbackNexus<'v, NoAllocation> {
    #[inline]
    pub fn no_allocation(vector: &'v FeedbackVector, slot: FeedbackSlot) -> Self {
        Self::with_config(vector, slot, NoAllocation)
    }
}

impl<'v> FeedbackNexus<'v, Background> {
    #[inline]
    pub fn background(vector: &'v FeedbackVector, slot: FeedbackSlot) -> Self {
        Self::with_config(vector, slot, Background::default())
    }
}

impl<'v, C: NexusConfig> FeedbackNexus<'v, C> {
    /// Panics when `slot` is out of range.
    #[inline]
    pub fn with_config(vector: &'v FeedbackVector, slot: FeedbackSlot, config: C) -> Self {
        let kind = vector.kind(slot);
        Self {
            vector,
            slot,
            kind,
            config,
        }
    }

    #[inline(always)]
    pub fn slot(&self) -> FeedbackSlot {
        self.slot
    }

    #[inline(always)]
    pub fn kind(&self) -> FeedbackSlotKind {
        self.kind
    }

    #[inline(always)]
    pub fn vector(&self) -> &'v FeedbackVector {
        self.vector
    }

    // ── Cell access ───────────────────────────────────────────────────

    #[inline(always)]
    pub fn get_feedback(&self) -> Value {
        self.config.read_raw(self.vector, self.slot)
    }

    #[inline(always)]
    pub fn get_feedback_extra(&self) -> Value {
        debug_assert!(self.kind.slot_size() == 2, "{} has no extra cell", self.kind);
        self.config.read_pair(self.vector, self.slot).1
    }

    #[inline(always)]
    pub fn get_feedback_pair(&self) -> (Value, Value) {
        self.config.read_pair(self.vector, self.slot)
    }

    #[inline(always)]
    fn set_feedback(&self, value: Value) {
        self.config.write_raw(self.vector, self.slot, value);
    }

    #[inline(always)]
    fn set_feedback_extra(&self, value: Value) {
        self.config.write_extra(self.vector, self.slot, value);
    }

    #[inline(always)]
    fn set_feedback_pair(&self, feedback: Value, extra: Value) {
        self.config.write_pair(self.vector, self.slot, feedback, extra);
    }

    #[inline(always)]
    fn allocate<T: HeapCast>(&self, object: T) -> Value {
        self.config.allocate(self.vector.heap(), object)
    }

    #[inline(always)]
    fn get_as<T: HeapCast>(&self, value: Value) -> Option<Arc<T>> {
        if !value.is_strong() || SpecialObjects::is_sentinel(value) {
            return None;
        }
        self.vector.heap().get_as::<T>(value)
    }

    /// Weak word whose target is still live.
    #[inline(always)]
    fn is_live_weak(&self, value: Value) -> bool {
        value.is_weak() && self.vector.heap().is_live(value)
    }

    /// Strong form of a weak word whose target is a live `T`.
    fn weak_target<T: HeapCast>(&self, value: Value) -> Option<Value> {
        if !value.is_weak() {
            return None;
        }
        WeakRef::<T>::new(value)
            .try_get(self.vector.heap())
            .map(|_| value.to_strong())
    }

    #[inline(always)]
    fn is_name(&self, value: Value) -> bool {
        self.get_as::<Symbol>(value).is_some()
    }

    #[inline(always)]
    fn trace_transition(&self, what: &str) {
        log::trace!("slot {} ({}): {what}", self.slot, self.kind);
    }

    // ── State ─────────────────────────────────────────────────────────

    /// Classifies the slot's current cells. Never mutates.
    pub fn ic_state(&self) -> InlineCacheState {
        use InlineCacheState::*;

        let (feedback, extra) = self.get_feedback_pair();
        let uninit = SpecialObjects::UNINITIALIZED;
        let mega = SpecialObjects::MEGAMORPHIC;

        match self.kind {
            kind if kind.is_property_ic() => {
                if feedback == uninit {
                    Uninitialized
                } else if feedback == mega {
                    Megamorphic
                } else if feedback.is_weak() {
                    Monomorphic
                } else if self.get_as::<WeakArray>(feedback).is_some() {
                    Polymorphic
                } else if self.is_name(feedback) {
                    match self.get_as::<WeakArray>(extra) {
                        Some(array) if array.len() > 2 => Polymorphic,
                        Some(_) => Monomorphic,
                        None => Uninitialized,
                    }
                } else {
                    Uninitialized
                }
            }
            kind if kind.is_global_ic() => {
                if feedback.is_fixnum()
                    || self.is_live_weak(feedback)
                    || extra != uninit
                {
                    Monomorphic
                } else {
                    Uninitialized
                }
            }
            FeedbackSlotKind::Call => {
                if feedback == uninit {
                    Uninitialized
                } else if feedback == mega {
                    Generic
                } else {
                    Monomorphic
                }
            }
            FeedbackSlotKind::BinaryOp => {
                match self.get_binary_operation_feedback() {
                    BinaryOperationHint::None => Uninitialized,
                    BinaryOperationHint::Any => Megamorphic,
                    _ => Monomorphic,
                }
            }
            FeedbackSlotKind::CompareOp => {
                match self.get_compare_operation_feedback() {
                    CompareOperationHint::None => Uninitialized,
                    CompareOperationHint::Any => Megamorphic,
                    _ => Monomorphic,
                }
            }
            FeedbackSlotKind::ForIn => match self.get_for_in_feedback() {
                ForInHint::None => Uninitialized,
                ForInHint::Any => Megamorphic,
                _ => Monomorphic,
            },
            FeedbackSlotKind::InstanceOf => {
                if feedback == uninit {
                    Uninitialized
                } else if feedback == mega {
                    Megamorphic
                } else {
                    Monomorphic
                }
            }
            FeedbackSlotKind::Literal => {
                if feedback.is_fixnum() {
                    Uninitialized
                } else {
                    Monomorphic
                }
            }
            FeedbackSlotKind::CloneObject => {
                if feedback == uninit {
                    Uninitialized
                } else if feedback == mega {
                    Megamorphic
                } else if feedback.is_weak() {
                    Monomorphic
                } else {
                    Polymorphic
                }
            }
            FeedbackSlotKind::TypeProfile => {
                if feedback == uninit {
                    Uninitialized
                } else {
                    Monomorphic
                }
            }
            kind => unreachable!("unclassified feedback slot kind {kind}"),
        }
    }

    pub fn is_uninitialized(&self) -> bool {
        self.ic_state() == InlineCacheState::Uninitialized
    }

    pub fn is_megamorphic(&self) -> bool {
        matches!(
            self.ic_state(),
            InlineCacheState::Megamorphic | InlineCacheState::Generic
        )
    }

    // ── Reset ─────────────────────────────────────────────────────────

    /// Installs the kind's uninitialized cells.
    pub fn configure_uninitialized(&self) {
        let (feedback, extra) = FeedbackVector::uninitialized_cells(self.kind);
        if self.kind.slot_size() == 2 {
            self.set_feedback_pair(feedback, extra);
        } else {
            self.set_feedback(feedback);
        }
        self.trace_transition("-> UNINITIALIZED");
    }

    /// Resets the slot unless its kind keeps feedback across collections.
    /// Returns whether anything changed; clearing twice reports `false`.
    pub fn clear(&self) -> bool {
        if self.kind.survives_clear() {
            return false;
        }
        let defaults = FeedbackVector::uninitialized_cells(self.kind);
        let (feedback, extra) = self.get_feedback_pair();
        let unchanged = if self.kind.slot_size() == 2 {
            (feedback, extra) == defaults
        } else {
            feedback == defaults.0
        };
        if unchanged {
            return false;
        }
        self.configure_uninitialized();
        true
    }
}

impl<C: NexusConfig> core::fmt::Debug for FeedbackNexus<'_, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedbackNexus")
            .field("slot", &self.slot)
            .field("kind", &self.kind)
            .field("state", &self.ic_state())
            .finish()
    }
}
