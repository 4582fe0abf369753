//! Global load/store slots.
//!
//! Three modes share the two cells:
//! - property cell: `weak cell / uninit`
//! - lexical variable: `packed (context, slot, immutable) / uninit`
//! - handler: `cleared / handler`

use object::{PropertyCell, SpecialObjects, Value};

use super::FeedbackNexus;
use crate::access::NexusConfig;
use crate::bit_field::BitField;

pub type ContextIndexBits = BitField<0, 12>;
pub type SlotIndexBits = BitField<{ ContextIndexBits::NEXT }, 18>;
pub type ImmutabilityBit = BitField<{ SlotIndexBits::NEXT }, 1>;

impl<C: NexusConfig> FeedbackNexus<'_, C> {
    pub fn configure_property_cell_mode(&self, cell: Value) {
        debug_assert!(self.kind.is_global_ic(), "{} is not a global slot", self.kind);
        self.set_feedback_pair(cell.to_weak(), SpecialObjects::UNINITIALIZED);
        self.trace_transition("-> property cell mode");
    }

    /// Returns `false`, leaving the slot untouched, when an index does
    /// not fit its field.
    pub fn configure_lexical_var_mode(
        &self,
        script_context_index: u32,
        context_slot_index: u32,
        immutable: bool,
    ) -> bool {
        debug_assert!(self.kind.is_global_ic(), "{} is not a global slot", self.kind);
        if !ContextIndexBits::is_valid(script_context_index)
            || !SlotIndexBits::is_valid(context_slot_index)
        {
            return false;
        }
        let word = ContextIndexBits::encode(script_context_index)
            | SlotIndexBits::encode(context_slot_index)
            | ImmutabilityBit::encode_bool(immutable);
        self.set_feedback_pair(Value::from_i64(word as i64), SpecialObjects::UNINITIALIZED);
        self.trace_transition("-> lexical variable mode");
        true
    }

    pub fn configure_handler_mode(&self, handler: Value) {
        debug_assert!(self.kind.is_global_ic(), "{} is not a global slot", self.kind);
        self.set_feedback_pair(Value::CLEARED, handler);
        self.trace_transition("-> handler mode");
    }

    /// `(script context index, context slot index, immutable)`.
    pub fn lexical_var_mode(&self) -> Option<(u32, u32, bool)> {
        let word = u32::try_from(self.get_feedback().as_i64()?).ok()?;
        Some((
            ContextIndexBits::decode(word),
            SlotIndexBits::decode(word),
            ImmutabilityBit::decode_bool(word),
        ))
    }

    /// The cached property cell, while it is still alive.
    pub fn property_cell(&self) -> Option<Value> {
        self.weak_target::<PropertyCell>(self.get_feedback())
    }
}
