use object::Value;

use super::FeedbackNexus;
use crate::access::NexusConfig;
use crate::hints::{
    BinaryOperationFeedback, BinaryOperationHint, CompareOperationFeedback,
    CompareOperationHint, ForInFeedback, ForInHint,
};
use crate::slot_kind::FeedbackSlotKind;

impl<C: NexusConfig> FeedbackNexus<'_, C> {
    fn hint_bits(&self) -> u32 {
        // A torn or foreign word reads as "anything seen".
        self.get_feedback()
            .as_i64()
            .and_then(|bits| u32::try_from(bits).ok())
            .unwrap_or(u32::MAX)
    }

    /// ORs `bits` into the cell. Returns whether the cell changed.
    fn record_hint_bits(&self, bits: u32) -> bool {
        let old = self.hint_bits();
        let new = old | bits;
        if new == old {
            return false;
        }
        self.set_feedback(Value::from_i64(new as i64));
        self.trace_transition("hint widened");
        true
    }

    pub fn get_binary_operation_feedback(&self) -> BinaryOperationHint {
        debug_assert_eq!(self.kind, FeedbackSlotKind::BinaryOp);
        BinaryOperationFeedback::from_bits_retain(self.hint_bits()).into()
    }

    pub fn get_compare_operation_feedback(&self) -> CompareOperationHint {
        debug_assert_eq!(self.kind, FeedbackSlotKind::CompareOp);
        CompareOperationFeedback::from_bits_retain(self.hint_bits()).into()
    }

    pub fn get_for_in_feedback(&self) -> ForInHint {
        debug_assert_eq!(self.kind, FeedbackSlotKind::ForIn);
        ForInFeedback::from_bits_retain(self.hint_bits()).into()
    }

    pub fn record_binary_operation(&self, feedback: BinaryOperationFeedback) -> bool {
        debug_assert_eq!(self.kind, FeedbackSlotKind::BinaryOp);
        self.record_hint_bits(feedback.bits())
    }

    pub fn record_compare_operation(&self, feedback: CompareOperationFeedback) -> bool {
        debug_assert_eq!(self.kind, FeedbackSlotKind::CompareOp);
        self.record_hint_bits(feedback.bits())
    }

    pub fn record_for_in(&self, feedback: ForInFeedback) -> bool {
        debug_assert_eq!(self.kind, FeedbackSlotKind::ForIn);
        self.record_hint_bits(feedback.bits())
    }
}
