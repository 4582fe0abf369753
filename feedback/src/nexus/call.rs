//! Call sites: target feedback plus a packed call count.

use object::{Function, SpecialObjects, Value};

use super::FeedbackNexus;
use crate::access::NexusConfig;
use crate::bit_field::BitField;
use crate::hints::SpeculationMode;
use crate::slot_kind::FeedbackSlotKind;

pub type CallCountBits = BitField<0, 31>;
pub type SpeculationModeBits = BitField<{ CallCountBits::NEXT }, 1>;

#[inline]
pub const fn encode_call_feedback(count: u32, mode: SpeculationMode) -> u32 {
    let count = if count > CallCountBits::MAX {
        CallCountBits::MAX
    } else {
        count
    };
    CallCountBits::encode(count) | SpeculationModeBits::encode(mode as u32)
}

#[inline]
pub const fn decode_call_feedback(word: u32) -> (u32, SpeculationMode) {
    let mode = if SpeculationModeBits::decode_bool(word) {
        SpeculationMode::DisallowSpeculation
    } else {
        SpeculationMode::AllowSpeculation
    };
    (CallCountBits::decode(word), mode)
}

impl<C: NexusConfig> FeedbackNexus<'_, C> {
    fn call_word(&self) -> u32 {
        debug_assert_eq!(self.kind, FeedbackSlotKind::Call);
        self.get_feedback_extra()
            .as_i64()
            .and_then(|word| u32::try_from(word).ok())
            .unwrap_or(0)
    }

    fn set_call_word(&self, word: u32) {
        self.set_feedback_extra(Value::from_i64(word as i64));
    }

    pub fn get_call_count(&self) -> u32 {
        decode_call_feedback(self.call_word()).0
    }

    /// Saturates at [`CallCountBits::MAX`].
    pub fn increment_call_count(&self) {
        let (count, mode) = decode_call_feedback(self.call_word());
        if count < CallCountBits::MAX {
            self.set_call_word(encode_call_feedback(count + 1, mode));
        }
    }

    pub fn get_speculation_mode(&self) -> SpeculationMode {
        decode_call_feedback(self.call_word()).1
    }

    /// Rewrites the mode bit; the count is preserved.
    pub fn set_speculation_mode(&self, mode: SpeculationMode) {
        let word = self.call_word();
        self.set_call_word(SpeculationModeBits::update(word, mode as u32));
    }

    /// Calls per invocation of the enclosing function; 0 before the first
    /// invocation.
    pub fn compute_call_frequency(&self) -> f32 {
        let invocations = self.vector.invocation_count();
        if invocations == 0 {
            return 0.0;
        }
        self.get_call_count() as f32 / invocations as f32
    }

    /// Records a call to `target`. A second distinct live target makes
    /// the site generic.
    pub fn collect_call_feedback(&self, target: Value) {
        debug_assert_eq!(self.kind, FeedbackSlotKind::Call);
        let feedback = self.get_feedback();
        if feedback == SpecialObjects::MEGAMORPHIC {
            return;
        }
        if feedback == SpecialObjects::UNINITIALIZED || !self.is_live_weak(feedback) {
            self.set_feedback(target.to_weak());
            self.trace_transition("-> MONOMORPHIC");
        } else if !feedback.same_object(target) {
            self.set_feedback(SpecialObjects::MEGAMORPHIC);
            log::debug!("call site {} went generic", self.slot);
        }
    }

    /// The single recorded target, while it is still alive.
    pub fn call_target(&self) -> Option<Value> {
        debug_assert_eq!(self.kind, FeedbackSlotKind::Call);
        self.weak_target::<Function>(self.get_feedback())
    }
}
