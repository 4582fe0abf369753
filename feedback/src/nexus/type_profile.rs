use object::{SpecialObjects, TypeProfile, Value};

use super::FeedbackNexus;
use crate::access::NexusConfig;
use crate::slot_kind::FeedbackSlotKind;

impl<C: NexusConfig> FeedbackNexus<'_, C> {
    fn type_profile(&self) -> Option<std::sync::Arc<TypeProfile>> {
        debug_assert_eq!(self.kind, FeedbackSlotKind::TypeProfile);
        self.get_as::<TypeProfile>(self.get_feedback())
    }

    /// Records that a value of type `type_name` (an interned symbol) was
    /// seen at `position`. Repeats are ignored.
    pub fn collect_type_profile(&self, type_name: Value, position: i32) {
        let current = self.type_profile();
        let next = match current {
            Some(profile) => profile.with_type(position, type_name),
            None => TypeProfile::default().with_type(position, type_name),
        };
        if let Some(next) = next {
            let profile = self.allocate(next);
            self.set_feedback(profile);
            self.trace_transition("type profile extended");
        }
    }

    /// Positions with at least one recorded type, ascending.
    pub fn source_positions(&self) -> Vec<i32> {
        self.type_profile()
            .map(|profile| profile.entries.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Type names recorded at `position`, in recording order.
    pub fn types_for_source_position(&self, position: i32) -> Vec<String> {
        let Some(profile) = self.type_profile() else {
            return Vec::new();
        };
        let heap = self.vector.heap();
        profile
            .entries
            .get(&position)
            .into_iter()
            .flatten()
            .filter_map(|&symbol| heap.symbol_name(symbol))
            .map(String::from)
            .collect()
    }

    pub fn reset_type_profile(&self) {
        debug_assert_eq!(self.kind, FeedbackSlotKind::TypeProfile);
        self.set_feedback(SpecialObjects::UNINITIALIZED);
    }
}
