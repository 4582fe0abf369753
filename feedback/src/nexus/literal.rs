//! InstanceOf, literal and object-clone slots.

use object::{Function, Map, SpecialObjects, Value, WeakArray};

use super::FeedbackNexus;
use crate::access::NexusConfig;
use crate::slot_kind::FeedbackSlotKind;

impl<C: NexusConfig> FeedbackNexus<'_, C> {
    // ── InstanceOf ────────────────────────────────────────────────────

    /// Records the right-hand side of an `instanceof`. A second distinct
    /// live constructor makes the slot megamorphic.
    pub fn collect_instance_of_feedback(&self, constructor: Value) {
        debug_assert_eq!(self.kind, FeedbackSlotKind::InstanceOf);
        let feedback = self.get_feedback();
        if feedback == SpecialObjects::MEGAMORPHIC {
            return;
        }
        if feedback == SpecialObjects::UNINITIALIZED || !self.is_live_weak(feedback) {
            self.set_feedback(constructor.to_weak());
            self.trace_transition("-> MONOMORPHIC");
        } else if !feedback.same_object(constructor) {
            self.set_feedback(SpecialObjects::MEGAMORPHIC);
            self.trace_transition("-> MEGAMORPHIC");
        }
    }

    pub fn constructor_feedback(&self) -> Option<Value> {
        debug_assert_eq!(self.kind, FeedbackSlotKind::InstanceOf);
        self.weak_target::<Function>(self.get_feedback())
    }

    // ── Literal ───────────────────────────────────────────────────────

    /// Allocation site or boilerplate recorded for a literal, `None` while
    /// the slot still holds its creation count.
    pub fn literal_site(&self) -> Option<Value> {
        debug_assert_eq!(self.kind, FeedbackSlotKind::Literal);
        let feedback = self.get_feedback();
        (!feedback.is_fixnum()).then_some(feedback)
    }

    pub fn set_literal_site(&self, site: Value) {
        debug_assert_eq!(self.kind, FeedbackSlotKind::Literal);
        self.set_feedback(site);
        self.trace_transition("literal site installed");
    }

    // ── CloneObject ───────────────────────────────────────────────────

    fn is_replaceable_map(&self, cached: Value, source_map: Value) -> bool {
        cached.same_object(source_map)
            || !self.is_live_weak(cached)
            || self
                .vector
                .heap()
                .get_as::<Map>(cached)
                .is_some_and(|map| map.is_deprecated())
    }

    /// Records that cloning objects of `source_map` produced `result_map`.
    /// Installed arrays are never mutated; growth allocates a new one.
    pub fn configure_clone_object(&self, source_map: Value, result_map: Value) {
        debug_assert_eq!(self.kind, FeedbackSlotKind::CloneObject);
        let (feedback, extra) = self.get_feedback_pair();
        let source = source_map.to_weak();

        if feedback == SpecialObjects::MEGAMORPHIC {
            return;
        }
        if feedback == SpecialObjects::UNINITIALIZED {
            self.set_feedback_pair(source, result_map);
            self.trace_transition("-> MONOMORPHIC");
            return;
        }

        if feedback.is_weak() {
            if self.is_replaceable_map(feedback, source_map) {
                self.set_feedback_pair(source, result_map);
                self.trace_transition("MONOMORPHIC handler replaced");
            } else {
                let array = self.allocate(WeakArray::new(vec![feedback, extra, source, result_map]));
                self.set_feedback_pair(array, SpecialObjects::UNINITIALIZED);
                self.trace_transition("-> POLYMORPHIC");
            }
            return;
        }

        let Some(array) = self.get_as::<WeakArray>(feedback) else {
            return;
        };
        let mut entries: Vec<(Value, Value)> = array
            .pairs()
            .filter(|(map, _)| self.is_live_weak(*map))
            .collect();
        if let Some(entry) = entries.iter_mut().find(|(map, _)| map.same_object(source_map)) {
            entry.1 = result_map;
        } else if entries.len() >= self.vector.settings().max_polymorphic_map_count {
            self.configure_megamorphic();
            return;
        } else {
            entries.push((source, result_map));
        }

        let words: Vec<Value> = entries
            .into_iter()
            .flat_map(|(map, result)| [map, result])
            .collect();
        let array = self.allocate(WeakArray::new(words));
        self.set_feedback_pair(array, SpecialObjects::UNINITIALIZED);
        self.trace_transition("POLYMORPHIC array rebuilt");
    }
}
