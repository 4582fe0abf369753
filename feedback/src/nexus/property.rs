//! Property-access slots: load, store, has and their keyed variants.

use object::{SpecialObjects, Value, WeakArray};

use super::{FeedbackNexus, InlineCacheState};
use crate::access::NexusConfig;
use crate::handler::{KeyedAccessStoreMode, StoreHandler, handler_word, is_valid_handler};
use crate::hints::IcCheckType;
use crate::slot_kind::FeedbackSlotKind;

impl<C: NexusConfig> FeedbackNexus<'_, C> {
    /// Caches a single `(map, handler)` pair. Keyed slots that saw a
    /// property name keep it in the feedback cell and move the pair into
    /// an array in the extra cell.
    pub fn configure_monomorphic(&self, name: Option<Value>, map: Value, handler: Value) {
        debug_assert!(self.kind.is_property_ic(), "{} is not a property slot", self.kind);
        debug_assert!(
            is_valid_handler(self.vector.heap(), handler),
            "invalid handler {handler:?}"
        );
        let weak_map = map.to_weak();
        match name {
            None => self.set_feedback_pair(weak_map, handler),
            Some(name) => {
                let array = self.allocate(WeakArray::new(vec![weak_map, handler]));
                self.set_feedback_pair(name, array);
            }
        }
        self.trace_transition("-> MONOMORPHIC");
    }

    /// Caches two or more pairs, in order.
    pub fn configure_polymorphic(&self, name: Option<Value>, entries: &[(Value, Value)]) {
        debug_assert!(self.kind.is_property_ic(), "{} is not a property slot", self.kind);
        debug_assert!(entries.len() > 1, "polymorphic feedback needs two entries");

        let mut words = Vec::with_capacity(entries.len() * 2);
        for &(map, handler) in entries {
            debug_assert!(is_valid_handler(self.vector.heap(), handler));
            words.push(map.to_weak());
            words.push(handler);
        }
        let array = self.allocate(WeakArray::new(words));
        match name {
            None => self.set_feedback_pair(array, SpecialObjects::UNINITIALIZED),
            Some(name) => self.set_feedback_pair(name, array),
        }
        self.trace_transition("-> POLYMORPHIC");
    }

    #[inline]
    pub fn configure_megamorphic(&self) -> bool {
        self.configure_megamorphic_keyed(IcCheckType::Property)
    }

    /// Drops every cached map. Property slots remember `key_type` in the
    /// extra cell; call slots keep their count. Returns whether the slot
    /// changed.
    pub fn configure_megamorphic_keyed(&self, key_type: IcCheckType) -> bool {
        let mega = SpecialObjects::MEGAMORPHIC;
        let (feedback, extra) = self.get_feedback_pair();
        match self.kind {
            kind if kind.is_property_ic() => {
                let key = Value::from_i64(key_type as i64);
                if feedback == mega && extra == key {
                    return false;
                }
                self.set_feedback_pair(mega, key);
            }
            FeedbackSlotKind::Call | FeedbackSlotKind::InstanceOf => {
                if feedback == mega {
                    return false;
                }
                self.set_feedback(mega);
            }
            FeedbackSlotKind::CloneObject => {
                if feedback == mega {
                    return false;
                }
                self.set_feedback_pair(mega, SpecialObjects::UNINITIALIZED);
            }
            kind => panic!("{kind} slots have no megamorphic state"),
        }
        log::debug!("slot {} ({}) went megamorphic", self.slot, self.kind);
        true
    }

    fn miss_key_type(&self, name: Option<Value>) -> IcCheckType {
        if name.is_some() || !self.kind.is_keyed() {
            IcCheckType::Property
        } else {
            IcCheckType::Element
        }
    }

    /// Records that `map` missed the cache and `handler` serves it.
    ///
    /// `name` is only meaningful for keyed slots; named slots ignore it.
    pub fn record_miss(
        &self,
        name: Option<Value>,
        map: Value,
        handler: Value,
    ) -> InlineCacheState {
        debug_assert!(self.kind.is_property_ic(), "{} is not a property slot", self.kind);
        let name = if self.kind.is_keyed() { name } else { None };

        match self.ic_state() {
            InlineCacheState::Megamorphic => return InlineCacheState::Megamorphic,
            InlineCacheState::Uninitialized => {
                self.configure_monomorphic(name, map, handler);
                return InlineCacheState::Monomorphic;
            }
            _ => {}
        }

        if self.kind.is_keyed() && self.get_name() != name {
            self.configure_megamorphic_keyed(self.miss_key_type(name));
            return InlineCacheState::Megamorphic;
        }

        let mut entries = Vec::new();
        self.extract_maps_and_handlers(&mut entries);
        if let Some(entry) = entries.iter_mut().find(|(cached, _)| cached.same_object(map)) {
            entry.1 = handler;
        } else if entries.len() >= self.vector.settings().max_polymorphic_map_count {
            self.configure_megamorphic_keyed(self.miss_key_type(name));
            return InlineCacheState::Megamorphic;
        } else {
            entries.push((map, handler));
        }

        match entries.as_slice() {
            [(map, handler)] => {
                self.configure_monomorphic(name, *map, *handler);
                InlineCacheState::Monomorphic
            }
            _ => {
                self.configure_polymorphic(name, &entries);
                InlineCacheState::Polymorphic
            }
        }
    }

    /// Raw `[map, handler, ...]` storage of a monomorphic or polymorphic
    /// slot, weak maps included as stored.
    fn cached_pairs(&self) -> Vec<(Value, Value)> {
        let (feedback, extra) = self.get_feedback_pair();
        if feedback == SpecialObjects::UNINITIALIZED || feedback == SpecialObjects::MEGAMORPHIC {
            return Vec::new();
        }
        if feedback.is_weak() {
            return vec![(feedback, extra)];
        }
        let array = self
            .get_as::<WeakArray>(feedback)
            .or_else(|| self.get_as::<WeakArray>(extra).filter(|_| self.is_name(feedback)));
        array.map_or_else(Vec::new, |array| array.pairs().collect())
    }

    /// Appends every live cached map (as a strong reference) to `maps`.
    /// Cleared and reclaimed entries are skipped. Returns how many were
    /// appended.
    pub fn extract_maps(&self, maps: &mut Vec<Value>) -> usize {
        let mut pairs = Vec::new();
        let found = self.extract_maps_and_handlers(&mut pairs);
        maps.extend(pairs.into_iter().map(|(map, _)| map));
        found
    }

    /// Like [`extract_maps`](Self::extract_maps), with the handler cached
    /// for each map.
    pub fn extract_maps_and_handlers(&self, out: &mut Vec<(Value, Value)>) -> usize {
        debug_assert!(
            self.kind.is_property_ic() || self.kind == FeedbackSlotKind::CloneObject,
            "{} caches no maps",
            self.kind
        );
        let before = out.len();
        for (map, handler) in self.cached_pairs() {
            if self.is_live_weak(map) {
                out.push((map.to_strong(), handler));
            }
        }
        out.len() - before
    }

    /// Handler cached for `map`, if it is still cached and alive.
    pub fn find_handler_for_map(&self, map: Value) -> Option<Value> {
        self.cached_pairs()
            .into_iter()
            .find(|(cached, _)| !cached.is_cleared() && cached.same_object(map))
            .filter(|(cached, _)| self.is_live_weak(*cached))
            .map(|(_, handler)| handler)
    }

    /// Whether a keyed slot was fed by a property name or an element
    /// index.
    pub fn get_key_type(&self) -> IcCheckType {
        debug_assert!(self.kind.is_keyed(), "{} is not keyed", self.kind);
        let (feedback, extra) = self.get_feedback_pair();
        if feedback == SpecialObjects::MEGAMORPHIC {
            return extra.as_i64().map_or(IcCheckType::Element, IcCheckType::from_i64);
        }
        if self.is_name(feedback) {
            IcCheckType::Property
        } else {
            IcCheckType::Element
        }
    }

    /// Property name recorded by a keyed slot.
    pub fn get_name(&self) -> Option<Value> {
        let feedback = self.get_feedback();
        self.is_name(feedback).then_some(feedback)
    }

    /// First non-standard store mode among the cached handlers.
    pub fn get_keyed_access_store_mode(&self) -> KeyedAccessStoreMode {
        debug_assert!(
            self.kind.is_keyed_store_ic() || self.kind.is_store_in_array_literal_ic(),
            "{} has no store mode",
            self.kind
        );
        let heap = self.vector.heap();
        let mut pairs = Vec::new();
        self.extract_maps_and_handlers(&mut pairs);
        pairs
            .into_iter()
            .filter_map(|(_, handler)| handler_word(heap, handler))
            .filter_map(|word| StoreHandler::decode(word)?.store_mode())
            .find(|mode| *mode != KeyedAccessStoreMode::Standard)
            .unwrap_or(KeyedAccessStoreMode::Standard)
    }
}

#[cfg(test)]
mod tests {
    use heap::{Heap, HeapSettings};
    use object::Map;

    use crate::handler::{ElementStore, LoadHandler, word_to_value};
    use crate::metadata::{FeedbackMetadata, FeedbackSlot, FeedbackVectorSpec};
    use crate::slot_kind::LanguageMode;
    use crate::vector::FeedbackVector;

    use super::*;

    struct Fixture {
        heap: Heap,
        vector: FeedbackVector,
    }

    const LOAD: FeedbackSlot = FeedbackSlot(0);
    const KEYED_LOAD: FeedbackSlot = FeedbackSlot(1);
    const KEYED_STORE: FeedbackSlot = FeedbackSlot(2);

    fn create_fixture() -> Fixture {
        let heap = Heap::new(HeapSettings::default());
        let mut spec = FeedbackVectorSpec::new();
        spec.add_load_ic_slot();
        spec.add_keyed_load_ic_slot();
        spec.add_keyed_store_ic_slot(LanguageMode::Strict);
        let vector = FeedbackVector::new(&heap, FeedbackMetadata::new(&spec));
        Fixture { heap, vector }
    }

    fn slow() -> Value {
        word_to_value(LoadHandler::slow())
    }

    #[test]
    fn monomorphic_then_polymorphic() {
        let Fixture { heap, vector } = create_fixture();
        let nexus = vector.nexus(LOAD);
        let a = heap.allocate(Map::new(1));
        let b = heap.allocate(Map::new(2));

        assert_eq!(nexus.record_miss(None, a, slow()), InlineCacheState::Monomorphic);
        assert_eq!(nexus.get_feedback(), a.to_weak());
        assert_eq!(nexus.find_handler_for_map(a), Some(slow()));

        assert_eq!(
            nexus.record_miss(None, b, word_to_value(1)),
            InlineCacheState::Polymorphic
        );
        let mut maps = Vec::new();
        assert_eq!(nexus.extract_maps(&mut maps), 2);
        assert_eq!(maps, vec![a, b]);
        assert_eq!(nexus.find_handler_for_map(b), Some(word_to_value(1)));
    }

    #[test]
    fn same_map_replaces_handler() {
        let Fixture { heap, vector } = create_fixture();
        let nexus = vector.nexus(LOAD);
        let a = heap.allocate(Map::new(1));
        nexus.record_miss(None, a, slow());
        assert_eq!(
            nexus.record_miss(None, a, word_to_value(7)),
            InlineCacheState::Monomorphic
        );
        assert_eq!(nexus.find_handler_for_map(a), Some(word_to_value(7)));
    }

    #[test]
    fn megamorphic_after_max_maps() {
        let Fixture { heap, vector } = create_fixture();
        let nexus = vector.nexus(LOAD);
        let maps: Vec<Value> = (0..5).map(|i| heap.allocate(Map::new(i))).collect();
        for &map in &maps[..4] {
            nexus.record_miss(None, map, slow());
        }
        assert_eq!(nexus.ic_state(), InlineCacheState::Polymorphic);
        assert_eq!(nexus.record_miss(None, maps[4], slow()), InlineCacheState::Megamorphic);
        assert_eq!(nexus.get_feedback_extra(), Value::from_i64(IcCheckType::Property as i64));

        // Misses never leave megamorphic.
        assert_eq!(nexus.record_miss(None, maps[0], slow()), InlineCacheState::Megamorphic);
        let mut out = Vec::new();
        assert_eq!(nexus.extract_maps(&mut out), 0);
        assert!(!nexus.configure_megamorphic());
    }

    #[test]
    fn keyed_slot_keeps_name() {
        let Fixture { heap, vector } = create_fixture();
        let nexus = vector.nexus(KEYED_LOAD);
        let name = heap.intern("x");
        let a = heap.allocate(Map::new(1));
        let b = heap.allocate(Map::new(1));

        nexus.record_miss(Some(name), a, slow());
        assert_eq!(nexus.ic_state(), InlineCacheState::Monomorphic);
        assert_eq!(nexus.get_name(), Some(name));
        assert_eq!(nexus.get_key_type(), IcCheckType::Property);

        nexus.record_miss(Some(name), b, slow());
        assert_eq!(nexus.ic_state(), InlineCacheState::Polymorphic);
        assert_eq!(nexus.get_feedback(), name);

        let other = heap.intern("y");
        assert_eq!(
            nexus.record_miss(Some(other), a, slow()),
            InlineCacheState::Megamorphic
        );
        assert_eq!(nexus.get_key_type(), IcCheckType::Property);
    }

    #[test]
    fn keyed_element_miss_after_name_is_megamorphic_element() {
        let Fixture { heap, vector } = create_fixture();
        let nexus = vector.nexus(KEYED_LOAD);
        let a = heap.allocate(Map::new(0));
        nexus.record_miss(Some(heap.intern("x")), a, slow());
        nexus.record_miss(None, a, slow());
        assert!(nexus.is_megamorphic());
        assert_eq!(nexus.get_key_type(), IcCheckType::Element);
    }

    #[test]
    fn cleared_entries_are_skipped_and_dropped() {
        let Fixture { heap, vector } = create_fixture();
        let nexus = vector.nexus(LOAD);
        let a = heap.allocate(Map::new(0));
        let b = heap.allocate(Map::new(0));
        let c = heap.allocate(Map::new(0));
        nexus.record_miss(None, a, slow());
        nexus.record_miss(None, b, slow());

        heap.collect(&[a], &[]);
        let mut maps = Vec::new();
        assert_eq!(nexus.extract_maps(&mut maps), 1);
        assert_eq!(maps, vec![b]);
        assert_eq!(nexus.find_handler_for_map(a), None);

        assert_eq!(nexus.record_miss(None, c, slow()), InlineCacheState::Polymorphic);
        let mut pairs = Vec::new();
        nexus.extract_maps_and_handlers(&mut pairs);
        assert_eq!(pairs.iter().map(|(m, _)| *m).collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn store_mode_from_handlers() {
        let Fixture { heap, vector } = create_fixture();
        let nexus = vector.nexus(KEYED_STORE);
        let a = heap.allocate(Map::new(0));
        let b = heap.allocate(Map::new(0));
        assert_eq!(nexus.get_keyed_access_store_mode(), KeyedAccessStoreMode::Standard);

        let grow = StoreHandler::Element(ElementStore {
            store_mode: KeyedAccessStoreMode::GrowAndHandleCow,
            is_js_array: true,
            elements_kind: object::ElementsKind::PackedSmi,
        })
        .encode();
        nexus.record_miss(None, a, word_to_value(StoreHandler::slow()));
        nexus.record_miss(None, b, word_to_value(grow));
        assert_eq!(
            nexus.get_keyed_access_store_mode(),
            KeyedAccessStoreMode::GrowAndHandleCow
        );
    }
}
