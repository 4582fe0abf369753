//! Builds the handler value installed next to a map in a property slot.

use heap::Heap;
use object::{
    ChainChecks, DataHandler, LookupResult, ShapeResolver, Value, lookup,
    prototype_chain_checks,
};

use super::{
    DoAccessCheckOnLookupStartObjectBits, LookupOnLookupStartObjectBits,
    LoadHandler, StoreHandler, word_to_value,
};
use crate::field_index::FieldIndex;

/// Handler for a load that found its property on `holder_map`, reached
/// from receivers of `receiver_map`.
pub fn load_handler_for(
    heap: &Heap,
    receiver_map: Value,
    holder_map: Value,
    smi_handler: u32,
) -> Value {
    handler_for(heap, receiver_map, holder_map, smi_handler, LoadHandler::slow())
}

/// Resolves `name` on `receiver_map` and its prototype chain and builds
/// the load handler for the field it finds. Accessors and missing names
/// get the slow handler.
pub fn load_handler_for_name(heap: &Heap, receiver_map: Value, name: Value) -> Value {
    let LookupResult::Found {
        holder,
        slot,
        descriptor,
    } = lookup(heap, receiver_map, name)
    else {
        log::trace!("{name:?} not found from {receiver_map:?}");
        return word_to_value(LoadHandler::slow());
    };
    if !slot.is_field() {
        return word_to_value(LoadHandler::slow());
    }
    let Some(holder_map) = heap.resolve_map(holder) else {
        return word_to_value(LoadHandler::slow());
    };
    let index = FieldIndex::for_descriptor(&holder_map, descriptor);
    load_handler_for(heap, receiver_map, holder, LoadHandler::field(index))
}

/// Store counterpart of [`load_handler_for`].
pub fn store_handler_for(
    heap: &Heap,
    receiver_map: Value,
    holder_map: Value,
    smi_handler: u32,
) -> Value {
    handler_for(heap, receiver_map, holder_map, smi_handler, StoreHandler::slow())
}

fn handler_for(
    heap: &Heap,
    receiver_map: Value,
    holder_map: Value,
    mut word: u32,
    slow: u32,
) -> Value {
    let Some(receiver) = heap.resolve_map(receiver_map) else {
        return word_to_value(slow);
    };

    if receiver.is_dictionary_map() {
        word = LookupOnLookupStartObjectBits::update(word, 1);
    }
    let needs_receiver_check =
        receiver.is_access_check_needed() || receiver.is_primitive_map();

    match prototype_chain_checks(heap, receiver_map, holder_map) {
        ChainChecks::None if !needs_receiver_check => word_to_value(word),
        ChainChecks::None => {
            let word = DoAccessCheckOnLookupStartObjectBits::update(word, 1);
            heap.allocate(DataHandler::new(
                word_to_value(word),
                Value::from_i64(0),
                vec![receiver_map.to_weak()],
            ))
        }
        ChainChecks::One => {
            let cell = receiver
                .prototype
                .map_or(Value::from_i64(0), |proto| heap.validity_cell_for(proto));
            let mut data = vec![holder_map.to_weak()];
            if needs_receiver_check {
                data.push(receiver_map.to_weak());
            }
            heap.allocate(DataHandler::new(word_to_value(word), cell, data))
        }
        ChainChecks::FullHandler => {
            log::debug!(
                "no guarded chain from {receiver_map:?} to {holder_map:?}, using slow handler"
            );
            word_to_value(slow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_index::{Encoding, FieldIndex};
    use crate::handler::{LoadHandlerKind, handler_is_current, handler_word};
    use heap::HeapSettings;
    use object::{Map, MapFlags, Representation, Slot};

    fn field_word() -> u32 {
        LoadHandler::field(FieldIndex::for_in_object_offset(24, Encoding::Tagged))
    }

    #[test]
    fn own_property_is_a_plain_fixnum() {
        let heap = Heap::new(HeapSettings::default());
        let map = heap.allocate(Map::new(2));
        let handler = load_handler_for(&heap, map, map, field_word());
        assert!(handler.is_fixnum());
        assert_eq!(handler_word(&heap, handler), Some(field_word()));
    }

    #[test]
    fn dictionary_receiver_sets_lookup_bit() {
        let heap = Heap::new(HeapSettings::default());
        let map = heap.allocate(Map::new(0).with_flags(MapFlags::DICTIONARY));
        let handler = load_handler_for(&heap, map, map, field_word());
        let word = handler_word(&heap, handler).expect("packed word");
        assert!(crate::handler::lookup_on_lookup_start_object(word));
    }

    #[test]
    fn access_checked_receiver_gets_data_handler() {
        let heap = Heap::new(HeapSettings::default());
        let map = heap.allocate(Map::new(0).with_flags(MapFlags::ACCESS_CHECK_NEEDED));
        let handler = store_handler_for(&heap, map, map, field_word());
        let data = heap.get_as::<DataHandler>(handler).expect("data handler");
        assert_eq!(data.data(), &[map.to_weak()]);
        let word = handler_word(&heap, handler).expect("packed word");
        assert!(crate::handler::do_access_check_on_lookup_start_object(word));
    }

    #[test]
    fn prototype_holder_is_guarded_by_validity_cell() {
        let heap = Heap::new(HeapSettings::default());
        let proto = heap.allocate(Map::new(1).with_flags(MapFlags::PROTOTYPE_MAP));
        let receiver = heap.allocate(Map::new(0).with_prototype(proto));

        let handler = load_handler_for(&heap, receiver, proto, field_word());
        let data = heap.get_as::<DataHandler>(handler).expect("data handler");
        assert_eq!(data.data(), &[proto.to_weak()]);
        assert_eq!(data.validity_cell, heap.validity_cell_for(proto));
        assert!(handler_is_current(&heap, handler));

        heap.invalidate_prototype_chain(proto);
        assert!(!handler_is_current(&heap, handler));
    }

    #[test]
    fn unreachable_holder_falls_back_to_slow() {
        let heap = Heap::new(HeapSettings::default());
        let receiver = heap.allocate(Map::new(0));
        let stranger = heap.allocate(Map::new(0));
        let handler = load_handler_for(&heap, receiver, stranger, field_word());
        let word = handler_word(&heap, handler).expect("packed word");
        assert_eq!(
            LoadHandler::decode(word).map(LoadHandler::kind),
            Some(LoadHandlerKind::Slow)
        );

        let handler = store_handler_for(&heap, Value::CLEARED, receiver, field_word());
        assert_eq!(handler, word_to_value(StoreHandler::slow()));
    }

    #[test]
    fn name_resolves_to_own_and_prototype_fields() {
        let heap = Heap::new(HeapSettings::default());
        let x = heap.intern("x");
        let y = heap.intern("y");
        let z = heap.intern("z");
        let proto = heap.allocate(
            Map::new(1)
                .with_flags(MapFlags::PROTOTYPE_MAP)
                .with_slots(vec![Slot::field(y, 0, Representation::Double)]),
        );
        let receiver = heap.allocate(
            Map::new(2)
                .with_prototype(proto)
                .with_slots(vec![
                    Slot::field(z, 0, Representation::Tagged),
                    Slot::field(x, 1, Representation::Tagged),
                ]),
        );

        let own = load_handler_for_name(&heap, receiver, x);
        assert!(own.is_fixnum());
        let own_index = FieldIndex::for_handler(handler_word(&heap, own).expect("word"));
        assert!(own_index.is_inobject());
        assert_eq!(own_index.offset(), 24);

        let inherited = load_handler_for_name(&heap, receiver, y);
        let data = heap.get_as::<DataHandler>(inherited).expect("data handler");
        assert_eq!(data.data(), &[proto.to_weak()]);
        assert_eq!(data.validity_cell, heap.validity_cell_for(proto));
        let word = handler_word(&heap, inherited).expect("word");
        assert!(FieldIndex::for_handler(word).is_double());
    }

    #[test]
    fn unknown_name_and_accessor_load_slowly() {
        let heap = Heap::new(HeapSettings::default());
        let getter = heap.intern("getter");
        let map = heap.allocate(Map::new(0).with_slots(vec![Slot::accessor(getter)]));
        let slow = word_to_value(LoadHandler::slow());
        assert_eq!(load_handler_for_name(&heap, map, getter), slow);
        assert_eq!(load_handler_for_name(&heap, map, heap.intern("absent")), slow);
        assert_eq!(
            LoadHandler::decode(LoadHandler::slow()).map(LoadHandler::kind),
            Some(LoadHandlerKind::Slow)
        );
    }
}
