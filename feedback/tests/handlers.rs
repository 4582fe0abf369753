use feedback::handler::{
    FieldLoad, FieldStore, KeyedAccessStoreMode, LoadHandler, StoreHandler,
    handler_is_current, load_handler_for, store_handler_for, word_to_value,
};
use feedback::{
    Encoding, FeedbackMetadata, FeedbackVector, FeedbackVectorSpec, FieldIndex,
    InlineCacheState,
};
use heap::{Heap, HeapSettings};
use object::{DataHandler, Map, MapFlags, Representation, Slot};

#[test]
fn validity_cell_is_renewed_after_invalidation() {
    let heap = Heap::new(HeapSettings::default());
    let proto = heap.allocate(Map::new(2).with_flags(MapFlags::PROTOTYPE_MAP));
    let receiver = heap.allocate(Map::new(0).with_prototype(proto));
    let word = LoadHandler::field(FieldIndex::for_in_object_offset(16, Encoding::Tagged));

    let first = load_handler_for(&heap, receiver, proto, word);
    let first_cell = heap
        .get_as::<DataHandler>(first)
        .expect("data handler")
        .validity_cell;
    let again = load_handler_for(&heap, receiver, proto, word);
    assert_eq!(
        heap.get_as::<DataHandler>(again).expect("data handler").validity_cell,
        first_cell
    );

    assert_eq!(heap.invalidate_prototype_chain(proto), 1);
    assert!(!handler_is_current(&heap, first));

    let fresh = load_handler_for(&heap, receiver, proto, word);
    assert!(handler_is_current(&heap, fresh));
    assert_ne!(
        heap.get_as::<DataHandler>(fresh).expect("data handler").validity_cell,
        first_cell
    );
}

#[test]
fn descriptor_field_handler_round_trips() {
    let heap = Heap::new(HeapSettings::default());
    let x = heap.intern("x");
    let y = heap.intern("y");
    let map = Map::new(1).with_slots(vec![
        Slot::field(x, 0, Representation::Tagged),
        Slot::field(y, 1, Representation::Double),
    ]);

    let inobject = FieldIndex::for_descriptor(&map, 0);
    let word = LoadHandler::field(inobject);
    let Some(LoadHandler::Field(field)) = LoadHandler::decode(word) else {
        panic!("not a field handler: {word:#x}");
    };
    assert_eq!(field, FieldLoad::from_field_index(inobject));
    assert_eq!(FieldIndex::for_handler(word).offset(), inobject.offset());

    let outobject = FieldIndex::for_descriptor(&map, 1);
    assert!(!outobject.is_inobject());
    assert!(outobject.is_double());
    let store = StoreHandler::Field(FieldStore::from_field_index(
        outobject,
        Representation::Double,
        false,
    ));
    assert_eq!(StoreHandler::decode(store.encode()), Some(store));
    let from_word = FieldIndex::for_handler(store.encode());
    assert_eq!(from_word.offset(), outobject.offset());
    assert!(!from_word.is_inobject());
    assert!(from_word.is_double());
}

#[test]
fn keyed_store_reports_slow_mode() {
    let heap = Heap::new(HeapSettings::default());
    let mut spec = FeedbackVectorSpec::new();
    let slot = spec.add_store_in_array_literal_ic_slot();
    let vector = FeedbackVector::new(&heap, FeedbackMetadata::new(&spec));
    let map = heap.allocate(Map::new(0).with_flags(MapFlags::JS_ARRAY));

    let word = StoreHandler::Slow(KeyedAccessStoreMode::IgnoreOutOfBounds).encode();
    let handler = store_handler_for(&heap, map, map, word);
    assert_eq!(handler, word_to_value(word));

    let nexus = vector.nexus(slot);
    assert_eq!(nexus.record_miss(None, map, handler), InlineCacheState::Monomorphic);
    assert_eq!(
        nexus.get_keyed_access_store_mode(),
        KeyedAccessStoreMode::IgnoreOutOfBounds
    );
}
