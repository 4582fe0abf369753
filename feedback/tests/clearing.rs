use feedback::handler::{LoadHandler, word_to_value};
use feedback::{
    BinaryOperationFeedback, BinaryOperationHint, FeedbackMetadata, FeedbackVector,
    FeedbackVectorSpec, InlineCacheState, LanguageMode, TypeofMode,
};
use heap::{Heap, HeapSettings};
use object::{AllocationSite, Function, Map, PropertyCell, Value};

struct Slots {
    load: feedback::FeedbackSlot,
    call: feedback::FeedbackSlot,
    instance_of: feedback::FeedbackSlot,
    clone: feedback::FeedbackSlot,
    global: feedback::FeedbackSlot,
    keyed_store: feedback::FeedbackSlot,
    binary: feedback::FeedbackSlot,
    literal: feedback::FeedbackSlot,
    type_profile: feedback::FeedbackSlot,
}

fn populated_vector(heap: &Heap) -> (FeedbackVector, Slots) {
    let mut spec = FeedbackVectorSpec::new();
    let slots = Slots {
        load: spec.add_load_ic_slot(),
        call: spec.add_call_ic_slot(),
        instance_of: spec.add_instance_of_slot(),
        clone: spec.add_clone_object_slot(),
        global: spec.add_load_global_ic_slot(TypeofMode::NotInside),
        keyed_store: spec.add_keyed_store_ic_slot(LanguageMode::Sloppy),
        binary: spec.add_binary_op_ic_slot(),
        literal: spec.add_literal_slot(),
        type_profile: spec.add_type_profile_slot(),
    };
    let vector = FeedbackVector::new(heap, FeedbackMetadata::new(&spec));

    let map = heap.allocate(Map::new(1));
    let f = heap.allocate(Function {
        name: heap.intern("f"),
    });
    let cell = heap.allocate(PropertyCell {
        name: heap.intern("g"),
    });
    let handler = word_to_value(LoadHandler::slow());

    vector.nexus(slots.load).record_miss(None, map, handler);
    let call = vector.nexus(slots.call);
    call.collect_call_feedback(f);
    call.increment_call_count();
    vector.nexus(slots.instance_of).collect_instance_of_feedback(f);
    vector.nexus(slots.clone).configure_clone_object(map, map);
    vector.nexus(slots.global).configure_property_cell_mode(cell);
    vector.nexus(slots.keyed_store).configure_megamorphic();
    vector
        .nexus(slots.binary)
        .record_binary_operation(BinaryOperationFeedback::NUMBER);
    vector.nexus(slots.literal).set_literal_site(heap.allocate(AllocationSite {
        boilerplate: Value::from_i64(0),
    }));
    vector
        .nexus(slots.type_profile)
        .collect_type_profile(heap.intern("number"), 3);
    (vector, slots)
}

#[test]
fn clear_slots_resets_only_ic_kinds() {
    let heap = Heap::new(HeapSettings::default());
    let (vector, slots) = populated_vector(&heap);

    assert!(vector.clear_slots());
    for slot in [
        slots.load,
        slots.call,
        slots.instance_of,
        slots.clone,
        slots.global,
        slots.keyed_store,
    ] {
        let nexus = vector.nexus(slot);
        assert_eq!(nexus.ic_state(), InlineCacheState::Uninitialized, "{nexus:?}");
        assert_eq!(
            nexus.get_feedback_pair(),
            FeedbackVector::uninitialized_cells(nexus.kind()),
        );
    }

    assert_eq!(
        vector.nexus(slots.binary).get_binary_operation_feedback(),
        BinaryOperationHint::Number
    );
    assert_eq!(vector.nexus(slots.literal).ic_state(), InlineCacheState::Monomorphic);
    assert_eq!(vector.nexus(slots.type_profile).source_positions(), vec![3]);

    assert!(!vector.clear_slots());
}

#[test]
fn clearing_resets_call_count() {
    let heap = Heap::new(HeapSettings::default());
    let (vector, slots) = populated_vector(&heap);
    assert_eq!(vector.nexus(slots.call).get_call_count(), 1);
    vector.nexus(slots.call).clear();
    assert_eq!(vector.nexus(slots.call).get_call_count(), 0);
}

#[test]
fn collection_cycle_runs_vector_hook() {
    let heap = Heap::new(HeapSettings::default());
    let (vector, slots) = populated_vector(&heap);

    let stats = heap.collect(&[], &[&vector]);
    assert_eq!(stats.hooks_changed, 1);
    assert!(vector.nexus(slots.load).is_uninitialized());

    let stats = heap.collect(&[], &[&vector]);
    assert_eq!(stats.hooks_changed, 0);
}
