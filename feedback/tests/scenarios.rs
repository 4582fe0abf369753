use feedback::handler::{LoadHandler, word_to_value};
use feedback::{
    Encoding, FeedbackMetadata, FeedbackSettings, FeedbackSlot, FeedbackVector,
    FeedbackVectorSpec, FieldIndex, InlineCacheState, SpeculationMode,
};
use feedback::nexus::{decode_call_feedback, encode_call_feedback};
use heap::{Heap, HeapSettings};
use object::{Map, Value};

const LOAD: FeedbackSlot = FeedbackSlot(0);

fn create_load_vector() -> (Heap, FeedbackVector) {
    let heap = Heap::new(HeapSettings::default());
    let mut spec = FeedbackVectorSpec::new();
    spec.add_load_ic_slot();
    let vector = FeedbackVector::new(&heap, FeedbackMetadata::new(&spec));
    (heap, vector)
}

fn handler(n: u32) -> Value {
    word_to_value(LoadHandler::field(FieldIndex::for_in_object_offset(
        16 + 8 * n,
        Encoding::Tagged,
    )))
}

#[test]
fn scenario_a_b_c() {
    let (heap, vector) = create_load_vector();
    let nexus = vector.nexus(LOAD);
    let shape_a = heap.allocate(Map::new(4));
    let shape_b = heap.allocate(Map::new(4));

    // A
    assert_eq!(nexus.ic_state(), InlineCacheState::Uninitialized);
    nexus.configure_monomorphic(None, shape_a, handler(0));
    assert_eq!(nexus.ic_state(), InlineCacheState::Monomorphic);
    assert_eq!(nexus.find_handler_for_map(shape_a), Some(handler(0)));
    assert_eq!(nexus.find_handler_for_map(shape_b), None);

    // B
    nexus.configure_polymorphic(None, &[(shape_a, handler(0)), (shape_b, handler(1))]);
    assert_eq!(nexus.ic_state(), InlineCacheState::Polymorphic);
    let mut maps = Vec::new();
    assert_eq!(nexus.extract_maps(&mut maps), 2);
    assert_eq!(maps, vec![shape_a, shape_b]);

    // C
    assert!(nexus.configure_megamorphic());
    assert_eq!(nexus.ic_state(), InlineCacheState::Megamorphic);
    let mut maps = Vec::new();
    assert_eq!(nexus.extract_maps(&mut maps), 0);
    assert!(maps.is_empty());
}

#[test]
fn scenario_d_field_index_through_load_by_field_index() {
    let map = Map::new(4);
    let index = FieldIndex::for_in_object_offset(16, Encoding::Tagged);
    let encoded = index.load_by_field_index();
    let back = FieldIndex::for_load_by_field_index(&map, encoded);
    assert_eq!(back.offset(), 16);
    assert!(back.is_inobject());
    assert_eq!(back.encoding(), Encoding::Tagged);
}

#[test]
fn scenario_e_speculation_mode_keeps_count() {
    let word = encode_call_feedback(5, SpeculationMode::AllowSpeculation);
    assert_eq!(decode_call_feedback(word), (5, SpeculationMode::AllowSpeculation));

    let heap = Heap::new(HeapSettings::default());
    let mut spec = FeedbackVectorSpec::new();
    let slot = spec.add_call_ic_slot();
    let vector = FeedbackVector::new(&heap, FeedbackMetadata::new(&spec));
    vector.set_extra(slot, Value::from_i64(word as i64));

    let nexus = vector.nexus(slot);
    nexus.set_speculation_mode(SpeculationMode::DisallowSpeculation);
    let raw = nexus.get_feedback_extra().to_i64() as u32;
    assert_eq!(decode_call_feedback(raw), (5, SpeculationMode::DisallowSpeculation));
}

#[test]
fn lattice_reaches_megamorphic_in_any_order() {
    let heap = Heap::new(HeapSettings::default());
    let shapes: Vec<Value> = (0..7).map(|i| heap.allocate(Map::new(i))).collect();
    let max = FeedbackSettings::default().max_polymorphic_map_count;
    assert!(shapes.len() > max);

    let orders: [Vec<usize>; 3] = [
        (0..7).collect(),
        (0..7).rev().collect(),
        vec![3, 0, 3, 6, 1, 1, 5, 2, 4],
    ];
    for order in orders {
        let mut spec = FeedbackVectorSpec::new();
        spec.add_load_ic_slot();
        let vector = FeedbackVector::new(&heap, FeedbackMetadata::new(&spec));
        let nexus = vector.nexus(LOAD);

        let mut last = InlineCacheState::Uninitialized;
        for i in order {
            let state = nexus.record_miss(None, shapes[i], handler(0));
            // Never moves backwards.
            assert!(rank(state) >= rank(last), "{last} -> {state}");
            last = state;
        }
        assert_eq!(nexus.ic_state(), InlineCacheState::Megamorphic);
        let mut maps = Vec::new();
        assert_eq!(nexus.extract_maps(&mut maps), 0);
    }
}

fn rank(state: InlineCacheState) -> u8 {
    match state {
        InlineCacheState::Uninitialized => 0,
        InlineCacheState::Monomorphic => 1,
        InlineCacheState::Polymorphic => 2,
        InlineCacheState::Megamorphic | InlineCacheState::Generic => 3,
    }
}

#[test]
fn cleared_entries_are_tolerated() {
    let (heap, vector) = create_load_vector();
    let nexus = vector.nexus(LOAD);
    let shapes: Vec<Value> = (0..4).map(|i| heap.allocate(Map::new(i))).collect();
    let entries: Vec<(Value, Value)> = shapes
        .iter()
        .enumerate()
        .map(|(i, &shape)| (shape, handler(i as u32)))
        .collect();
    nexus.configure_polymorphic(None, &entries);

    heap.collect(&[shapes[0], shapes[2]], &[]);

    let mut maps = Vec::new();
    assert_eq!(nexus.extract_maps(&mut maps), 2);
    assert_eq!(maps, vec![shapes[1], shapes[3]]);
    assert_eq!(nexus.find_handler_for_map(shapes[0]), None);
    assert_eq!(nexus.find_handler_for_map(shapes[2]), None);
    assert_eq!(nexus.find_handler_for_map(shapes[3]), Some(handler(3)));
    assert_eq!(nexus.ic_state(), InlineCacheState::Polymorphic);
}

#[test]
fn configure_monomorphic_leaves_megamorphic() {
    let (heap, vector) = create_load_vector();
    let nexus = vector.nexus(LOAD);
    let shape = heap.allocate(Map::new(0));
    nexus.configure_megamorphic();

    // An explicit configure is honoured...
    nexus.configure_monomorphic(None, shape, handler(0));
    assert_eq!(nexus.ic_state(), InlineCacheState::Monomorphic);

    // ...the miss policy never leaves megamorphic on its own.
    nexus.configure_megamorphic();
    assert_eq!(
        nexus.record_miss(None, shape, handler(0)),
        InlineCacheState::Megamorphic
    );
    assert_eq!(nexus.ic_state(), InlineCacheState::Megamorphic);
}

#[test]
fn metadata_kinds_follow_construction_order() {
    use feedback::FeedbackSlotKind;

    let kinds = [
        FeedbackSlotKind::StoreKeyedStrict,
        FeedbackSlotKind::ForIn,
        FeedbackSlotKind::Call,
        FeedbackSlotKind::TypeProfile,
        FeedbackSlotKind::LoadGlobalInsideTypeof,
    ];
    let mut spec = FeedbackVectorSpec::new();
    for kind in kinds {
        spec.add_slot(kind);
    }
    let metadata = FeedbackMetadata::new(&spec);
    for (i, kind) in kinds.into_iter().enumerate() {
        assert_eq!(metadata.get_kind(FeedbackSlot(i as u32)), kind);
    }
}
