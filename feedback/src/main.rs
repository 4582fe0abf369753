use clap::Parser as ClapParser;
use std::process;

use feedback::handler::{StoreHandler, load_handler_for_name, word_to_value};
use feedback::{
    BinaryOperationFeedback, FeedbackMetadata, FeedbackSettings, FeedbackSlot,
    FeedbackSlotKind, FeedbackVector, FeedbackVectorSpec,
};
use heap::{CycleHook, Heap, HeapSettings};
use object::{Function, Map, Representation, Slot, Value};

/// Feeds synthetic shapes through feedback slots and prints how each
/// slot's state evolves.
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Slot kinds to simulate, comma separated
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "LoadProperty,LoadKeyed,StoreKeyedStrict,Call,BinaryOp"
    )]
    slots: Vec<String>,

    /// Distinct shapes fed to every slot
    #[arg(long, default_value_t = 6)]
    shapes: u32,

    /// Maps a slot may cache before going megamorphic
    #[arg(long, default_value_t = FeedbackSettings::default().max_polymorphic_map_count)]
    max_polymorphic: usize,

    /// Reclaim every n-th shape once all shapes were fed
    #[arg(long)]
    drop_every: Option<usize>,

    /// Run a collection cycle at the end
    #[arg(long, help = "Run a collection cycle and clear the vector")]
    collect: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut kinds = Vec::with_capacity(cli.slots.len());
    for name in &cli.slots {
        match name.parse::<FeedbackSlotKind>() {
            Ok(kind) => kinds.push(kind),
            Err(err) => {
                eprintln!("Error: {}", err);
                process::exit(1);
            }
        }
    }

    let settings = FeedbackSettings {
        max_polymorphic_map_count: cli.max_polymorphic,
    };
    if let Err(msg) = settings.validate() {
        eprintln!("Error: {}", msg);
        process::exit(1);
    }

    let heap = Heap::new(HeapSettings::default());
    let mut spec = FeedbackVectorSpec::new();
    for &kind in &kinds {
        spec.add_slot(kind);
    }
    let vector = FeedbackVector::with_settings(&heap, FeedbackMetadata::new(&spec), settings);

    // Every shape declares `x`; the first four indices are in-object.
    let x = heap.intern("x");
    let shapes: Vec<Value> = (0..cli.shapes)
        .map(|i| {
            heap.allocate(Map::new(4).with_slots(vec![Slot::field(
                x,
                i % 8,
                Representation::Tagged,
            )]))
        })
        .collect();
    let targets: Vec<Value> = (0..cli.shapes)
        .map(|i| {
            heap.allocate(Function {
                name: heap.intern(&format!("f{i}")),
            })
        })
        .collect();

    for (slot, kind) in vector.metadata().slots() {
        println!("== slot {} ({}) ==", slot, kind);
        simulate(&heap, &vector, slot, kind, &shapes, &targets);
    }

    if let Some(every) = cli.drop_every.filter(|&n| n > 0) {
        let dead: Vec<Value> = shapes
            .iter()
            .chain(&targets)
            .copied()
            .enumerate()
            .filter(|(i, _)| (i + 1) % every == 0)
            .map(|(_, value)| value)
            .collect();
        let hooks: [&dyn CycleHook; 0] = [];
        let stats = heap.collect(&dead, &hooks);
        println!("reclaimed {} object(s)", stats.reclaimed);
        report(&vector);
    }

    if cli.collect {
        let stats = heap.collect(&[], &[&vector]);
        println!(
            "collection cycle: vector {}",
            if stats.hooks_changed > 0 { "cleared" } else { "unchanged" }
        );
        report(&vector);
    }
}

fn simulate(
    heap: &Heap,
    vector: &FeedbackVector,
    slot: FeedbackSlot,
    kind: FeedbackSlotKind,
    shapes: &[Value],
    targets: &[Value],
) {
    let nexus = vector.nexus(slot);
    let x = heap.intern("x");
    let name = kind.is_keyed().then_some(x);

    for (i, (&shape, &target)) in shapes.iter().zip(targets).enumerate() {
        let before = nexus.ic_state();
        match kind {
            kind if kind.is_property_ic() => {
                let handler = if kind.is_store_kind() {
                    word_to_value(StoreHandler::slow())
                } else {
                    load_handler_for_name(heap, shape, x)
                };
                nexus.record_miss(name, shape, handler);
            }
            FeedbackSlotKind::Call => {
                nexus.collect_call_feedback(target);
                nexus.increment_call_count();
            }
            FeedbackSlotKind::InstanceOf => nexus.collect_instance_of_feedback(target),
            FeedbackSlotKind::CloneObject => nexus.configure_clone_object(shape, shape),
            FeedbackSlotKind::BinaryOp => {
                let observed = match i {
                    0 => BinaryOperationFeedback::SIGNED_SMALL,
                    1 => BinaryOperationFeedback::NUMBER,
                    _ => BinaryOperationFeedback::STRING,
                };
                nexus.record_binary_operation(observed);
            }
            _ => {
                println!("  no simulation for {}", kind);
                return;
            }
        }
        let after = nexus.ic_state();
        if before != after {
            println!("  shape {}: {} -> {}", i, before, after);
        }
    }
    println!("  final: {:?}", nexus);
}

fn report(vector: &FeedbackVector) {
    for (slot, kind) in vector.metadata().slots() {
        let nexus = vector.nexus(slot);
        if kind.is_property_ic() || kind == FeedbackSlotKind::CloneObject {
            let mut maps = Vec::new();
            let live = nexus.extract_maps(&mut maps);
            println!("  slot {} ({}): {}, {} live map(s)", slot, kind, nexus.ic_state(), live);
        } else {
            println!("  slot {} ({}): {}", slot, kind, nexus.ic_state());
        }
    }
}
