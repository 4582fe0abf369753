use std::sync::Arc;

use crate::map::Map;
use crate::slot::Slot;
use crate::Value;

/// Resolves a map reference (strong or weak) to its descriptor.
///
/// Returns `None` when the reference is not a live map.
pub trait ShapeResolver {
    fn resolve_map(&self, map: Value) -> Option<Arc<Map>>;
}

/// How much prototype-chain checking a handler for a given
/// `(receiver map, holder map)` pair needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainChecks {
    /// Holder is the receiver itself; nothing to check.
    None,
    /// Holder sits on the fast-mode prototype chain; one validity cell
    /// guards the whole chain.
    One,
    /// Chain cannot be guarded by a validity cell (dictionary-mode
    /// intermediate, holder not on the chain, cyclic chain).
    FullHandler,
}

/// The result of a property lookup along a prototype chain.
#[derive(Debug, Clone, Copy)]
pub enum LookupResult {
    /// Name was not found.
    None,
    /// Name was found.
    Found {
        /// Map that owns the descriptor (may differ from the receiver's
        /// if it was found on a prototype).
        holder: Value,
        /// Copy of the matching descriptor.
        slot: Slot,
        /// Index of the descriptor within its map.
        descriptor: usize,
    },
}

/// Walks the prototype chain starting at `receiver_map` and classifies
/// the checks a handler reaching `holder_map` needs.
pub fn prototype_chain_checks(
    resolver: &impl ShapeResolver,
    receiver_map: Value,
    holder_map: Value,
) -> ChainChecks {
    if receiver_map.same_object(holder_map) {
        return ChainChecks::None;
    }

    let mut visited = vec![receiver_map];
    let mut current = resolver
        .resolve_map(receiver_map)
        .and_then(|map| map.prototype);

    while let Some(proto) = current {
        if visited.iter().any(|seen| seen.same_object(proto)) {
            return ChainChecks::FullHandler;
        }
        if proto.same_object(holder_map) {
            return ChainChecks::One;
        }
        let Some(map) = resolver.resolve_map(proto) else {
            return ChainChecks::FullHandler;
        };
        if map.is_dictionary_map() {
            return ChainChecks::FullHandler;
        }
        visited.push(proto);
        current = map.prototype;
    }

    ChainChecks::FullHandler
}

/// Looks `name` up on `receiver_map` and then along its prototype chain.
pub fn lookup(
    resolver: &impl ShapeResolver,
    receiver_map: Value,
    name: Value,
) -> LookupResult {
    let mut visited: Vec<Value> = Vec::new();
    let mut current = Some(receiver_map);

    while let Some(map_ref) = current {
        if visited.iter().any(|seen| seen.same_object(map_ref)) {
            break;
        }
        let Some(map) = resolver.resolve_map(map_ref) else {
            break;
        };
        if let Some((descriptor, slot)) = map.find_slot(name) {
            return LookupResult::Found {
                holder: map_ref,
                slot: *slot,
                descriptor,
            };
        }
        visited.push(map_ref);
        current = map.prototype;
    }

    LookupResult::None
}
