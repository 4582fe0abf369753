//! Object table backing every feedback vector.
//!
//! Objects are addressed by [`ObjectId`] and stored behind `Arc`s, so a
//! reader that resolved an id keeps its object alive for as long as it
//! holds the `Arc`, even if a collection cycle reclaims the id meanwhile.
//!
//! This crate does not trace. Consumers tell [`Heap::collect`] which
//! objects died; the heap drops them, which turns every weak reference to
//! them into a cleared one, and then runs the registered [`CycleHook`]s.

use std::{
    collections::{HashMap, HashSet},
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use object::{
    HeapCast, HeapObject, Map, ObjectId, ObjectType, Sentinel,
    ShapeResolver, SpecialObjects, Symbol, ValidityCell, Value,
};
use parking_lot::{Mutex, RwLock};

type FastMap<K, V> = HashMap<K, V, ahash::RandomState>;
type FastSet<K> = HashSet<K, ahash::RandomState>;

// ── Public API types ──────────────────────────────────────────────────

/// Consumers implement this to be notified once per collection cycle,
/// after dead objects have been dropped.
///
/// Returns `true` if the hook changed any of its state.
pub trait CycleHook {
    fn on_collection(&self) -> bool;
}

/// Summary of one [`Heap::collect`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    /// Objects dropped from the table.
    pub reclaimed: usize,
    /// Hooks that reported a change.
    pub hooks_changed: usize,
}

// ── Heap settings ─────────────────────────────────────────────────────

/// Configuration for the object table.
#[derive(Debug, Clone)]
pub struct HeapSettings {
    /// Table entries reserved up front.
    pub initial_capacity: usize,
    /// Hard cap on the number of ids ever handed out.
    pub max_objects: usize,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_objects: 1 << 24,
        }
    }
}

impl HeapSettings {
    #[inline]
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.initial_capacity == 0 || self.max_objects == 0 {
            return Err("Sizes must be > 0");
        }
        if self.max_objects <= SpecialObjects::FIRST_DYNAMIC_ID as usize {
            return Err("max_objects must leave room past the sentinels");
        }
        if self.max_objects > u32::MAX as usize {
            return Err("max_objects must fit an object id");
        }
        if self.initial_capacity > self.max_objects {
            return Err("initial_capacity must not exceed max_objects");
        }
        Ok(())
    }
}

// ── HeapInner ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct HeapInner {
    settings: HeapSettings,
    /// Indexed by object id; `None` marks a reclaimed (or reserved) id.
    objects: RwLock<Vec<Option<HeapObject>>>,
    symbols: Mutex<FastMap<Box<str>, Value>>,
    /// Prototype map id -> validity cell guarding chains through it.
    validity_cells: Mutex<FastMap<ObjectId, Value>>,
    remembered: Mutex<FastSet<ObjectId>>,
    barrier_hits: AtomicUsize,
}

impl HeapInner {
    fn new(settings: HeapSettings) -> Self {
        if let Err(msg) = settings.validate() {
            panic!("invalid heap settings: {msg}");
        }

        let mut objects = Vec::with_capacity(settings.initial_capacity);
        objects.push(None);
        for (value, name) in SpecialObjects::SENTINELS {
            debug_assert_eq!(
                value.object_id().map(ObjectId::index),
                Some(objects.len())
            );
            objects.push(Some(Sentinel { name }.into_object()));
        }

        Self {
            settings,
            objects: RwLock::new(objects),
            symbols: Mutex::new(FastMap::default()),
            validity_cells: Mutex::new(FastMap::default()),
            remembered: Mutex::new(FastSet::default()),
            barrier_hits: AtomicUsize::new(0),
        }
    }

    #[inline(always)]
    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    /// Stores `object` and returns a strong reference to it.
    ///
    /// Running out of ids is fatal.
    pub fn allocate<T: HeapCast>(&self, object: T) -> Value {
        let mut objects = self.objects.write();
        assert!(
            objects.len() < self.settings.max_objects,
            "heap exhausted: {} objects",
            objects.len()
        );
        let id = ObjectId::new(objects.len() as u32);
        objects.push(Some(object.into_object()));
        log::trace!("allocated {} #{}", T::TYPE, id.raw());
        Value::from_id(id)
    }

    /// Returns the canonical symbol for `name`.
    pub fn intern(&self, name: &str) -> Value {
        let mut symbols = self.symbols.lock();
        if let Some(&symbol) = symbols.get(name) {
            if self.is_live(symbol) {
                return symbol;
            }
        }
        let symbol = self.allocate(Symbol { name: name.into() });
        symbols.insert(name.into(), symbol);
        symbol
    }

    pub fn symbol_name(&self, symbol: Value) -> Option<Box<str>> {
        self.get_as::<Symbol>(symbol).map(|s| s.name.clone())
    }

    /// Resolves a strong or weak reference. `None` for fixnums, cleared
    /// words and reclaimed objects.
    #[inline]
    pub fn get(&self, value: Value) -> Option<HeapObject> {
        let id = value.object_id()?;
        self.objects.read().get(id.index())?.clone()
    }

    #[inline]
    pub fn get_as<T: HeapCast>(&self, value: Value) -> Option<Arc<T>> {
        let id = value.object_id()?;
        let objects = self.objects.read();
        let object = objects.get(id.index())?.as_ref()?;
        T::cast(object).cloned()
    }

    #[inline]
    pub fn is_live(&self, value: Value) -> bool {
        value.object_id().is_some_and(|id| {
            self.objects
                .read()
                .get(id.index())
                .is_some_and(Option::is_some)
        })
    }

    pub fn object_type(&self, value: Value) -> Option<ObjectType> {
        self.get(value).map(|object| object.object_type())
    }

    pub fn live_objects(&self) -> usize {
        self.objects.read().iter().filter(|o| o.is_some()).count()
    }

    // ── Validity cells ────────────────────────────────────────────────

    /// Returns the shared validity cell guarding chains that start at
    /// `prototype_map`, creating one if none exists or the previous one
    /// was invalidated.
    pub fn validity_cell_for(&self, prototype_map: Value) -> Value {
        let Some(key) = prototype_map.object_id() else {
            return Value::from_i64(0);
        };

        let mut cells = self.validity_cells.lock();
        if let Some(&cell) = cells.get(&key) {
            if self
                .get_as::<ValidityCell>(cell)
                .is_some_and(|c| c.is_valid())
            {
                return cell;
            }
        }

        let cell = self.allocate(ValidityCell::new());
        cells.insert(key, cell);
        log::debug!(
            "created validity cell {:?} for prototype #{}",
            cell,
            key.raw()
        );
        cell
    }

    /// Invalidates every validity cell whose chain passes through
    /// `prototype_map`. Returns how many cells flipped.
    pub fn invalidate_prototype_chain(&self, prototype_map: Value) -> usize {
        let cells = self.validity_cells.lock();
        let mut flipped = 0;
        for (&key, &cell) in cells.iter() {
            if !self.chain_contains(Value::from_id(key), prototype_map) {
                continue;
            }
            if let Some(cell) = self.get_as::<ValidityCell>(cell)
                && cell.invalidate()
            {
                flipped += 1;
            }
        }
        log::debug!(
            "invalidated {flipped} validity cell(s) through {prototype_map:?}"
        );
        flipped
    }

    fn chain_contains(&self, start: Value, target: Value) -> bool {
        let mut visited: Vec<Value> = Vec::new();
        let mut current = Some(start);
        while let Some(map_ref) = current {
            if map_ref.same_object(target) {
                return true;
            }
            if visited.iter().any(|seen| seen.same_object(map_ref)) {
                return false;
            }
            visited.push(map_ref);
            current = self.get_as::<Map>(map_ref).and_then(|m| m.prototype);
        }
        false
    }

    // ── Barrier ───────────────────────────────────────────────────────

    /// Records a strong reference stored into a feedback cell.
    ///
    /// Fixnums, weak words and sentinels are never recorded.
    #[inline(always)]
    pub fn write_barrier(&self, target: Value) {
        if !target.is_strong() || SpecialObjects::is_sentinel(target) {
            return;
        }
        self.record_remembered_set(target);
    }

    #[cold]
    fn record_remembered_set(&self, target: Value) {
        self.barrier_hits.fetch_add(1, Ordering::Relaxed);
        if let Some(id) = target.object_id() {
            self.remembered.lock().insert(id);
        }
    }

    pub fn barrier_hits(&self) -> usize {
        self.barrier_hits.load(Ordering::Relaxed)
    }

    pub fn is_remembered(&self, target: Value) -> bool {
        target
            .object_id()
            .is_some_and(|id| self.remembered.lock().contains(&id))
    }

    // ── Collection ────────────────────────────────────────────────────

    /// Drops every object in `dead` and then runs `hooks`.
    ///
    /// Sentinels survive every cycle.
    pub fn collect(
        &self,
        dead: &[Value],
        hooks: &[&dyn CycleHook],
    ) -> CollectionStats {
        let mut stats = CollectionStats::default();
        {
            let mut objects = self.objects.write();
            let mut remembered = self.remembered.lock();
            for value in dead {
                if SpecialObjects::is_sentinel(*value) {
                    log::warn!("refusing to reclaim sentinel {value:?}");
                    continue;
                }
                let Some(id) = value.object_id() else {
                    continue;
                };
                if let Some(entry) = objects.get_mut(id.index())
                    && entry.take().is_some()
                {
                    remembered.remove(&id);
                    stats.reclaimed += 1;
                }
            }
        }

        for hook in hooks {
            if hook.on_collection() {
                stats.hooks_changed += 1;
            }
        }

        log::debug!(
            "collection: reclaimed {} object(s), {} hook(s) changed",
            stats.reclaimed,
            stats.hooks_changed
        );
        stats
    }
}

// ── Heap (Arc wrapper) ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Heap(Arc<HeapInner>);

impl Heap {
    #[must_use]
    pub fn new(settings: HeapSettings) -> Self {
        Self(Arc::new(HeapInner::new(settings)))
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapSettings::default())
    }
}

impl Deref for Heap {
    type Target = HeapInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ShapeResolver for Heap {
    #[inline]
    fn resolve_map(&self, map: Value) -> Option<Arc<Map>> {
        self.get_as::<Map>(map)
    }
}
