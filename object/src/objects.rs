use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::header::ObjectType;
use crate::map::Map;
use crate::Value;

/// A distinguished marker object ("uninitialized", "megamorphic").
#[derive(Debug)]
pub struct Sentinel {
    pub name: &'static str,
}

/// An interned property name.
#[derive(Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: Box<str>,
}

/// Fixed-length array whose entries may be weak references.
///
/// Arrays installed into feedback are never mutated afterwards; every
/// change allocates a fresh array.
#[derive(Debug)]
pub struct WeakArray {
    entries: Box<[Value]>,
}

impl WeakArray {
    pub fn new(entries: impl Into<Box<[Value]>>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Value {
        self.entries[index]
    }

    #[inline(always)]
    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// Iterates `(entries[2i], entries[2i + 1])` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.entries.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Structured handler used when an access has to check the prototype
/// chain or carry extra references.
///
/// `validity_cell` is a strong reference to a [`ValidityCell`] or fixnum 0
/// when no chain check is needed. `data` holds 1 to 3 weak or strong
/// references (holder map, receiver map, accessor...).
#[derive(Debug)]
pub struct DataHandler {
    pub smi_handler: Value,
    pub validity_cell: Value,
    data: Box<[Value]>,
}

impl DataHandler {
    pub const MAX_DATA: usize = 3;

    pub fn new(
        smi_handler: Value,
        validity_cell: Value,
        data: impl Into<Box<[Value]>>,
    ) -> Self {
        let data = data.into();
        assert!(smi_handler.is_fixnum(), "data handler needs a packed word");
        assert!(
            (1..=Self::MAX_DATA).contains(&data.len()),
            "data handler carries 1..=3 data words, got {}",
            data.len()
        );
        Self {
            smi_handler,
            validity_cell,
            data,
        }
    }

    #[inline(always)]
    pub fn data(&self) -> &[Value] {
        &self.data
    }

    #[inline(always)]
    pub fn data_count(&self) -> usize {
        self.data.len()
    }
}

/// Shared invalidation token for one prototype chain configuration.
#[derive(Debug)]
pub struct ValidityCell {
    valid: AtomicBool,
}

impl ValidityCell {
    pub fn new() -> Self {
        Self {
            valid: AtomicBool::new(true),
        }
    }

    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Returns `true` if this call flipped the cell.
    pub fn invalidate(&self) -> bool {
        self.valid.swap(false, Ordering::AcqRel)
    }
}

impl Default for ValidityCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Backing cell of a global property.
#[derive(Debug)]
pub struct PropertyCell {
    pub name: Value,
}

/// A callable; used as call target and instanceof constructor.
#[derive(Debug)]
pub struct Function {
    pub name: Value,
}

/// Per-site bookkeeping for object and array literals.
#[derive(Debug)]
pub struct AllocationSite {
    pub boilerplate: Value,
}

/// Observed type names per source position.
///
/// Immutable once allocated; recording a new type builds a new profile.
#[derive(Debug, Default, Clone)]
pub struct TypeProfile {
    pub entries: BTreeMap<i32, Vec<Value>>,
}

impl TypeProfile {
    /// Copy of `self` with `type_name` recorded at `position`, or `None`
    /// when it is already present.
    pub fn with_type(&self, position: i32, type_name: Value) -> Option<Self> {
        let types = self.entries.get(&position);
        if types.is_some_and(|types| types.contains(&type_name)) {
            return None;
        }
        let mut next = self.clone();
        next.entries.entry(position).or_default().push(type_name);
        Some(next)
    }
}

/// Typed access to [`HeapObject`] payloads.
pub trait HeapCast: Sized {
    const TYPE: ObjectType;

    fn cast(object: &HeapObject) -> Option<&Arc<Self>>;

    fn into_object(self) -> HeapObject;
}

macro_rules! heap_objects {
    ($($variant:ident),* $(,)?) => {
        /// Entry of the heap's object table.
        #[derive(Debug, Clone)]
        pub enum HeapObject {
            $($variant(Arc<$variant>),)*
        }

        impl HeapObject {
            pub fn object_type(&self) -> ObjectType {
                match self {
                    $(Self::$variant(_) => ObjectType::$variant,)*
                }
            }
        }

        $(
            impl HeapCast for $variant {
                const TYPE: ObjectType = ObjectType::$variant;

                #[inline(always)]
                fn cast(object: &HeapObject) -> Option<&Arc<Self>> {
                    match object {
                        HeapObject::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn into_object(self) -> HeapObject {
                    HeapObject::$variant(Arc::new(self))
                }
            }
        )*
    };
}

heap_objects!(
    Sentinel,
    Map,
    Symbol,
    WeakArray,
    DataHandler,
    ValidityCell,
    PropertyCell,
    Function,
    AllocationSite,
    TypeProfile,
);
