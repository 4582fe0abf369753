mod value;
mod header;
mod slot;
mod map;
mod objects;
mod special;
mod lookup;

pub use value::{ObjectId, Value};
pub use header::ObjectType;
pub use slot::{Representation, Slot, SlotFlags};
pub use map::{
    ElementsKind, Map, MapFlags,
    MAX_INOBJECT_PROPERTIES, OBJECT_HEADER_SIZE, PROPERTY_ARRAY_HEADER_SIZE,
    TAGGED_SIZE,
};
pub use objects::{
    HeapCast, HeapObject,
    Sentinel, Symbol, WeakArray,
    DataHandler, ValidityCell, PropertyCell,
    Function, AllocationSite, TypeProfile,
};
pub use special::SpecialObjects;
pub use lookup::{
    ChainChecks, LookupResult, ShapeResolver, lookup, prototype_chain_checks,
};
