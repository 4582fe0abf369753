use crate::value::ObjectId;
use crate::Value;

/// Well-known singleton objects shared by every heap.
///
/// The sentinels live at fixed object ids, so they are plain constants:
/// comparing a feedback cell against one is a single word comparison and
/// no slot ever owns a private copy. The heap installs the backing
/// objects at construction and never reclaims them.
pub struct SpecialObjects;

impl SpecialObjects {
    /// Slot has never seen a value.
    pub const UNINITIALIZED: Value =
        Value::from_id(ObjectId::new(1));

    /// Slot has seen too many shapes to cache them individually.
    pub const MEGAMORPHIC: Value = Value::from_id(ObjectId::new(2));

    /// First id handed out to ordinary allocations.
    pub const FIRST_DYNAMIC_ID: u32 = 3;

    /// `(value, name)` of every sentinel, in id order.
    pub const SENTINELS: [(Value, &'static str); 2] = [
        (Self::UNINITIALIZED, "uninitialized"),
        (Self::MEGAMORPHIC, "megamorphic"),
    ];

    #[inline(always)]
    pub const fn is_sentinel(value: Value) -> bool {
        match value.object_id() {
            Some(id) => id.raw() != 0 && id.raw() < Self::FIRST_DYNAMIC_ID,
            None => false,
        }
    }
}
