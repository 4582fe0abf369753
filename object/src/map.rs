use crate::slot::Slot;
use crate::Value;

/// Size of a tagged word in bytes.
pub const TAGGED_SIZE: u32 = 8;

/// Receiver header: `[map word 8B] [property array word 8B]`.
/// In-object fields start right after it.
pub const OBJECT_HEADER_SIZE: u32 = 16;

/// Out-of-object property array header: `[map word 8B] [length 8B]`.
pub const PROPERTY_ARRAY_HEADER_SIZE: u32 = 16;

/// Largest in-object property count a map may declare.
pub const MAX_INOBJECT_PROPERTIES: u32 = (1 << 10) - 1;

/// Representation of a receiver's indexed elements backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ElementsKind {
    #[default]
    PackedSmi = 0,
    HoleySmi,
    Packed,
    Holey,
    PackedDouble,
    HoleyDouble,
    PackedFrozen,
    PackedSealed,
    Dictionary,
    FastStringWrapper,
    SlowStringWrapper,
    TypedArray,
}

impl ElementsKind {
    pub const COUNT: u32 = Self::TypedArray as u32 + 1;

    pub const fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::PackedSmi,
            1 => Self::HoleySmi,
            2 => Self::Packed,
            3 => Self::Holey,
            4 => Self::PackedDouble,
            5 => Self::HoleyDouble,
            6 => Self::PackedFrozen,
            7 => Self::PackedSealed,
            8 => Self::Dictionary,
            9 => Self::FastStringWrapper,
            10 => Self::SlowStringWrapper,
            11 => Self::TypedArray,
            _ => return None,
        })
    }

    #[inline(always)]
    pub const fn is_holey(self) -> bool {
        matches!(self, Self::HoleySmi | Self::Holey | Self::HoleyDouble)
    }

    #[inline(always)]
    pub const fn is_double(self) -> bool {
        matches!(self, Self::PackedDouble | Self::HoleyDouble)
    }
}

/// Map-level flags consulted by handler construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct MapFlags(pub u64);

impl MapFlags {
    pub const NONE: Self = Self(0);
    /// Properties live in a hash table; field handlers cannot be used.
    pub const DICTIONARY: Self = Self(1 << 0);
    /// Accesses must go through a security check first.
    pub const ACCESS_CHECK_NEEDED: Self = Self(1 << 1);
    /// Map of a wrapper for a primitive receiver (number, string, ...).
    pub const PRIMITIVE_WRAPPER: Self = Self(1 << 2);
    /// Map of an object used as some other object's prototype.
    pub const PROTOTYPE_MAP: Self = Self(1 << 3);
    /// Superseded by a newer map; cached feedback for it is stale.
    pub const DEPRECATED: Self = Self(1 << 4);
    /// Receiver is an array with a length-tracking elements store.
    pub const JS_ARRAY: Self = Self(1 << 5);

    #[inline(always)]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    #[inline(always)]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }
}

/// A hidden map (shape descriptor).
///
/// Describes the layout of every receiver that carries it:
/// ```text
/// [map 8B] [properties 8B] [in-object field 0] ... [in-object field N-1]
///                 │
///                 └──> [map 8B] [length 8B] [out-of-object field 0] ...
/// ```
///
/// `prototype` is a strong reference to the map of the receiver's
/// prototype object, or `None` at the end of the chain.
#[derive(Debug, Clone)]
pub struct Map {
    pub flags: MapFlags,
    pub elements_kind: ElementsKind,
    pub prototype: Option<Value>,
    inobject_properties: u32,
    instance_size: u32,
    slots: Box<[Slot]>,
}

impl Map {
    pub fn new(inobject_properties: u32) -> Self {
        assert!(
            inobject_properties <= MAX_INOBJECT_PROPERTIES,
            "too many in-object properties: {inobject_properties}"
        );
        Self {
            flags: MapFlags::NONE,
            elements_kind: ElementsKind::default(),
            prototype: None,
            inobject_properties,
            instance_size: OBJECT_HEADER_SIZE
                + inobject_properties * TAGGED_SIZE,
            slots: Box::new([]),
        }
    }

    pub fn with_flags(mut self, flags: MapFlags) -> Self {
        self.flags = self.flags.with(flags);
        self
    }

    pub fn with_elements_kind(mut self, kind: ElementsKind) -> Self {
        self.elements_kind = kind;
        self
    }

    pub fn with_prototype(mut self, prototype: Value) -> Self {
        debug_assert!(prototype.is_strong());
        self.prototype = Some(prototype);
        self
    }

    pub fn with_slots(mut self, slots: impl Into<Box<[Slot]>>) -> Self {
        self.slots = slots.into();
        self
    }

    #[inline(always)]
    pub fn inobject_properties(&self) -> u32 {
        self.inobject_properties
    }

    #[inline(always)]
    pub fn instance_size(&self) -> u32 {
        self.instance_size
    }

    /// Byte offset of the in-object property with the given index.
    #[inline(always)]
    pub fn inobject_property_offset(&self, index: u32) -> u32 {
        self.instance_size - (self.inobject_properties - index) * TAGGED_SIZE
    }

    #[inline(always)]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline(always)]
    pub fn slot(&self, descriptor: usize) -> &Slot {
        &self.slots[descriptor]
    }

    /// Linear search for the descriptor named `name`.
    pub fn find_slot(&self, name: Value) -> Option<(usize, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.name == name)
    }

    #[inline(always)]
    pub fn is_dictionary_map(&self) -> bool {
        self.flags.contains(MapFlags::DICTIONARY)
    }

    #[inline(always)]
    pub fn is_access_check_needed(&self) -> bool {
        self.flags.contains(MapFlags::ACCESS_CHECK_NEEDED)
    }

    #[inline(always)]
    pub fn is_primitive_map(&self) -> bool {
        self.flags.contains(MapFlags::PRIMITIVE_WRAPPER)
    }

    #[inline(always)]
    pub fn is_prototype_map(&self) -> bool {
        self.flags.contains(MapFlags::PROTOTYPE_MAP)
    }

    #[inline(always)]
    pub fn is_deprecated(&self) -> bool {
        self.flags.contains(MapFlags::DEPRECATED)
    }

    #[inline(always)]
    pub fn is_js_array_map(&self) -> bool {
        self.flags.contains(MapFlags::JS_ARRAY)
    }
}
