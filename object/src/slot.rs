use crate::Value;

/// Attributes of a property descriptor within a [`Map`](crate::Map).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SlotFlags(pub u16);

impl SlotFlags {
    pub const NONE: Self = Self(0);

    /// Property is stored in a field; `index` is its property index.
    pub const FIELD: Self = Self(1 << 0);

    /// Field value never changes after initialization.
    pub const CONST: Self = Self(1 << 1);

    pub const READ_ONLY: Self = Self(1 << 2);

    /// Slot is visible to enumeration.
    pub const ENUMERABLE: Self = Self(1 << 3);

    /// Property is backed by a getter/setter pair instead of a field.
    pub const ACCESSOR: Self = Self(1 << 4);

    #[inline(always)]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    #[inline(always)]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    #[inline(always)]
    pub const fn without(self, flag: Self) -> Self {
        Self(self.0 & !flag.0)
    }
}

/// Storage representation of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Representation {
    #[default]
    None = 0,
    Smi,
    Double,
    HeapObject,
    Tagged,
}

impl Representation {
    pub const COUNT: u32 = Self::Tagged as u32 + 1;

    #[inline(always)]
    pub const fn is_double(self) -> bool {
        matches!(self, Self::Double)
    }

    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Smi),
            2 => Some(Self::Double),
            3 => Some(Self::HeapObject),
            4 => Some(Self::Tagged),
            _ => None,
        }
    }
}

/// A property descriptor embedded in a [`Map`](crate::Map).
///
/// - `name`:  interned symbol identifying the property.
/// - `index`: property index for field slots; in-object properties come
///   first, the rest live in the out-of-object property array.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: Value,
    pub flags: SlotFlags,
    pub representation: Representation,
    pub index: u32,
}

impl Slot {
    #[inline(always)]
    pub fn field(name: Value, index: u32, representation: Representation) -> Self {
        Self {
            name,
            flags: SlotFlags::FIELD.with(SlotFlags::ENUMERABLE),
            representation,
            index,
        }
    }

    #[inline(always)]
    pub fn accessor(name: Value) -> Self {
        Self {
            name,
            flags: SlotFlags::ACCESSOR,
            representation: Representation::Tagged,
            index: 0,
        }
    }

    #[inline(always)]
    pub fn with_flags(mut self, flags: SlotFlags) -> Self {
        self.flags = self.flags.with(flags);
        self
    }

    #[inline(always)]
    pub fn is_field(&self) -> bool {
        self.flags.contains(SlotFlags::FIELD)
    }

    #[inline(always)]
    pub fn is_const(&self) -> bool {
        self.flags.contains(SlotFlags::CONST)
    }

    #[inline(always)]
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(SlotFlags::READ_ONLY)
    }

    #[inline(always)]
    pub fn is_accessor(&self) -> bool {
        self.flags.contains(SlotFlags::ACCESSOR)
    }
}

impl core::fmt::Debug for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("representation", &self.representation)
            .field("index", &self.index)
            .finish()
    }
}
