//! Where a named field lives.
//!
//! A [`FieldIndex`] can be built from an explicit offset, from a map
//! descriptor, from a packed field handler word, or from the integer the
//! optimizing compiler uses for load-by-field-index. All four views carry
//! the same offset, in-object flag and encoding.
//!
//! `Encoding::Word32` only exists for offsets built directly; handler
//! words and the compiler integer carry a single double bit, so neither
//! can express it.

use object::{
    Map, OBJECT_HEADER_SIZE, PROPERTY_ARRAY_HEADER_SIZE, Representation,
    TAGGED_SIZE,
};

use crate::bit_field::BitField64;
use crate::handler::{FieldIndexBits, IsDoubleBits, IsInobjectBits};

type OffsetBits = BitField64<0, 16>;
type IsInObjectBits = BitField64<{ OffsetBits::NEXT }, 1>;
type EncodingBits = BitField64<{ IsInObjectBits::NEXT }, 2>;
type InObjectPropertyBits = BitField64<{ EncodingBits::NEXT }, 10>;
type FirstInobjectPropertyOffsetBits =
    BitField64<{ InObjectPropertyBits::NEXT }, 7>;

const _: () = assert!(
    FieldIndexBits::MAX as u64 * TAGGED_SIZE as u64 <= OffsetBits::MAX,
    "field handler words address offsets FieldIndex cannot hold"
);

/// Machine representation of the stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Encoding {
    Tagged = 0,
    Double,
    Word32,
}

impl Encoding {
    pub fn for_representation(representation: Representation) -> Self {
        match representation {
            Representation::Double => Self::Double,
            Representation::None
            | Representation::Smi
            | Representation::HeapObject
            | Representation::Tagged => Self::Tagged,
        }
    }

    const fn from_u64(raw: u64) -> Self {
        match raw {
            0 => Self::Tagged,
            1 => Self::Double,
            _ => Self::Word32,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldIndex {
    bit_field: u64,
}

impl FieldIndex {
    fn new(
        is_inobject: bool,
        offset: u32,
        encoding: Encoding,
        inobject_properties: u32,
        first_inobject_property_offset: u32,
    ) -> Self {
        debug_assert!(
            first_inobject_property_offset % TAGGED_SIZE == 0,
            "unaligned first in-object offset {first_inobject_property_offset}"
        );
        Self {
            bit_field: OffsetBits::encode(offset as u64)
                | IsInObjectBits::encode_bool(is_inobject)
                | EncodingBits::encode(encoding as u64)
                | InObjectPropertyBits::encode(inobject_properties as u64)
                | FirstInobjectPropertyOffsetBits::encode(
                    first_inobject_property_offset as u64,
                ),
        }
    }

    /// In-object field at byte `offset`, without consulting a map.
    ///
    /// Panics when `offset` lies inside the object header.
    pub fn for_in_object_offset(offset: u32, encoding: Encoding) -> Self {
        assert!(
            offset >= OBJECT_HEADER_SIZE,
            "in-object offset {offset} overlaps the object header"
        );
        debug_assert!(
            encoding == Encoding::Word32 || offset % TAGGED_SIZE == 0,
            "unaligned field offset {offset}"
        );
        Self::new(true, offset, encoding, 0, 0)
    }

    /// Field with property index `property_index` on `map`.
    pub fn for_property_index(
        map: &Map,
        property_index: u32,
        representation: Representation,
    ) -> Self {
        let encoding = Encoding::for_representation(representation);
        let inobject_properties = map.inobject_properties();
        if property_index < inobject_properties {
            Self::new(
                true,
                map.inobject_property_offset(property_index),
                encoding,
                inobject_properties,
                map.inobject_property_offset(0),
            )
        } else {
            let outobject = property_index - inobject_properties;
            Self::new(
                false,
                PROPERTY_ARRAY_HEADER_SIZE + outobject * TAGGED_SIZE,
                encoding,
                inobject_properties,
                PROPERTY_ARRAY_HEADER_SIZE,
            )
        }
    }

    /// Field described by `map`'s descriptor number `descriptor`.
    ///
    /// Panics when the descriptor is not a field.
    pub fn for_descriptor(map: &Map, descriptor: usize) -> Self {
        let slot = map.slot(descriptor);
        assert!(slot.is_field(), "descriptor {descriptor} is not a field");
        Self::for_property_index(map, slot.index, slot.representation)
    }

    /// Field addressed by a packed field handler word (load or store).
    pub fn for_handler(word: u32) -> Self {
        let encoding = if IsDoubleBits::decode_bool(word) {
            Encoding::Double
        } else {
            Encoding::Tagged
        };
        Self::new(
            IsInobjectBits::decode_bool(word),
            FieldIndexBits::decode(word) * TAGGED_SIZE,
            encoding,
            0,
            0,
        )
    }

    /// Inverse of [`load_by_field_index`](Self::load_by_field_index).
    pub fn for_load_by_field_index(map: &Map, value: i32) -> Self {
        let encoding = if value & 1 != 0 {
            Encoding::Double
        } else {
            Encoding::Tagged
        };
        let field_index = value >> 1;
        if field_index < 0 {
            let outobject = (-(field_index + 1)) as u32;
            Self::new(
                false,
                PROPERTY_ARRAY_HEADER_SIZE + outobject * TAGGED_SIZE,
                encoding,
                map.inobject_properties(),
                PROPERTY_ARRAY_HEADER_SIZE,
            )
        } else {
            Self::new(
                true,
                OBJECT_HEADER_SIZE + field_index as u32 * TAGGED_SIZE,
                encoding,
                map.inobject_properties(),
                map.inobject_property_offset(0),
            )
        }
    }

    /// Compiler-facing index: in-object fields count up from 0 past the
    /// object header, out-of-object fields count down from -1; the low
    /// bit flags a double field.
    pub fn load_by_field_index(self) -> i32 {
        debug_assert!(
            self.encoding() != Encoding::Word32,
            "word32 fields have no compiler index"
        );
        debug_assert!(
            !self.is_inobject() || self.offset() >= OBJECT_HEADER_SIZE,
            "in-object offset {} overlaps the object header",
            self.offset()
        );
        let mut result = self.index() as i32;
        if self.is_inobject() {
            result -= (OBJECT_HEADER_SIZE / TAGGED_SIZE) as i32;
        } else {
            result -= (PROPERTY_ARRAY_HEADER_SIZE / TAGGED_SIZE) as i32;
            result = -result - 1;
        }
        (result << 1) | self.is_double() as i32
    }

    #[inline(always)]
    pub fn bit_field(self) -> u64 {
        self.bit_field
    }

    /// Byte offset inside the object (in-object) or the property array.
    #[inline(always)]
    pub fn offset(self) -> u32 {
        OffsetBits::decode(self.bit_field) as u32
    }

    /// Offset in tagged words.
    #[inline(always)]
    pub fn index(self) -> u32 {
        self.offset() / TAGGED_SIZE
    }

    #[inline(always)]
    pub fn is_inobject(self) -> bool {
        IsInObjectBits::decode_bool(self.bit_field)
    }

    #[inline(always)]
    pub fn encoding(self) -> Encoding {
        Encoding::from_u64(EncodingBits::decode(self.bit_field))
    }

    #[inline(always)]
    pub fn is_double(self) -> bool {
        self.encoding() == Encoding::Double
    }

    fn inobject_properties(self) -> u32 {
        InObjectPropertyBits::decode(self.bit_field) as u32
    }

    fn first_inobject_property_offset(self) -> u32 {
        FirstInobjectPropertyOffsetBits::decode(self.bit_field) as u32
    }

    /// Index in the map's property numbering: in-object properties first,
    /// then the out-of-object ones.
    pub fn property_index(self) -> u32 {
        let mut result =
            self.index() - self.first_inobject_property_offset() / TAGGED_SIZE;
        if !self.is_inobject() {
            result += self.inobject_properties();
        }
        result
    }

    pub fn outobject_array_index(self) -> u32 {
        debug_assert!(!self.is_inobject());
        self.property_index() - self.inobject_properties()
    }

    /// Key shared by every field access with the same location.
    pub fn field_access_key(self) -> u64 {
        self.bit_field
            & (IsInObjectBits::MASK | EncodingBits::MASK | OffsetBits::MASK)
    }
}

impl core::fmt::Debug for FieldIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldIndex")
            .field("offset", &self.offset())
            .field("is_inobject", &self.is_inobject())
            .field("encoding", &self.encoding())
            .finish()
    }
}
