use object::ElementsKind;

use super::{
    FieldIndexBits, IsDoubleBits, IsInobjectBits, KIND_SPECIFIC_SHIFT,
    KindBits,
};
use crate::bit_field::BitField;
use crate::field_index::{Encoding, FieldIndex};

// Element loads.
pub type AllowOutOfBoundsBits = BitField<KIND_SPECIFIC_SHIFT, 1>;
pub type IsJsArrayBits = BitField<{ AllowOutOfBoundsBits::NEXT }, 1>;
pub type ConvertHoleBits = BitField<{ IsJsArrayBits::NEXT }, 1>;
pub type ElementsKindBits = BitField<{ ConvertHoleBits::NEXT }, 8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoadHandlerKind {
    Element = 0,
    IndexedString,
    Normal,
    Global,
    Field,
    Constant,
    Accessor,
    NativeDataProperty,
    ApiGetter,
    Interceptor,
    Slow,
    Proxy,
    NonExistent,
    ModuleExport,
}

impl LoadHandlerKind {
    pub const fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Element,
            1 => Self::IndexedString,
            2 => Self::Normal,
            3 => Self::Global,
            4 => Self::Field,
            5 => Self::Constant,
            6 => Self::Accessor,
            7 => Self::NativeDataProperty,
            8 => Self::ApiGetter,
            9 => Self::Interceptor,
            10 => Self::Slow,
            11 => Self::Proxy,
            12 => Self::NonExistent,
            13 => Self::ModuleExport,
            _ => return None,
        })
    }
}

/// Load from a named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLoad {
    pub is_inobject: bool,
    pub is_double: bool,
    /// Field offset in tagged words, see [`FieldIndex::index`].
    pub field_index: u32,
}

impl FieldLoad {
    pub fn from_field_index(index: FieldIndex) -> Self {
        debug_assert!(
            index.encoding() != Encoding::Word32,
            "word32 fields have no load handler"
        );
        Self {
            is_inobject: index.is_inobject(),
            is_double: index.is_double(),
            field_index: index.index(),
        }
    }
}

/// Load from an indexed elements store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLoad {
    pub elements_kind: ElementsKind,
    pub allow_out_of_bounds: bool,
    pub is_js_array: bool,
    pub convert_hole_to_undefined: bool,
}

/// Decoded view of a packed load handler word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadHandler {
    Field(FieldLoad),
    Element(ElementLoad),
    /// Kinds without a payload of their own.
    Other(LoadHandlerKind),
}

impl LoadHandler {
    pub fn kind(self) -> LoadHandlerKind {
        match self {
            Self::Field(_) => LoadHandlerKind::Field,
            Self::Element(_) => LoadHandlerKind::Element,
            Self::Other(kind) => kind,
        }
    }

    /// Packs the handler. Panics when a field offset or elements kind
    /// does not fit its bit range.
    pub fn encode(self) -> u32 {
        match self {
            Self::Field(field) => {
                KindBits::encode(LoadHandlerKind::Field as u32)
                    | IsInobjectBits::encode_bool(field.is_inobject)
                    | IsDoubleBits::encode_bool(field.is_double)
                    | FieldIndexBits::encode(field.field_index)
            }
            Self::Element(element) => {
                KindBits::encode(LoadHandlerKind::Element as u32)
                    | AllowOutOfBoundsBits::encode_bool(
                        element.allow_out_of_bounds,
                    )
                    | IsJsArrayBits::encode_bool(element.is_js_array)
                    | ConvertHoleBits::encode_bool(
                        element.convert_hole_to_undefined,
                    )
                    | ElementsKindBits::encode(element.elements_kind as u32)
            }
            Self::Other(kind) => {
                assert!(
                    !matches!(
                        kind,
                        LoadHandlerKind::Field | LoadHandlerKind::Element
                    ),
                    "{kind:?} handlers carry a payload"
                );
                KindBits::encode(kind as u32)
            }
        }
    }

    /// Inverse of [`encode`](Self::encode). `None` for words that no load
    /// handler encodes to.
    pub fn decode(word: u32) -> Option<Self> {
        let kind = LoadHandlerKind::from_u32(KindBits::decode(word))?;
        Some(match kind {
            LoadHandlerKind::Field => Self::Field(FieldLoad {
                is_inobject: IsInobjectBits::decode_bool(word),
                is_double: IsDoubleBits::decode_bool(word),
                field_index: FieldIndexBits::decode(word),
            }),
            LoadHandlerKind::Element => Self::Element(ElementLoad {
                elements_kind: ElementsKind::from_u32(
                    ElementsKindBits::decode(word),
                )?,
                allow_out_of_bounds: AllowOutOfBoundsBits::decode_bool(word),
                is_js_array: IsJsArrayBits::decode_bool(word),
                convert_hole_to_undefined: ConvertHoleBits::decode_bool(word),
            }),
            other => Self::Other(other),
        })
    }

    #[inline]
    pub fn field(index: FieldIndex) -> u32 {
        Self::Field(FieldLoad::from_field_index(index)).encode()
    }

    #[inline]
    pub fn slow() -> u32 {
        Self::Other(LoadHandlerKind::Slow).encode()
    }
}
