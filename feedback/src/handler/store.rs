use object::{ElementsKind, Representation};

use super::{
    FieldIndexBits, IsDoubleBits, IsInobjectBits, KIND_SPECIFIC_SHIFT,
    KindBits,
};
use crate::bit_field::BitField;
use crate::field_index::{Encoding, FieldIndex};

// Field stores extend the shared field section.
pub type RepresentationBits = BitField<{ FieldIndexBits::NEXT }, 3>;

// Element and slow stores.
pub type KeyedAccessStoreModeBits = BitField<KIND_SPECIFIC_SHIFT, 2>;
pub type IsJsArrayBits = BitField<{ KeyedAccessStoreModeBits::NEXT }, 1>;
pub type ElementsKindBits = BitField<{ IsJsArrayBits::NEXT }, 8>;

/// How a keyed store treats the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum KeyedAccessStoreMode {
    #[default]
    Standard = 0,
    /// Grow the store and copy it if it is copy-on-write.
    GrowAndHandleCow,
    IgnoreOutOfBounds,
    /// Copy a copy-on-write store before writing.
    HandleCow,
}

impl KeyedAccessStoreMode {
    pub const fn from_u32(raw: u32) -> Self {
        match raw & 0b11 {
            0 => Self::Standard,
            1 => Self::GrowAndHandleCow,
            2 => Self::IgnoreOutOfBounds,
            _ => Self::HandleCow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StoreHandlerKind {
    Element = 0,
    Field,
    ConstField,
    Accessor,
    NativeDataProperty,
    ApiSetter,
    GlobalProxy,
    Normal,
    Interceptor,
    Slow,
    Proxy,
}

impl StoreHandlerKind {
    pub const fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Element,
            1 => Self::Field,
            2 => Self::ConstField,
            3 => Self::Accessor,
            4 => Self::NativeDataProperty,
            5 => Self::ApiSetter,
            6 => Self::GlobalProxy,
            7 => Self::Normal,
            8 => Self::Interceptor,
            9 => Self::Slow,
            10 => Self::Proxy,
            _ => return None,
        })
    }
}

/// Store into a named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldStore {
    pub is_const: bool,
    pub is_inobject: bool,
    pub field_index: u32,
    pub representation: Representation,
}

impl FieldStore {
    pub fn from_field_index(
        index: FieldIndex,
        representation: Representation,
        is_const: bool,
    ) -> Self {
        debug_assert!(
            index.encoding() != Encoding::Word32,
            "word32 fields have no store handler"
        );
        Self {
            is_const,
            is_inobject: index.is_inobject(),
            field_index: index.index(),
            representation,
        }
    }
}

/// Store into an indexed elements store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementStore {
    pub elements_kind: ElementsKind,
    pub store_mode: KeyedAccessStoreMode,
    pub is_js_array: bool,
}

/// Decoded view of a packed store handler word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreHandler {
    Field(FieldStore),
    Element(ElementStore),
    Slow(KeyedAccessStoreMode),
    Other(StoreHandlerKind),
}

impl StoreHandler {
    pub fn kind(self) -> StoreHandlerKind {
        match self {
            Self::Field(field) if field.is_const => StoreHandlerKind::ConstField,
            Self::Field(_) => StoreHandlerKind::Field,
            Self::Element(_) => StoreHandlerKind::Element,
            Self::Slow(_) => StoreHandlerKind::Slow,
            Self::Other(kind) => kind,
        }
    }

    pub fn encode(self) -> u32 {
        let kind = KindBits::encode(self.kind() as u32);
        match self {
            Self::Field(field) => {
                kind | IsInobjectBits::encode_bool(field.is_inobject)
                    | IsDoubleBits::encode_bool(field.representation.is_double())
                    | FieldIndexBits::encode(field.field_index)
                    | RepresentationBits::encode(field.representation as u32)
            }
            Self::Element(element) => {
                kind | KeyedAccessStoreModeBits::encode(element.store_mode as u32)
                    | IsJsArrayBits::encode_bool(element.is_js_array)
                    | ElementsKindBits::encode(element.elements_kind as u32)
            }
            Self::Slow(mode) => kind | KeyedAccessStoreModeBits::encode(mode as u32),
            Self::Other(other) => {
                assert!(
                    !matches!(
                        other,
                        StoreHandlerKind::Field
                            | StoreHandlerKind::ConstField
                            | StoreHandlerKind::Element
                            | StoreHandlerKind::Slow
                    ),
                    "{other:?} handlers carry a payload"
                );
                kind
            }
        }
    }

    pub fn decode(word: u32) -> Option<Self> {
        let kind = StoreHandlerKind::from_u32(KindBits::decode(word))?;
        Some(match kind {
            StoreHandlerKind::Field | StoreHandlerKind::ConstField => {
                Self::Field(FieldStore {
                    is_const: kind == StoreHandlerKind::ConstField,
                    is_inobject: IsInobjectBits::decode_bool(word),
                    field_index: FieldIndexBits::decode(word),
                    representation: Representation::from_u32(
                        RepresentationBits::decode(word),
                    )?,
                })
            }
            StoreHandlerKind::Element => Self::Element(ElementStore {
                elements_kind: ElementsKind::from_u32(
                    ElementsKindBits::decode(word),
                )?,
                store_mode: KeyedAccessStoreMode::from_u32(
                    KeyedAccessStoreModeBits::decode(word),
                ),
                is_js_array: IsJsArrayBits::decode_bool(word),
            }),
            StoreHandlerKind::Slow => Self::Slow(KeyedAccessStoreMode::from_u32(
                KeyedAccessStoreModeBits::decode(word),
            )),
            other => Self::Other(other),
        })
    }

    /// Store mode carried by element and slow handlers.
    pub fn store_mode(self) -> Option<KeyedAccessStoreMode> {
        match self {
            Self::Element(element) => Some(element.store_mode),
            Self::Slow(mode) => Some(mode),
            _ => None,
        }
    }

    #[inline]
    pub fn slow() -> u32 {
        Self::Slow(KeyedAccessStoreMode::Standard).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_round_trip() {
        for &(is_const, representation) in &[
            (false, Representation::Smi),
            (true, Representation::Double),
            (false, Representation::HeapObject),
            (true, Representation::Tagged),
        ] {
            let handler = StoreHandler::Field(FieldStore {
                is_const,
                is_inobject: !is_const,
                field_index: 42,
                representation,
            });
            let word = handler.encode();
            assert_eq!(StoreHandler::decode(word), Some(handler));
            assert_eq!(IsDoubleBits::decode_bool(word), representation.is_double());
        }
    }

    #[test]
    fn element_round_trip_all_modes() {
        for mode in [
            KeyedAccessStoreMode::Standard,
            KeyedAccessStoreMode::GrowAndHandleCow,
            KeyedAccessStoreMode::IgnoreOutOfBounds,
            KeyedAccessStoreMode::HandleCow,
        ] {
            let handler = StoreHandler::Element(ElementStore {
                elements_kind: ElementsKind::Holey,
                store_mode: mode,
                is_js_array: true,
            });
            let decoded = StoreHandler::decode(handler.encode());
            assert_eq!(decoded, Some(handler));
            assert_eq!(decoded.and_then(StoreHandler::store_mode), Some(mode));
        }
    }

    #[test]
    fn slow_carries_store_mode() {
        let word = StoreHandler::Slow(KeyedAccessStoreMode::IgnoreOutOfBounds)
            .encode();
        assert_eq!(
            StoreHandler::decode(word).and_then(StoreHandler::store_mode),
            Some(KeyedAccessStoreMode::IgnoreOutOfBounds)
        );
        assert_eq!(
            StoreHandler::decode(StoreHandler::slow()),
            Some(StoreHandler::Slow(KeyedAccessStoreMode::Standard))
        );
    }

    #[test]
    fn invalid_words_do_not_decode() {
        assert_eq!(StoreHandler::decode(0xF), None);
        let bad_repr = KindBits::encode(StoreHandlerKind::Field as u32)
            | RepresentationBits::encode(7);
        assert_eq!(StoreHandler::decode(bad_repr), None);
    }
}
