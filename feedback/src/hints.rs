//! Accumulated operand feedback for arithmetic, comparison and for-in
//! sites, plus the small enums the compiler reads back.
//!
//! Feedback values only ever gain bits: recording ORs the new
//! observation into the cell, so each value is the join of everything
//! seen so far. The hint enums are the named points of that lattice.

use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct BinaryOperationFeedback: u32 {
        const NONE = 0x0;
        const SIGNED_SMALL = 0x1;
        const SIGNED_SMALL_INPUTS = 0x3;
        const NUMBER = 0x7;
        const NUMBER_OR_ODDBALL = 0xF;
        const STRING = 0x10;
        const BIG_INT = 0x20;
        const ANY = 0x7F;
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct CompareOperationFeedback: u32 {
        const NONE = 0x000;
        const SIGNED_SMALL = 0x001;
        const NUMBER = 0x003;
        const NUMBER_OR_ODDBALL = 0x007;
        const INTERNALIZED_STRING = 0x008;
        const STRING = 0x018;
        const SYMBOL = 0x020;
        const BIG_INT = 0x040;
        const RECEIVER = 0x080;
        const RECEIVER_OR_NULL_OR_UNDEFINED = 0x180;
        const ANY = 0x1FF;
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ForInFeedback: u32 {
        const NONE = 0x0;
        const ENUM_CACHE_KEYS_AND_INDICES = 0x1;
        const ENUM_CACHE_KEYS = 0x3;
        const ANY = 0x7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperationHint {
    None,
    SignedSmall,
    SignedSmallInputs,
    Number,
    NumberOrOddball,
    String,
    BigInt,
    Any,
}

const BINARY_OPERATION_HINTS: [(BinaryOperationFeedback, BinaryOperationHint); 7] = [
    (BinaryOperationFeedback::NONE, BinaryOperationHint::None),
    (BinaryOperationFeedback::SIGNED_SMALL, BinaryOperationHint::SignedSmall),
    (
        BinaryOperationFeedback::SIGNED_SMALL_INPUTS,
        BinaryOperationHint::SignedSmallInputs,
    ),
    (BinaryOperationFeedback::NUMBER, BinaryOperationHint::Number),
    (
        BinaryOperationFeedback::NUMBER_OR_ODDBALL,
        BinaryOperationHint::NumberOrOddball,
    ),
    (BinaryOperationFeedback::STRING, BinaryOperationHint::String),
    (BinaryOperationFeedback::BIG_INT, BinaryOperationHint::BigInt),
];

impl From<BinaryOperationFeedback> for BinaryOperationHint {
    fn from(feedback: BinaryOperationFeedback) -> Self {
        lookup_hint(&BINARY_OPERATION_HINTS, feedback, Self::Any)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperationHint {
    None,
    SignedSmall,
    Number,
    NumberOrOddball,
    InternalizedString,
    String,
    Symbol,
    BigInt,
    Receiver,
    ReceiverOrNullOrUndefined,
    Any,
}

const COMPARE_OPERATION_HINTS: [(CompareOperationFeedback, CompareOperationHint); 10] = [
    (CompareOperationFeedback::NONE, CompareOperationHint::None),
    (CompareOperationFeedback::SIGNED_SMALL, CompareOperationHint::SignedSmall),
    (CompareOperationFeedback::NUMBER, CompareOperationHint::Number),
    (
        CompareOperationFeedback::NUMBER_OR_ODDBALL,
        CompareOperationHint::NumberOrOddball,
    ),
    (
        CompareOperationFeedback::INTERNALIZED_STRING,
        CompareOperationHint::InternalizedString,
    ),
    (CompareOperationFeedback::STRING, CompareOperationHint::String),
    (CompareOperationFeedback::SYMBOL, CompareOperationHint::Symbol),
    (CompareOperationFeedback::BIG_INT, CompareOperationHint::BigInt),
    (CompareOperationFeedback::RECEIVER, CompareOperationHint::Receiver),
    (
        CompareOperationFeedback::RECEIVER_OR_NULL_OR_UNDEFINED,
        CompareOperationHint::ReceiverOrNullOrUndefined,
    ),
];

impl From<CompareOperationFeedback> for CompareOperationHint {
    fn from(feedback: CompareOperationFeedback) -> Self {
        lookup_hint(&COMPARE_OPERATION_HINTS, feedback, Self::Any)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForInHint {
    None,
    EnumCacheKeysAndIndices,
    EnumCacheKeys,
    Any,
}

const FOR_IN_HINTS: [(ForInFeedback, ForInHint); 3] = [
    (ForInFeedback::NONE, ForInHint::None),
    (
        ForInFeedback::ENUM_CACHE_KEYS_AND_INDICES,
        ForInHint::EnumCacheKeysAndIndices,
    ),
    (ForInFeedback::ENUM_CACHE_KEYS, ForInHint::EnumCacheKeys),
];

impl From<ForInFeedback> for ForInHint {
    fn from(feedback: ForInFeedback) -> Self {
        lookup_hint(&FOR_IN_HINTS, feedback, Self::Any)
    }
}

/// Exact match against the named points; anything in between is `any`.
fn lookup_hint<F: PartialEq + Copy, H: Copy>(table: &[(F, H)], feedback: F, any: H) -> H {
    table
        .iter()
        .find(|(bits, _)| *bits == feedback)
        .map_or(any, |&(_, hint)| hint)
}

/// Whether a keyed access used a property name or an element index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IcCheckType {
    Element = 0,
    Property = 1,
}

impl IcCheckType {
    pub const fn from_i64(raw: i64) -> Self {
        if raw == Self::Property as i64 {
            Self::Property
        } else {
            Self::Element
        }
    }
}

/// Whether the compiler may speculate on a call site's feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SpeculationMode {
    #[default]
    AllowSpeculation = 0,
    DisallowSpeculation = 1,
}
