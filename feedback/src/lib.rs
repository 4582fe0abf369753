//! Adaptive type feedback for an interpreter and its optimizing compiler.
//!
//! Each function owns a [`FeedbackMetadata`] describing its monitored
//! instructions; each closure owns a [`FeedbackVector`] holding what those
//! instructions have observed. A [`FeedbackNexus`] is the kind-aware view
//! of one slot: the interpreter drives its state machine on cache misses,
//! the compiler reads it through the [`Background`] strategy.

pub mod access;
pub mod bit_field;
pub mod field_index;
pub mod handler;
pub mod hints;
pub mod metadata;
pub mod nexus;
pub mod settings;
pub mod slot_kind;
pub mod vector;

pub use access::{Background, MainThread, NexusConfig, NoAllocation};
pub use bit_field::{BitField, BitField64};
pub use field_index::{Encoding, FieldIndex};
pub use hints::{
    BinaryOperationFeedback, BinaryOperationHint, CompareOperationFeedback,
    CompareOperationHint, ForInFeedback, ForInHint, IcCheckType,
    SpeculationMode,
};
pub use metadata::{FeedbackMetadata, FeedbackSlot, FeedbackVectorSpec};
pub use nexus::{FeedbackNexus, InlineCacheState};
pub use settings::FeedbackSettings;
pub use slot_kind::{FeedbackSlotKind, LanguageMode, ParseSlotKindError, TypeofMode};
pub use vector::{FeedbackVector, OptimizationMarker};
