use core::fmt;
use core::str::FromStr;

/// Strictness of the code owning a store site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageMode {
    #[default]
    Sloppy,
    Strict,
}

/// Whether a global load sits inside a `typeof` operand (where an
/// unresolvable name is not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeofMode {
    Inside,
    #[default]
    NotInside,
}

/// Kind of a feedback slot. Fixed for the lifetime of the metadata; it
/// determines the slot's width and its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FeedbackSlotKind {
    Call,
    LoadProperty,
    LoadGlobalNotInsideTypeof,
    LoadGlobalInsideTypeof,
    LoadKeyed,
    HasKeyed,
    StoreNamedSloppy,
    StoreNamedStrict,
    StoreOwnNamed,
    StoreGlobalSloppy,
    StoreGlobalStrict,
    StoreKeyedSloppy,
    StoreKeyedStrict,
    StoreInArrayLiteral,
    StoreDataPropertyInLiteral,
    BinaryOp,
    CompareOp,
    ForIn,
    InstanceOf,
    Literal,
    CloneObject,
    TypeProfile,
}

impl FeedbackSlotKind {
    pub const ALL: [Self; 22] = [
        Self::Call,
        Self::LoadProperty,
        Self::LoadGlobalNotInsideTypeof,
        Self::LoadGlobalInsideTypeof,
        Self::LoadKeyed,
        Self::HasKeyed,
        Self::StoreNamedSloppy,
        Self::StoreNamedStrict,
        Self::StoreOwnNamed,
        Self::StoreGlobalSloppy,
        Self::StoreGlobalStrict,
        Self::StoreKeyedSloppy,
        Self::StoreKeyedStrict,
        Self::StoreInArrayLiteral,
        Self::StoreDataPropertyInLiteral,
        Self::BinaryOp,
        Self::CompareOp,
        Self::ForIn,
        Self::InstanceOf,
        Self::Literal,
        Self::CloneObject,
        Self::TypeProfile,
    ];

    /// Number of cells the slot occupies.
    pub const fn slot_size(self) -> usize {
        match self {
            Self::BinaryOp
            | Self::CompareOp
            | Self::ForIn
            | Self::InstanceOf
            | Self::Literal
            | Self::TypeProfile => 1,
            _ => 2,
        }
    }

    pub const fn is_call(self) -> bool {
        matches!(self, Self::Call)
    }

    pub const fn is_load_ic(self) -> bool {
        matches!(self, Self::LoadProperty)
    }

    pub const fn is_load_global_ic(self) -> bool {
        matches!(
            self,
            Self::LoadGlobalNotInsideTypeof | Self::LoadGlobalInsideTypeof
        )
    }

    pub const fn is_keyed_load_ic(self) -> bool {
        matches!(self, Self::LoadKeyed)
    }

    pub const fn is_keyed_has_ic(self) -> bool {
        matches!(self, Self::HasKeyed)
    }

    pub const fn is_store_ic(self) -> bool {
        matches!(self, Self::StoreNamedSloppy | Self::StoreNamedStrict)
    }

    pub const fn is_store_own_ic(self) -> bool {
        matches!(self, Self::StoreOwnNamed)
    }

    pub const fn is_store_global_ic(self) -> bool {
        matches!(self, Self::StoreGlobalSloppy | Self::StoreGlobalStrict)
    }

    pub const fn is_keyed_store_ic(self) -> bool {
        matches!(self, Self::StoreKeyedSloppy | Self::StoreKeyedStrict)
    }

    pub const fn is_store_in_array_literal_ic(self) -> bool {
        matches!(self, Self::StoreInArrayLiteral)
    }

    pub const fn is_global_ic(self) -> bool {
        self.is_load_global_ic() || self.is_store_global_ic()
    }

    /// Kinds whose feedback is keyed by property name when monomorphic
    /// or polymorphic on a single name.
    pub const fn is_keyed(self) -> bool {
        self.is_keyed_load_ic()
            || self.is_keyed_has_ic()
            || self.is_keyed_store_ic()
            || self.is_store_in_array_literal_ic()
    }

    /// Map/handler-caching property access kinds.
    pub const fn is_property_ic(self) -> bool {
        self.is_load_ic()
            || self.is_keyed_load_ic()
            || self.is_keyed_has_ic()
            || self.is_store_ic()
            || self.is_store_own_ic()
            || self.is_keyed_store_ic()
            || self.is_store_in_array_literal_ic()
            || matches!(self, Self::StoreDataPropertyInLiteral)
    }

    pub const fn is_store_kind(self) -> bool {
        self.is_store_ic()
            || self.is_store_own_ic()
            || self.is_store_global_ic()
            || self.is_keyed_store_ic()
            || self.is_store_in_array_literal_ic()
            || matches!(self, Self::StoreDataPropertyInLiteral)
    }

    /// Hint and literal kinds keep their contents across collections.
    pub const fn survives_clear(self) -> bool {
        matches!(
            self,
            Self::BinaryOp
                | Self::CompareOp
                | Self::ForIn
                | Self::Literal
                | Self::TypeProfile
        )
    }

    pub const fn language_mode(self) -> LanguageMode {
        match self {
            Self::StoreNamedStrict
            | Self::StoreGlobalStrict
            | Self::StoreKeyedStrict => LanguageMode::Strict,
            _ => LanguageMode::Sloppy,
        }
    }

    pub const fn typeof_mode(self) -> TypeofMode {
        match self {
            Self::LoadGlobalInsideTypeof => TypeofMode::Inside,
            _ => TypeofMode::NotInside,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::LoadProperty => "LoadProperty",
            Self::LoadGlobalNotInsideTypeof => "LoadGlobalNotInsideTypeof",
            Self::LoadGlobalInsideTypeof => "LoadGlobalInsideTypeof",
            Self::LoadKeyed => "LoadKeyed",
            Self::HasKeyed => "HasKeyed",
            Self::StoreNamedSloppy => "StoreNamedSloppy",
            Self::StoreNamedStrict => "StoreNamedStrict",
            Self::StoreOwnNamed => "StoreOwnNamed",
            Self::StoreGlobalSloppy => "StoreGlobalSloppy",
            Self::StoreGlobalStrict => "StoreGlobalStrict",
            Self::StoreKeyedSloppy => "StoreKeyedSloppy",
            Self::StoreKeyedStrict => "StoreKeyedStrict",
            Self::StoreInArrayLiteral => "StoreInArrayLiteral",
            Self::StoreDataPropertyInLiteral => "StoreDataPropertyInLiteral",
            Self::BinaryOp => "BinaryOp",
            Self::CompareOp => "CompareOp",
            Self::ForIn => "ForIn",
            Self::InstanceOf => "InstanceOf",
            Self::Literal => "Literal",
            Self::CloneObject => "CloneObject",
            Self::TypeProfile => "TypeProfile",
        }
    }
}

impl fmt::Display for FeedbackSlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSlotKindError {
    pub input: String,
}

impl fmt::Display for ParseSlotKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown feedback slot kind '{}'", self.input)
    }
}

impl std::error::Error for ParseSlotKindError {}

impl FromStr for FeedbackSlotKind {
    type Err = ParseSlotKindError;

    /// Accepts the kind name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseSlotKindError {
                input: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        let one_wide = FeedbackSlotKind::ALL
            .into_iter()
            .filter(|kind| kind.slot_size() == 1)
            .count();
        assert_eq!(one_wide, 6);
        assert_eq!(FeedbackSlotKind::Call.slot_size(), 2);
        assert_eq!(FeedbackSlotKind::StoreGlobalStrict.slot_size(), 2);
        assert_eq!(FeedbackSlotKind::CloneObject.slot_size(), 2);
        assert_eq!(FeedbackSlotKind::InstanceOf.slot_size(), 1);
    }

    #[test]
    fn predicates_partition_ic_kinds() {
        for kind in FeedbackSlotKind::ALL {
            if kind.is_global_ic() {
                assert!(!kind.is_property_ic(), "{kind}");
            }
            if kind.is_keyed() {
                assert!(kind.is_property_ic(), "{kind}");
            }
        }
        assert!(FeedbackSlotKind::StoreKeyedStrict.is_store_kind());
        assert_eq!(
            FeedbackSlotKind::StoreKeyedStrict.language_mode(),
            LanguageMode::Strict
        );
        assert_eq!(
            FeedbackSlotKind::LoadGlobalInsideTypeof.typeof_mode(),
            TypeofMode::Inside
        );
    }

    #[test]
    fn parse_and_display() {
        for kind in FeedbackSlotKind::ALL {
            assert_eq!(kind.to_string().parse::<FeedbackSlotKind>(), Ok(kind));
        }
        assert_eq!(
            "loadkeyed".parse::<FeedbackSlotKind>(),
            Ok(FeedbackSlotKind::LoadKeyed)
        );
        let err = "Nope".parse::<FeedbackSlotKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown feedback slot kind 'Nope'");
    }
}
