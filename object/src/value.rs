/// Tag constants.
const FIXNUM_MASK: u64 = 0b1;
const TAG_MASK: u64 = 0b11;
const STRONG_TAG: u64 = 0b01;
const WEAK_TAG: u64 = 0b11;
const ID_SHIFT: u32 = 2;

/// Index of an object in the heap's object table.
///
/// Id 0 is never handed out: a weak word carrying id 0 is the cleared
/// tombstone [`Value::CLEARED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectId(u32);

impl ObjectId {
    #[inline(always)]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A tagged 64-bit word, the unit stored in every feedback cell.
///
/// Encoding:
/// - **Fixnum**:  `...XXXXX0`: 63-bit signed integer (low bit 0).
/// - **Strong**:  `...XXXX01`: object id in the upper bits.
/// - **Weak**:    `...XXXX11`: object id in the upper bits; the target may
///   be reclaimed at any time, so liveness is checked on every use.
/// - **Cleared**: `0b11`: weak word whose target is gone.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Value(u64);

impl Value {
    /// Canonical tombstone left behind by a reclaimed weak target.
    pub const CLEARED: Value = Value(WEAK_TAG);

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    // ── Fixnum ─────────────────────────────────────────────────────

    #[inline(always)]
    pub const fn is_fixnum(self) -> bool {
        self.0 & FIXNUM_MASK == 0
    }

    #[inline(always)]
    pub fn from_i64(n: i64) -> Self {
        debug_assert!(
            (-(1i64 << 62)..(1i64 << 62)).contains(&n),
            "fixnum overflow: {n}"
        );
        Self((n << 1) as u64)
    }

    /// Decodes a fixnum. Meaningless (but harmless) for other words.
    #[inline(always)]
    pub const fn to_i64(self) -> i64 {
        debug_assert!(self.is_fixnum());
        (self.0 as i64) >> 1
    }

    #[inline(always)]
    pub const fn as_i64(self) -> Option<i64> {
        if self.is_fixnum() {
            Some((self.0 as i64) >> 1)
        } else {
            None
        }
    }

    // ── References ─────────────────────────────────────────────────

    #[inline(always)]
    pub const fn from_id(id: ObjectId) -> Self {
        Self(((id.0 as u64) << ID_SHIFT) | STRONG_TAG)
    }

    #[inline(always)]
    pub const fn weak_from_id(id: ObjectId) -> Self {
        Self(((id.0 as u64) << ID_SHIFT) | WEAK_TAG)
    }

    /// Strong or weak (including cleared) reference.
    #[inline(always)]
    pub const fn is_ref(self) -> bool {
        self.0 & FIXNUM_MASK == 1
    }

    #[inline(always)]
    pub const fn is_strong(self) -> bool {
        self.0 & TAG_MASK == STRONG_TAG
    }

    /// Weak reference, cleared or not.
    #[inline(always)]
    pub const fn is_weak(self) -> bool {
        self.0 & TAG_MASK == WEAK_TAG
    }

    #[inline(always)]
    pub const fn is_cleared(self) -> bool {
        self.0 == Self::CLEARED.0
    }

    /// The referenced object's id, `None` for fixnums and cleared words.
    #[inline(always)]
    pub const fn object_id(self) -> Option<ObjectId> {
        if self.is_ref() && !self.is_cleared() {
            Some(ObjectId((self.0 >> ID_SHIFT) as u32))
        } else {
            None
        }
    }

    /// Weak view of a strong reference. Weak words pass through unchanged.
    #[inline(always)]
    pub const fn to_weak(self) -> Self {
        debug_assert!(self.is_ref());
        Self(self.0 | WEAK_TAG)
    }

    /// Strong view of a weak reference. The caller must have checked
    /// liveness first.
    #[inline(always)]
    pub const fn to_strong(self) -> Self {
        debug_assert!(self.is_ref() && !self.is_cleared());
        Self((self.0 & !TAG_MASK) | STRONG_TAG)
    }

    /// Identity comparison that ignores weak/strong tagging.
    #[inline(always)]
    pub const fn same_object(self, other: Value) -> bool {
        self.is_ref()
            && other.is_ref()
            && !self.is_cleared()
            && (self.0 >> ID_SHIFT) == (other.0 >> ID_SHIFT)
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_fixnum() {
            write!(f, "Fixnum({})", self.to_i64())
        } else if self.is_cleared() {
            write!(f, "Cleared")
        } else if self.is_weak() {
            write!(f, "Weak(#{})", self.0 >> ID_SHIFT)
        } else {
            write!(f, "Ref(#{})", self.0 >> ID_SHIFT)
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Self::from_id(id)
    }
}
