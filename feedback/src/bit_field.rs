//! Named bit ranges inside packed words.
//!
//! Packed words are shared with generated code, so their layout is the
//! contract: every field is declared once as a `BitField` type alias and
//! all encoding goes through `encode`/`decode`/`update`.

macro_rules! bit_field {
    ($(#[$doc:meta])* $name:ident, $word:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<const SHIFT: u32, const SIZE: u32>;

        impl<const SHIFT: u32, const SIZE: u32> $name<SHIFT, SIZE> {
            const FITS: () = assert!(
                SIZE > 0 && SHIFT + SIZE <= <$word>::BITS,
                "bit field does not fit its word"
            );

            /// First bit past this field.
            pub const NEXT: u32 = SHIFT + SIZE;
            pub const MAX: $word = <$word>::MAX >> (<$word>::BITS - SIZE);
            pub const MASK: $word = Self::MAX << SHIFT;

            #[inline(always)]
            pub const fn is_valid(value: $word) -> bool {
                let () = Self::FITS;
                value <= Self::MAX
            }

            /// Panics when `value` does not fit the field.
            #[inline(always)]
            pub const fn encode(value: $word) -> $word {
                assert!(Self::is_valid(value), "value does not fit bit field");
                value << SHIFT
            }

            #[inline(always)]
            pub const fn decode(word: $word) -> $word {
                let () = Self::FITS;
                (word & Self::MASK) >> SHIFT
            }

            #[inline(always)]
            pub const fn update(word: $word, value: $word) -> $word {
                (word & !Self::MASK) | Self::encode(value)
            }

            #[inline(always)]
            pub const fn encode_bool(value: bool) -> $word {
                Self::encode(value as $word)
            }

            #[inline(always)]
            pub const fn decode_bool(word: $word) -> bool {
                Self::decode(word) != 0
            }
        }
    };
}

bit_field!(
    /// Bit range `SHIFT..SHIFT + SIZE` of a `u32` word.
    BitField,
    u32
);

bit_field!(
    /// Bit range `SHIFT..SHIFT + SIZE` of a `u64` word.
    BitField64,
    u64
);
