//! Packed access handlers.
//!
//! A handler is either a fixnum holding one packed `u32` word, or a
//! [`DataHandler`] wrapping such a word together with a validity cell and
//! extra references. The packed layout is read directly by generated
//! code, so it only changes together with it.
//!
//! Bits shared by load and store handlers:
//! ```text
//! 0..4   kind
//! 4      lookup on the lookup start object (dictionary receiver)
//! 5      do access check on the lookup start object
//! 6..    kind specific
//! ```

mod data;
mod load;
mod store;

use heap::Heap;
use object::{DataHandler, ValidityCell, Value};

use crate::bit_field::BitField;

pub use data::{load_handler_for, load_handler_for_name, store_handler_for};
pub use load::{ElementLoad, FieldLoad, LoadHandler, LoadHandlerKind};
pub use store::{
    ElementStore, FieldStore, KeyedAccessStoreMode, StoreHandler,
    StoreHandlerKind,
};

pub type KindBits = BitField<0, 4>;
pub type LookupOnLookupStartObjectBits = BitField<{ KindBits::NEXT }, 1>;
pub type DoAccessCheckOnLookupStartObjectBits =
    BitField<{ LookupOnLookupStartObjectBits::NEXT }, 1>;

/// First bit available to kind specific fields.
pub const KIND_SPECIFIC_SHIFT: u32 = DoAccessCheckOnLookupStartObjectBits::NEXT;

// Field handlers (load and store) share this section.
pub type IsInobjectBits = BitField<KIND_SPECIFIC_SHIFT, 1>;
pub type IsDoubleBits = BitField<{ IsInobjectBits::NEXT }, 1>;
pub type FieldIndexBits = BitField<{ IsDoubleBits::NEXT }, 13>;

/// Wraps a packed word as a fixnum handler.
#[inline(always)]
pub fn word_to_value(word: u32) -> Value {
    Value::from_i64(word as i64)
}

/// The packed word of a fixnum or [`DataHandler`], `None` for anything
/// else.
pub fn handler_word(heap: &Heap, handler: Value) -> Option<u32> {
    let smi = if handler.is_fixnum() {
        handler
    } else {
        heap.get_as::<DataHandler>(handler)?.smi_handler
    };
    u32::try_from(smi.as_i64()?).ok()
}

#[inline]
pub fn is_valid_handler(heap: &Heap, handler: Value) -> bool {
    handler_word(heap, handler).is_some()
}

/// `false` once the validity cell guarding a [`DataHandler`] has been
/// invalidated. Fixnum handlers never go stale.
pub fn handler_is_current(heap: &Heap, handler: Value) -> bool {
    if handler.is_fixnum() {
        return true;
    }
    let Some(data) = heap.get_as::<DataHandler>(handler) else {
        return false;
    };
    if data.validity_cell.is_fixnum() {
        return true;
    }
    heap.get_as::<ValidityCell>(data.validity_cell)
        .is_some_and(|cell| cell.is_valid())
}

#[inline(always)]
pub fn lookup_on_lookup_start_object(word: u32) -> bool {
    LookupOnLookupStartObjectBits::decode_bool(word)
}

#[inline(always)]
pub fn do_access_check_on_lookup_start_object(word: u32) -> bool {
    DoAccessCheckOnLookupStartObjectBits::decode_bool(word)
}
