mod heap;
mod weak;

pub use heap::*;
pub use weak::WeakRef;
