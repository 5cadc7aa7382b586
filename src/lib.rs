#![cfg_attr(feature = "nightly", feature(test))]
#[cfg(feature = "nightly")]
extern crate test;

pub mod error;
pub mod map;
pub mod ops;
pub mod value;

pub use error::{Error, Result};
pub use map::sorted_map::SortedMap;
pub use ops::{ord_entry::OrdEntry, order::Direction};
pub use value::{Key, Opaque, Value};

#[allow(clippy::len_without_is_empty)]
pub trait Len {
    #[must_use]
    fn len(&self) -> usize;
}
pub trait LenExt: Len {
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
impl<T: Len> LenExt for T {}
