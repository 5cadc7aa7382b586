pub mod ord_entry;
pub mod order;
pub mod slice;
