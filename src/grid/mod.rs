pub mod cell;
pub mod store;

pub use cell::{Cell, CellKey};
pub use store::GridStore;
