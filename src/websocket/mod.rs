pub mod dispatcher;
pub mod handler;

pub use dispatcher::{Binding, Connection, Dispatcher};
