mod catalog;
mod connection;
mod introspection;
mod memory;

pub use catalog::*;
pub use connection::*;
pub use introspection::*;
pub use memory::*;
