mod basic;
mod interface;
mod status;

pub use basic::*;
pub use interface::*;
pub use status::*;
