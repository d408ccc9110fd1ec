//! Mode-specific mechanics that need state of their own.

pub use blind::*;
pub use custom_board::*;
pub use memory::*;
pub use rounds::*;
pub use zen::*;

mod blind;
mod custom_board;
mod memory;
mod rounds;
mod zen;
