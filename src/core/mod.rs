// Header data structures and encoding

mod types;
mod block;
mod hash;
pub mod codec;

pub use types::*;
pub use block::*;
pub use hash::*;
