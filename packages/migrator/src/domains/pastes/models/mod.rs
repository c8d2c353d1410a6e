pub mod legacy_paste;
pub mod paste;

pub use legacy_paste::*;
pub use paste::*;
