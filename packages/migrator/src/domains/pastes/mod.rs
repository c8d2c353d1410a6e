//! Pastes domain - legacy 2.x rows and their 3.x counterparts

pub mod models;

pub use models::*;
