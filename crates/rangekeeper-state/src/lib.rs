//! Local persistence for the one thing that must survive a restart: which
//! position (if any) the bot currently owns.

pub mod error;
pub mod store;

pub use error::{Result, StateError};
pub use store::StateStore;
