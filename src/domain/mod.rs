//! Domain types for Consensus Core.
//!
//! This module contains the judgment vocabulary, provider responses and the
//! consensus result, plus the model catalog used by the provider layer.

mod catalog;
mod consensus;
mod judgment;
mod response;

pub use catalog::*;
pub use consensus::*;
pub use judgment::*;
pub use response::*;
