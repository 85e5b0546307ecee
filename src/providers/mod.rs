//! Provider query layer.
//!
//! - Descriptors: data-driven table of provider endpoints and payload shapes
//! - Registry: descriptors plus API keys and the current model catalog
//! - Client: one generic query function over any descriptor
//! - Discovery: model listing, catalog refresh and credit checks

mod client;
mod descriptor;
mod discovery;
mod registry;

pub use client::*;
pub use descriptor::*;
pub use discovery::*;
pub use registry::*;
