//! Interpretation and consensus engine for Consensus Core.
//!
//! This module contains the per-request pipeline:
//! - Response Normalizer: strips markdown artifacts from provider text
//! - Opt-out Detector: recognizes recusals and policy refusals
//! - Text Classifier: reads TRUE / FALSE / UNCERTAIN from the text
//! - Consensus Aggregator: reduces judgments to a verdict and confidence
//! - Consensus Coordinator: orchestrates all of the above
//! - Query Preprocessor: builds the prompt sent to providers

mod aggregator;
mod classifier;
mod coordinator;
mod normalizer;
mod opt_out;
mod prompt;

pub use aggregator::*;
pub use classifier::*;
pub use coordinator::*;
pub use normalizer::*;
pub use opt_out::*;
pub use prompt::*;
