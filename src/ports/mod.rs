//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the pretrained model artifacts.

mod classifier;
mod explainer;

pub use classifier::{Classifier, ModelError};
pub use explainer::Explainer;
