//! Adapters layer: Concrete implementations of ports.
//!
//! - `model`: JSON model artifact implementing `Classifier`
//! - `shapley`: Shapley-value `Explainer`
//! - `dataset`: CSV loader for labeled held-out data
//! - `sanitize`: Filtering of respondent data in logs

pub mod dataset;
pub mod model;
pub mod sanitize;
pub mod shapley;

pub use dataset::LabeledDataset;
pub use model::LoadedModel;
pub use shapley::ShapleyExplainer;
