pub mod error;
pub mod stats;
pub mod dataset;
pub mod synthetic;

pub use dataset::{Dataset, LabeledExample};
pub use error::{LearnError, LearnResult};
