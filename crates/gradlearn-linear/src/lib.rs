pub mod model;
pub mod descent;
pub mod perceptron;

pub use model::*;
pub use descent::*;
pub use perceptron::*;
