pub mod classification;
pub mod roc;

pub use classification::*;
pub use roc::*;
