pub mod loader;
pub mod formats;
pub mod roc_io;

pub use loader::*;
pub use formats::*;
pub use roc_io::*;
