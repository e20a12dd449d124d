//! Shared utilities used throughout the workspace

mod env;
pub use env::*;

mod mime;
pub use mime::*;

pub mod cursor;
pub mod logging;
pub mod source;
pub mod stream;
