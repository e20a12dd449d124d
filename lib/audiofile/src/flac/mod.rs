//! Parse FLAC metadata.

pub mod blockread;
pub mod blocks;
pub mod decode;
pub mod errors;
