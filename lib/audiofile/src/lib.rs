#![warn(missing_docs)]

//! Read audio file metadata from lazily fetched byte streams.

pub mod common;
pub mod flac;
