//! Tar size accounting and streaming tar reconstruction.
//!
//! [`size::tar_size`] computes the exact length of the archive that
//! stores an [`entry::DirEntry`] tree. [`reconstruct::TarReconstructor`]
//! goes the other way, replaying an incoming archive onto a
//! [`fs::DirCapability`] without ever holding a whole file in memory.

pub mod entry;
pub mod fs;
pub mod parser;
pub mod reconstruct;
pub mod size;
