//! Hierarchical filesystem capabilities.
//!
//! A capability grants access to one directory (or file) and nothing above it.
//! Reconstruction only ever walks down from the root it was given.

use async_trait::async_trait;
use std::io;
use thiserror::Error;

mod local;
mod mem;

pub use local::{LocalDir, LocalFile, LocalSink};
pub use mem::{MemoryDir, MemoryEvent, MemoryFile, MemoryFs, MemorySink};

/// An error a filesystem capability can return
#[derive(Debug, Error)]
pub enum CapabilityError {
	/// This capability refused the operation
	#[error("permission denied: `{0}`")]
	PermissionDenied(String),

	/// The underlying filesystem failed
	#[error("i/o error")]
	Io(#[from] io::Error),

	/// We tried to write to a sink that was already closed
	#[error("sink is closed")]
	Closed,
}

/// A directory we may create children in
#[async_trait]
pub trait DirCapability
where
	Self: Send + Sync + Sized,
{
	type File: FileCapability;

	//
	// MARK: Children
	//

	/// Create the sub-directory `name` if it doesn't exist, and return it.
	/// `name` is a single path component.
	async fn get_dir(&self, name: &str) -> Result<Self, CapabilityError>;

	/// Get a handle to the file `name` in this directory.
	/// The file doesn't need to exist yet.
	async fn get_file(&self, name: &str) -> Result<Self::File, CapabilityError>;
}

/// A file we may write to
#[async_trait]
pub trait FileCapability
where
	Self: Send + Sync,
{
	type Sink: WritableSink;

	/// Create (or truncate) this file and open it for writing
	async fn open_writable(&self) -> Result<Self::Sink, CapabilityError>;
}

/// An open, append-only writer
#[async_trait]
pub trait WritableSink
where
	Self: Send,
{
	/// Append `data` to this sink
	async fn write(&mut self, data: &[u8]) -> Result<(), CapabilityError>;

	/// Flush and close this sink.
	/// Closing twice is a no-op.
	async fn close(&mut self) -> Result<(), CapabilityError>;
}
