use async_trait::async_trait;
use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
};
use tokio::{
	fs::{self, File},
	io::AsyncWriteExt,
};
use tracing::trace;

use super::{CapabilityError, DirCapability, FileCapability, WritableSink};

/// A directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalDir {
	path: PathBuf,
}

impl LocalDir {
	/// Make a capability for `path`, which should already exist.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Resolve `name` inside this directory.
	/// Anything that could escape it is refused.
	fn child(&self, name: &str) -> Result<PathBuf, CapabilityError> {
		if name.is_empty()
			|| name == "."
			|| name == ".."
			|| name.contains('/')
			|| name.contains('\\')
		{
			return Err(CapabilityError::PermissionDenied(name.to_owned()));
		}

		return Ok(self.path.join(name));
	}
}

/// Map an io error, keeping permission errors distinct
fn io_error(err: std::io::Error, path: &Path) -> CapabilityError {
	match err.kind() {
		ErrorKind::PermissionDenied => {
			CapabilityError::PermissionDenied(path.to_string_lossy().into_owned())
		}
		_ => CapabilityError::Io(err),
	}
}

#[async_trait]
impl DirCapability for LocalDir {
	type File = LocalFile;

	async fn get_dir(&self, name: &str) -> Result<Self, CapabilityError> {
		let path = self.child(name)?;
		trace!(message = "Creating directory", path = %path.display());
		fs::create_dir_all(&path)
			.await
			.map_err(|e| io_error(e, &path))?;
		return Ok(Self { path });
	}

	async fn get_file(&self, name: &str) -> Result<LocalFile, CapabilityError> {
		return Ok(LocalFile {
			path: self.child(name)?,
		});
	}
}

/// A file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFile {
	path: PathBuf,
}

#[async_trait]
impl FileCapability for LocalFile {
	type Sink = LocalSink;

	async fn open_writable(&self) -> Result<LocalSink, CapabilityError> {
		let file = File::create(&self.path)
			.await
			.map_err(|e| io_error(e, &self.path))?;
		return Ok(LocalSink {
			path: self.path.clone(),
			file: Some(file),
		});
	}
}

/// An open local file.
/// Dropping this without closing it still releases the handle.
#[derive(Debug)]
pub struct LocalSink {
	path: PathBuf,
	file: Option<File>,
}

#[async_trait]
impl WritableSink for LocalSink {
	async fn write(&mut self, data: &[u8]) -> Result<(), CapabilityError> {
		match &mut self.file {
			Some(f) => f
				.write_all(data)
				.await
				.map_err(|e| io_error(e, &self.path)),
			None => Err(CapabilityError::Closed),
		}
	}

	async fn close(&mut self) -> Result<(), CapabilityError> {
		if let Some(mut f) = self.file.take() {
			f.flush().await.map_err(|e| io_error(e, &self.path))?;
			f.sync_all().await.map_err(|e| io_error(e, &self.path))?;
		}
		return Ok(());
	}
}
