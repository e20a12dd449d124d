use async_trait::async_trait;
use std::{
	collections::{BTreeMap, BTreeSet},
	sync::{Arc, Mutex, MutexGuard},
};

use super::{CapabilityError, DirCapability, FileCapability, WritableSink};

/// Something that happened to a [`MemoryFs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEvent {
	/// A file was opened for writing
	Open(String),

	/// `.1` bytes were written to a file
	Write(String, usize),

	/// A file was closed
	Close(String),
}

#[derive(Debug, Default)]
struct MemoryState {
	dirs: BTreeSet<String>,
	files: BTreeMap<String, Vec<u8>>,
	events: Vec<MemoryEvent>,
	read_only: bool,
}

/// An in-memory filesystem.
///
/// Paths are `/`-separated and start with `/`.
/// Every sink operation is recorded, see [`MemoryFs::events`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
	state: Arc<Mutex<MemoryState>>,
}

impl MemoryFs {
	pub fn new() -> Self {
		Self::default()
	}

	/// A filesystem that refuses to create anything
	pub fn read_only() -> Self {
		let fs = Self::new();
		fs.lock().read_only = true;
		return fs;
	}

	fn lock(&self) -> MutexGuard<'_, MemoryState> {
		// Every update is a single step, so poisoning is harmless
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}

	/// The root directory of this filesystem
	pub fn root(&self) -> MemoryDir {
		MemoryDir {
			fs: self.clone(),
			path: String::new(),
		}
	}

	pub fn events(&self) -> Vec<MemoryEvent> {
		self.lock().events.clone()
	}

	/// The contents of the file at `path`, if it exists
	pub fn file(&self, path: &str) -> Option<Vec<u8>> {
		self.lock().files.get(path).cloned()
	}

	/// Every directory we've created, sorted
	pub fn dirs(&self) -> Vec<String> {
		self.lock().dirs.iter().cloned().collect()
	}

	/// The path of every file we've created, sorted
	pub fn files(&self) -> Vec<String> {
		self.lock().files.keys().cloned().collect()
	}
}

/// A directory in a [`MemoryFs`]
#[derive(Debug, Clone)]
pub struct MemoryDir {
	fs: MemoryFs,

	/// Empty for the root
	path: String,
}

impl MemoryDir {
	pub fn path(&self) -> &str {
		if self.path.is_empty() {
			"/"
		} else {
			&self.path
		}
	}

	fn child(&self, name: &str) -> Result<String, CapabilityError> {
		if name.is_empty() || name == "." || name == ".." || name.contains('/') {
			return Err(CapabilityError::PermissionDenied(name.to_owned()));
		}
		return Ok(format!("{}/{name}", self.path));
	}
}

#[async_trait]
impl DirCapability for MemoryDir {
	type File = MemoryFile;

	async fn get_dir(&self, name: &str) -> Result<Self, CapabilityError> {
		let path = self.child(name)?;

		let mut state = self.fs.lock();
		if !state.dirs.contains(&path) {
			if state.read_only {
				return Err(CapabilityError::PermissionDenied(path));
			}
			state.dirs.insert(path.clone());
		}

		return Ok(Self {
			fs: self.fs.clone(),
			path,
		});
	}

	async fn get_file(&self, name: &str) -> Result<MemoryFile, CapabilityError> {
		return Ok(MemoryFile {
			fs: self.fs.clone(),
			path: self.child(name)?,
		});
	}
}

/// A file in a [`MemoryFs`]
#[derive(Debug, Clone)]
pub struct MemoryFile {
	fs: MemoryFs,
	path: String,
}

#[async_trait]
impl FileCapability for MemoryFile {
	type Sink = MemorySink;

	async fn open_writable(&self) -> Result<MemorySink, CapabilityError> {
		let mut state = self.fs.lock();
		if state.read_only {
			return Err(CapabilityError::PermissionDenied(self.path.clone()));
		}

		state.files.insert(self.path.clone(), Vec::new());
		state.events.push(MemoryEvent::Open(self.path.clone()));

		return Ok(MemorySink {
			fs: self.fs.clone(),
			path: self.path.clone(),
			closed: false,
		});
	}
}

/// An open file in a [`MemoryFs`]
#[derive(Debug)]
pub struct MemorySink {
	fs: MemoryFs,
	path: String,
	closed: bool,
}

#[async_trait]
impl WritableSink for MemorySink {
	async fn write(&mut self, data: &[u8]) -> Result<(), CapabilityError> {
		if self.closed {
			return Err(CapabilityError::Closed);
		}

		let mut state = self.fs.lock();
		state
			.files
			.entry(self.path.clone())
			.or_default()
			.extend_from_slice(data);
		state
			.events
			.push(MemoryEvent::Write(self.path.clone(), data.len()));
		return Ok(());
	}

	async fn close(&mut self) -> Result<(), CapabilityError> {
		if !self.closed {
			self.closed = true;
			self.fs
				.lock()
				.events
				.push(MemoryEvent::Close(self.path.clone()));
		}
		return Ok(());
	}
}
