//! Directory tree snapshots

use std::{
	path::{Path, PathBuf},
	time::UNIX_EPOCH,
};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// An error we can encounter while scanning a directory
#[derive(Debug, Error)]
pub enum ScanError {
	/// We could not walk the directory tree
	#[error("error while walking directory tree")]
	Walk(#[from] walkdir::Error),

	/// A path in the tree isn't valid utf-8.
	/// Archive paths must be.
	#[error("path `{}` is not valid utf-8", .0.display())]
	NonUtf8Path(PathBuf),
}

/// The data behind a file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
	/// The length of this file, in bytes
	pub size: u64,

	/// Where this file lives on the local filesystem, if it does.
	pub local_path: Option<PathBuf>,
}

/// One node of a directory tree.
///
/// `path` is the path this entry will have inside an archive:
/// relative, `/`-separated, no trailing separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
	/// A directory and everything in it
	Directory {
		name: String,
		path: String,
		children: Vec<DirEntry>,
		/// Modification time, in seconds since the epoch
		mtime: u64,
	},

	/// A regular file
	File {
		name: String,
		path: String,
		file: FileHandle,
		/// Modification time, in seconds since the epoch
		mtime: u64,
	},
}

impl DirEntry {
	/// The last component of this entry's path
	pub fn name(&self) -> &str {
		match self {
			Self::Directory { name, .. } | Self::File { name, .. } => name,
		}
	}

	/// This entry's archive path
	pub fn path(&self) -> &str {
		match self {
			Self::Directory { path, .. } | Self::File { path, .. } => path,
		}
	}

	/// This entry's modification time
	pub fn mtime(&self) -> u64 {
		match self {
			Self::Directory { mtime, .. } | Self::File { mtime, .. } => *mtime,
		}
	}

	/// If true, this is a directory
	pub fn is_dir(&self) -> bool {
		matches!(self, Self::Directory { .. })
	}

	/// Build a tree from a local directory (or a single file).
	///
	/// Archive paths are relative to `root`'s parent, so scanning
	/// `/home/user/photos` produces `photos`, `photos/a.jpg`, ...
	/// Children are sorted by name. Symlinks and special files are skipped.
	pub fn scan(root: &Path) -> Result<Self, ScanError> {
		let base = root.parent().unwrap_or(Path::new(""));

		// Directories we're still filling, outermost first
		let mut stack: Vec<DirEntry> = Vec::new();
		let mut out: Option<DirEntry> = None;

		for entry in WalkDir::new(root).sort_by_file_name() {
			let entry = entry?;

			// Close every directory that isn't an ancestor of this entry
			while stack.len() > entry.depth() {
				close_dir(&mut stack, &mut out);
			}

			let path = archive_path(entry.path(), base)?;
			let name = path.rsplit('/').next().unwrap_or_default().to_owned();
			let meta = entry.metadata()?;
			let mtime = meta
				.modified()
				.ok()
				.and_then(|x| x.duration_since(UNIX_EPOCH).ok())
				.map(|x| x.as_secs())
				.unwrap_or(0);

			let ft = entry.file_type();
			if ft.is_dir() {
				trace!(message = "Scanned directory", path = path.as_str());
				stack.push(DirEntry::Directory {
					name,
					path,
					children: Vec::new(),
					mtime,
				});
			} else if meta.is_file() {
				trace!(message = "Scanned file", path = path.as_str(), size = meta.len());
				let file = DirEntry::File {
					name,
					path,
					file: FileHandle {
						size: meta.len(),
						local_path: Some(entry.path().to_owned()),
					},
					mtime,
				};

				match stack.last_mut() {
					Some(DirEntry::Directory { children, .. }) => children.push(file),
					_ => out = Some(file),
				}
			} else {
				debug!(message = "Skipping special file", path = path.as_str());
			}
		}

		while !stack.is_empty() {
			close_dir(&mut stack, &mut out);
		}

		// The root itself was skipped (a symlink, for example).
		// Walking always yields the root, so this is our only empty case.
		return Ok(out.unwrap_or_else(|| DirEntry::Directory {
			name: String::new(),
			path: String::new(),
			children: Vec::new(),
			mtime: 0,
		}));
	}
}

impl Drop for DirEntry {
	// Iterative, a recursive drop overflows the stack on deep trees
	fn drop(&mut self) {
		let DirEntry::Directory { children, .. } = self else {
			return;
		};

		let mut stack = std::mem::take(children);
		while let Some(mut entry) = stack.pop() {
			if let DirEntry::Directory { children, .. } = &mut entry {
				stack.append(children);
			}
		}
	}
}

/// Pop the innermost open directory and attach it to its parent
fn close_dir(stack: &mut Vec<DirEntry>, out: &mut Option<DirEntry>) {
	if let Some(dir) = stack.pop() {
		match stack.last_mut() {
			Some(DirEntry::Directory { children, .. }) => children.push(dir),
			_ => *out = Some(dir),
		}
	}
}

fn archive_path(path: &Path, base: &Path) -> Result<String, ScanError> {
	let rel = path.strip_prefix(base).unwrap_or(path);

	let mut parts = Vec::new();
	for c in rel.components() {
		match c.as_os_str().to_str() {
			Some(x) => parts.push(x),
			None => return Err(ScanError::NonUtf8Path(path.to_owned())),
		}
	}

	return Ok(parts.join("/"));
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn scan_tree() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("photos");
		fs::create_dir_all(root.join("2024/summer")).unwrap();
		fs::create_dir_all(root.join("empty")).unwrap();
		fs::write(root.join("2024/summer/beach.jpg"), [0u8; 1500]).unwrap();
		fs::write(root.join("2024/list.txt"), b"a,b").unwrap();
		fs::write(root.join("readme"), b"").unwrap();

		let tree = DirEntry::scan(&root).unwrap();
		assert_eq!(tree.path(), "photos");
		assert!(tree.is_dir());

		let DirEntry::Directory { children, .. } = &tree else {
			panic!("root should be a directory")
		};
		let names: Vec<_> = children.iter().map(|x| x.path()).collect();
		assert_eq!(names, ["photos/2024", "photos/empty", "photos/readme"]);

		let DirEntry::Directory { children, .. } = &children[0] else {
			panic!("2024 should be a directory")
		};
		assert_eq!(children[0].path(), "photos/2024/list.txt");
		assert_eq!(children[1].path(), "photos/2024/summer");

		match &children[1] {
			DirEntry::Directory { children, .. } => match &children[0] {
				DirEntry::File { name, file, .. } => {
					assert_eq!(name, "beach.jpg");
					assert_eq!(file.size, 1500);
					assert!(file.local_path.is_some());
				}
				_ => panic!("Unexpected entry type"),
			},
			_ => panic!("Unexpected entry type"),
		}
	}

	#[cfg(unix)]
	#[test]
	fn scan_skips_symlinks() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("links");
		fs::create_dir_all(&root).unwrap();
		fs::write(root.join("real.txt"), b"abc").unwrap();
		std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
		std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

		let tree = DirEntry::scan(&root).unwrap();
		let DirEntry::Directory { children, .. } = &tree else {
			panic!("root should be a directory")
		};
		let names: Vec<_> = children.iter().map(|x| x.path()).collect();
		assert_eq!(names, ["links/real.txt"]);
	}

	#[test]
	fn drop_deep_tree() {
		let mut node = DirEntry::File {
			name: "x".to_owned(),
			path: "x".to_owned(),
			file: FileHandle {
				size: 0,
				local_path: None,
			},
			mtime: 0,
		};
		for _ in 0..200_000 {
			node = DirEntry::Directory {
				name: "d".to_owned(),
				path: "d".to_owned(),
				children: vec![node],
				mtime: 0,
			};
		}
		drop(node);
	}

	#[test]
	fn scan_single_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("song.flac");
		fs::write(&path, [1u8; 10]).unwrap();

		let tree = DirEntry::scan(&path).unwrap();
		assert!(!tree.is_dir());
		assert_eq!(tree.path(), "song.flac");
		assert_eq!(tree.name(), "song.flac");
	}
}
