//! Rebuild a directory tree from a streamed tar archive

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::{collections::HashMap, io};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::{
	fs::{CapabilityError, DirCapability, FileCapability, WritableSink},
	parser::{EntryKind, Pull, TarHeader, TarParseError, TarParser, UstarParser},
};

/// An error we can encounter while reconstructing an archive
#[derive(Debug, Error)]
pub enum ReconstructError {
	/// The archive's entries are inconsistent:
	/// data outside of a file, a missing parent, or a path that leaves the root.
	#[error("archive integrity error: {0}")]
	Integrity(String),

	/// A filesystem capability refused or failed an operation
	#[error("filesystem error")]
	Capability(#[from] CapabilityError),

	/// The archive could not be parsed
	#[error("tar parse error")]
	Parse(#[from] TarParseError),

	/// We could not read input
	#[error("i/o error while reading archive")]
	Io(#[from] io::Error),
}

/// What a reconstruction did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructStats {
	/// The number of directories we created
	pub directories: usize,

	/// The number of files we wrote
	pub files: usize,

	/// The number of data bytes we wrote
	pub bytes: u64,

	/// If true, we saw the end-of-archive marker.
	/// If false, input ended early.
	pub complete: bool,
}

type SinkOf<D> = <<D as DirCapability>::File as FileCapability>::Sink;

/// Replays a tar stream onto a directory capability.
///
/// Directories are keyed by their normalized path (`/`, `/a`, `/a/b`).
/// An entry's parent must appear in the archive before the entry does.
pub struct TarReconstructor<D: DirCapability> {
	dirs: HashMap<String, D>,

	/// The file we're writing and its key, if any.
	/// At most one file is open at a time.
	sink: Option<(String, SinkOf<D>)>,

	stats: ReconstructStats,
}

impl<D: DirCapability> TarReconstructor<D> {
	/// Prepare to reconstruct into `root`
	pub fn new(root: D) -> Self {
		let mut dirs = HashMap::new();
		dirs.insert("/".to_owned(), root);

		Self {
			dirs,
			sink: None,
			stats: ReconstructStats::default(),
		}
	}

	/// Feed `input` through `parser` and replay everything it produces.
	///
	/// Stops at the end-of-archive marker or when `input` runs out.
	/// The open file is always closed before this returns,
	/// even if reconstruction failed.
	pub async fn run<P, S>(
		mut self,
		parser: &mut P,
		input: S,
	) -> Result<ReconstructStats, ReconstructError>
	where
		P: TarParser,
		S: Stream<Item = io::Result<Bytes>> + Unpin,
	{
		let result = self.run_inner(parser, input).await;
		let closed = self.close_sink().await;

		match (result, closed) {
			(Ok(()), Ok(())) => {}
			(Err(err), Ok(())) | (Ok(()), Err(err)) => return Err(err),
			(Err(err), Err(close_err)) => {
				warn!(
					message = "Could not close file after reconstruction failed",
					error = %close_err
				);
				return Err(err);
			}
		}

		self.stats.complete = parser.is_finished();
		if !self.stats.complete {
			warn!(message = "Input ended before the end of the archive");
		}

		info!(
			message = "Reconstructed archive",
			directories = self.stats.directories,
			files = self.stats.files,
			bytes = self.stats.bytes,
			complete = self.stats.complete
		);

		return Ok(self.stats);
	}

	async fn run_inner<P, S>(&mut self, parser: &mut P, input: S) -> Result<(), ReconstructError>
	where
		P: TarParser,
		S: Stream<Item = io::Result<Bytes>> + Unpin,
	{
		let mut input = input.fuse();

		loop {
			match parser.pull()? {
				Pull::Further => {
					if parser.is_finished() {
						break;
					}

					match input.next().await {
						Some(chunk) => parser.push(chunk?),
						None => {
							if parser.pullable() {
								continue;
							}
							break;
						}
					}
				}

				Pull::Header(header) => self.header(header).await?,

				Pull::Data(data) => match &mut self.sink {
					Some((_, sink)) => {
						sink.write(&data).await?;
						self.stats.bytes += data.len() as u64;
					}
					None => {
						return Err(ReconstructError::Integrity(
							"file data outside of a file entry".to_owned(),
						))
					}
				},
			}
		}

		return Ok(());
	}

	async fn header(&mut self, header: TarHeader) -> Result<(), ReconstructError> {
		let parts = components(&header.path)?;

		let Some((name, parent)) = parts.split_last() else {
			return match header.kind {
				EntryKind::Directory => {
					trace!(message = "Skipping archive root entry", path = header.path.as_str());
					Ok(())
				}
				EntryKind::File => Err(ReconstructError::Integrity(format!(
					"file entry `{}` has no name",
					header.path
				))),
			};
		};

		let key = dir_key(&parts);
		let parent_key = dir_key(parent);

		match header.kind {
			EntryKind::Directory => {
				if self.dirs.contains_key(&key) {
					trace!(message = "Directory already exists", path = key.as_str());
					return Ok(());
				}

				let dir = match self.dirs.get(&parent_key) {
					Some(p) => p.get_dir(name).await?,
					None => return Err(missing_parent(&parent_key, &key)),
				};

				debug!(message = "Created directory", path = key.as_str());
				self.dirs.insert(key, dir);
				self.stats.directories += 1;
			}

			EntryKind::File => {
				self.close_sink().await?;

				let file = match self.dirs.get(&parent_key) {
					Some(p) => p.get_file(name).await?,
					None => return Err(missing_parent(&parent_key, &key)),
				};
				let sink = file.open_writable().await?;

				debug!(
					message = "Writing file",
					path = key.as_str(),
					size = header.size
				);
				self.sink = Some((key, sink));
				self.stats.files += 1;
			}
		}

		return Ok(());
	}

	/// Close the open file, if there is one
	async fn close_sink(&mut self) -> Result<(), ReconstructError> {
		if let Some((path, mut sink)) = self.sink.take() {
			sink.close().await?;
			trace!(message = "Closed file", path = path.as_str());
		}
		return Ok(());
	}
}

/// Reconstruct the tar archive in `input` into `root`
pub async fn reconstruct<D, S>(root: D, input: S) -> Result<ReconstructStats, ReconstructError>
where
	D: DirCapability,
	S: Stream<Item = io::Result<Bytes>> + Unpin,
{
	let mut parser = UstarParser::new();
	return TarReconstructor::new(root).run(&mut parser, input).await;
}

// MARK: paths

/// Split an archive path into components.
/// Leading `/`, `./` and empty components are dropped.
fn components(path: &str) -> Result<Vec<&str>, ReconstructError> {
	let mut parts = Vec::new();
	for p in path.split('/') {
		match p {
			"" | "." => continue,
			".." => {
				return Err(ReconstructError::Integrity(format!(
					"path `{path}` leaves the archive root"
				)))
			}
			x => parts.push(x),
		}
	}
	return Ok(parts);
}

fn dir_key(parts: &[&str]) -> String {
	format!("/{}", parts.join("/"))
}

fn missing_parent(parent: &str, path: &str) -> ReconstructError {
	ReconstructError::Integrity(format!(
		"parent `{parent}` of `{path}` is not in the archive"
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fs::{LocalDir, MemoryEvent, MemoryFs};
	use ferry_util::stream::stream_from_chunks;
	use paste::paste;
	use rand::Rng;
	use sha2::{Digest, Sha256};
	use std::{collections::VecDeque, ops::Range};

	/// A parser that replays a fixed list of outputs
	struct Scripted {
		pulls: VecDeque<Pull>,
	}

	impl Scripted {
		fn new(pulls: Vec<Pull>) -> Self {
			Self {
				pulls: pulls.into(),
			}
		}
	}

	impl TarParser for Scripted {
		fn pull(&mut self) -> Result<Pull, TarParseError> {
			Ok(self.pulls.pop_front().unwrap_or(Pull::Further))
		}

		fn push(&mut self, _data: Bytes) {}

		fn pullable(&self) -> bool {
			!self.pulls.is_empty()
		}
	}

	fn dir(path: &str) -> Pull {
		Pull::Header(TarHeader::new(EntryKind::Directory, path, 0, 0))
	}

	fn file(path: &str, size: u64) -> Pull {
		Pull::Header(TarHeader::new(EntryKind::File, path, 0, size))
	}

	fn data(d: &'static [u8]) -> Pull {
		Pull::Data(Bytes::from_static(d))
	}

	async fn run_scripted(
		fs: &MemoryFs,
		pulls: Vec<Pull>,
	) -> Result<ReconstructStats, ReconstructError> {
		let mut parser = Scripted::new(pulls);
		TarReconstructor::new(fs.root())
			.run(&mut parser, futures::stream::empty::<io::Result<Bytes>>())
			.await
	}

	fn sha256_hex(data: &[u8]) -> String {
		let mut hasher = Sha256::new();
		hasher.update(data);
		format!("{:x}", hasher.finalize())
	}

	// MARK: scripted

	#[tokio::test]
	async fn replays_in_order() {
		let fs = MemoryFs::new();
		let stats = run_scripted(
			&fs,
			vec![
				dir("a/"),
				file("a/x", 3),
				data(b"ab"),
				data(b"c"),
				file("a/y", 0),
				dir("a/b/"),
				file("a/b/z", 1),
				data(b"z"),
			],
		)
		.await
		.unwrap();

		assert_eq!(
			stats,
			ReconstructStats {
				directories: 2,
				files: 3,
				bytes: 4,
				complete: false,
			}
		);
		assert_eq!(fs.dirs(), ["/a", "/a/b"]);
		assert_eq!(fs.file("/a/x").unwrap(), b"abc");
		assert_eq!(fs.file("/a/y").unwrap(), b"");
		assert_eq!(
			fs.events(),
			vec![
				MemoryEvent::Open("/a/x".into()),
				MemoryEvent::Write("/a/x".into(), 2),
				MemoryEvent::Write("/a/x".into(), 1),
				MemoryEvent::Close("/a/x".into()),
				MemoryEvent::Open("/a/y".into()),
				MemoryEvent::Close("/a/y".into()),
				MemoryEvent::Open("/a/b/z".into()),
				MemoryEvent::Write("/a/b/z".into(), 1),
				MemoryEvent::Close("/a/b/z".into()),
			]
		);
	}

	#[tokio::test]
	async fn missing_parent_directory() {
		let fs = MemoryFs::new();
		let err = run_scripted(&fs, vec![dir("a/b/")]).await;
		assert!(matches!(err, Err(ReconstructError::Integrity(_))));
		assert!(fs.dirs().is_empty());

		let err = run_scripted(&fs, vec![file("missing/x", 0)]).await;
		assert!(matches!(err, Err(ReconstructError::Integrity(_))));
		assert!(fs.events().is_empty());
	}

	#[tokio::test]
	async fn data_without_file() {
		let fs = MemoryFs::new();
		let err = run_scripted(&fs, vec![dir("a/"), data(b"x")]).await;
		assert!(matches!(err, Err(ReconstructError::Integrity(_))));
	}

	#[tokio::test]
	async fn parent_components() {
		let fs = MemoryFs::new();
		let err = run_scripted(&fs, vec![dir("a/"), file("a/../x", 0)]).await;
		assert!(matches!(err, Err(ReconstructError::Integrity(_))));
		assert!(fs.files().is_empty());
	}

	#[tokio::test]
	async fn normalizes_paths() {
		let fs = MemoryFs::new();
		let stats = run_scripted(
			&fs,
			vec![
				dir("./"),
				dir("./a/"),
				dir("/a"),
				dir("a//./b/"),
				file("./a/b/x", 0),
			],
		)
		.await
		.unwrap();

		assert_eq!(stats.directories, 2);
		assert_eq!(fs.dirs(), ["/a", "/a/b"]);
		assert_eq!(fs.files(), ["/a/b/x"]);
	}

	#[tokio::test]
	async fn closes_file_on_error() {
		let fs = MemoryFs::new();
		let err = run_scripted(&fs, vec![file("x", 1), data(b"x"), dir("q/r/")]).await;
		assert!(matches!(err, Err(ReconstructError::Integrity(_))));
		assert_eq!(fs.events().last(), Some(&MemoryEvent::Close("/x".into())));
	}

	#[tokio::test]
	async fn permission_denied() {
		let fs = MemoryFs::read_only();
		let err = run_scripted(&fs, vec![dir("a/")]).await;
		assert!(matches!(
			err,
			Err(ReconstructError::Capability(
				CapabilityError::PermissionDenied(_)
			))
		));

		let err = run_scripted(&fs, vec![file("x", 0)]).await;
		assert!(matches!(
			err,
			Err(ReconstructError::Capability(
				CapabilityError::PermissionDenied(_)
			))
		));
	}

	// MARK: real archives

	struct TestFile {
		path: String,
		content: Vec<u8>,
	}

	/// A small tree with a long path and an empty directory.
	/// Returns the archive and the files in it.
	fn test_archive() -> (Vec<u8>, Vec<TestFile>) {
		let long_dir = format!("music/{}", "Long Album Name ".repeat(8));
		let files = vec![
			TestFile {
				path: "music/empty.txt".to_owned(),
				content: Vec::new(),
			},
			TestFile {
				path: "music/one-block.bin".to_owned(),
				content: vec![0x5A; 512],
			},
			TestFile {
				path: format!("{long_dir}/01 - Track.flac"),
				content: (0..20_000u32).map(|x| (x * 31 % 256) as u8).collect(),
			},
			TestFile {
				path: "music/nested/deeper/notes.txt".to_owned(),
				content: b"some notes\n".to_vec(),
			},
		];

		let mut b = tar::Builder::new(Vec::new());
		for d in [
			"music",
			long_dir.as_str(),
			"music/nested",
			"music/nested/deeper",
			"music/nothing",
		] {
			let mut h = tar::Header::new_gnu();
			h.set_entry_type(tar::EntryType::Directory);
			h.set_mode(0o755);
			h.set_size(0);
			b.append_data(&mut h, d, std::io::empty()).unwrap();
		}

		for f in &files {
			let mut h = tar::Header::new_gnu();
			h.set_entry_type(tar::EntryType::Regular);
			h.set_mode(0o644);
			h.set_size(f.content.len() as u64);
			b.append_data(&mut h, &f.path, f.content.as_slice()).unwrap();
		}

		(b.into_inner().unwrap(), files)
	}

	fn split_random(data: &[u8], range: Range<usize>) -> Vec<Vec<u8>> {
		let mut out = Vec::new();
		let mut head = 0;
		while head < data.len() {
			let size = rand::thread_rng()
				.gen_range(range.clone())
				.min(data.len() - head);
			out.push(data[head..head + size].to_vec());
			head += size;
		}
		return out;
	}

	async fn test_chunked(range: Range<usize>) {
		let (archive, files) = test_archive();
		let fs = MemoryFs::new();

		let stats = reconstruct(fs.root(), stream_from_chunks(split_random(&archive, range)))
			.await
			.unwrap();

		assert!(stats.complete);
		assert_eq!(stats.directories, 5);
		assert_eq!(stats.files, files.len());
		assert_eq!(
			stats.bytes,
			files.iter().map(|x| x.content.len() as u64).sum::<u64>()
		);
		assert!(fs.dirs().contains(&"/music/nothing".to_owned()));

		for f in &files {
			let got = fs.file(&format!("/{}", f.path)).unwrap();
			assert_eq!(sha256_hex(&got), sha256_hex(&f.content), "{}", f.path);
		}
	}

	macro_rules! gen_tests {
		( $( $name:ident: $range:expr ),* ) => {
			paste! {
				$(
					#[tokio::test]
					async fn [<chunked_ $name>]() {
						for _ in 0..3 {
							test_chunked($range).await
						}
					}
				)*
			}
		};
	}

	gen_tests!(tiny: 1..4, small: 1..256, block: 500..530, large: 4096..8192);

	#[tokio::test]
	async fn truncated_archive() {
		let (archive, _) = test_archive();
		let fs = MemoryFs::new();

		// Stop in the middle of the long file
		let cut = archive.len() - 12_000;
		let stats = reconstruct(
			fs.root(),
			stream_from_chunks(split_random(&archive[..cut], 1..1000)),
		)
		.await
		.unwrap();

		assert!(!stats.complete);
		assert!(stats.bytes > 0);
		assert!(matches!(
			fs.events().last(),
			Some(MemoryEvent::Close(_))
		));
	}

	#[tokio::test]
	async fn input_error() {
		let fs = MemoryFs::new();
		let input = futures::stream::iter(vec![Err::<Bytes, _>(io::Error::other("disconnected"))]);
		let err = reconstruct(fs.root(), input).await;
		assert!(matches!(err, Err(ReconstructError::Io(_))));
	}

	#[tokio::test]
	async fn local_round_trip() {
		let (archive, files) = test_archive();
		let dir = tempfile::tempdir().unwrap();

		let stats = reconstruct(
			LocalDir::new(dir.path()),
			stream_from_chunks(split_random(&archive, 1..3000)),
		)
		.await
		.unwrap();
		assert!(stats.complete);

		for f in &files {
			let got = std::fs::read(dir.path().join(&f.path)).unwrap();
			assert_eq!(got, f.content);
		}
		assert!(dir.path().join("music/nothing").is_dir());
	}
}
