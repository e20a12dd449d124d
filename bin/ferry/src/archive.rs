use anyhow::{Context, Result};
use ferry_archive::{entry::DirEntry, fs::LocalDir, reconstruct::reconstruct, size};
use std::path::PathBuf;
use tracing::debug;

use crate::{config::FerryConfig, source};

/// Print the size of the archive that would store `dir`
#[expect(clippy::print_stdout)]
pub async fn tar_size(dir: PathBuf) -> Result<()> {
	let tree = tokio::task::spawn_blocking(move || DirEntry::scan(&dir)).await??;
	let size = size::tar_size(&tree);
	debug!(message = "Computed archive size", path = tree.path(), size);
	println!("{size}");
	return Ok(());
}

/// Unpack the archive at `archive` into `target`
#[expect(clippy::print_stdout)]
pub async fn untar(config: &FerryConfig, archive: &str, target: PathBuf) -> Result<()> {
	tokio::fs::create_dir_all(&target)
		.await
		.with_context(|| format!("could not create `{}`", target.display()))?;

	let input = source::open(archive, config.ferry_read_chunk_size).await?;
	let stats = reconstruct(LocalDir::new(target), input).await?;

	println!(
		"{} directories, {} files, {} bytes",
		stats.directories, stats.files, stats.bytes
	);
	if !stats.complete {
		println!("warning: archive ended early");
	}

	return Ok(());
}
