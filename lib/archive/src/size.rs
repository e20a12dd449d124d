//! Compute the exact size of a tar archive before writing it.

use crate::entry::DirEntry;

/// The size of a tar block. Headers are one block,
/// data is padded to a whole number of blocks.
pub const BLOCK_SIZE: u64 = 512;

/// Paths longer than this need a GNU long-name entry
pub const NAME_FIELD_LEN: usize = 100;

/// Two zero blocks end every archive
pub const TRAILER_SIZE: u64 = 2 * BLOCK_SIZE;

/// Round `v` up to a multiple of [`BLOCK_SIZE`].
/// Multiples of [`BLOCK_SIZE`] are returned unchanged.
pub fn round_up_512(v: u64) -> u64 {
	let rem = v % BLOCK_SIZE;
	if rem == 0 {
		return v;
	}
	return v + (BLOCK_SIZE - rem);
}

/// The number of header bytes an entry with the given path needs.
///
/// A long path is stored as a GNU `L` entry (a header, then the
/// NUL-terminated path as data) in front of the real header.
pub fn header_size(path: &str) -> u64 {
	// `len` counts utf-8 bytes, not characters
	let len = path.len();
	if len > NAME_FIELD_LEN {
		return 2 * BLOCK_SIZE + round_up_512(len as u64 + 1);
	}
	return BLOCK_SIZE;
}

/// Compute the exact length of the GNU tar archive that stores `root`.
///
/// This walks the tree with an explicit stack, so arbitrarily deep
/// trees are fine. Entry order does not change the result.
pub fn tar_size(root: &DirEntry) -> u64 {
	let mut total = 0u64;
	let mut stack = vec![root];

	while let Some(entry) = stack.pop() {
		total += header_size(entry.path());

		match entry {
			DirEntry::Directory { children, .. } => stack.extend(children.iter()),
			DirEntry::File { file, .. } => total += round_up_512(file.size),
		}
	}

	return total + TRAILER_SIZE;
}
