use ferry_util::logging::LoggingPreset;
use serde::Deserialize;

/// Note that the field of this struct are not capitalized.
/// Envy is case-insensitive, and expects Rust fields to be snake_case.
#[derive(Debug, Deserialize, Clone)]
pub struct FerryConfig {
	/// The logging level to run with
	#[serde(default)]
	pub ferry_loglevel: LoggingPreset,

	/// The largest chunk, in bytes, we read from a local file or stdin at once.
	/// Archive data is written out in pieces of at most this size.
	#[serde(default = "FerryConfig::default_read_chunk_size")]
	pub ferry_read_chunk_size: usize,
}

impl FerryConfig {
	fn default_read_chunk_size() -> usize {
		64 * 1024
	}
}
