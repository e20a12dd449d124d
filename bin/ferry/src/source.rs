use anyhow::{Context, Result};
use ferry_util::stream::{stream_from_reader, stream_from_url, ByteStream};
use tracing::debug;
use url::Url;

/// Open a local file, an http(s) url, or stdin (`-`) as a byte stream
pub async fn open(source: &str, chunk_size: usize) -> Result<ByteStream> {
	if source == "-" {
		debug!(message = "Reading from stdin");
		return Ok(stream_from_reader(tokio::io::stdin(), chunk_size));
	}

	if let Ok(url) = Url::parse(source) {
		if matches!(url.scheme(), "http" | "https") {
			return Ok(stream_from_url(url)
				.await
				.with_context(|| format!("could not fetch `{source}`"))?);
		}
	}

	let file = tokio::fs::File::open(source)
		.await
		.with_context(|| format!("could not open `{source}`"))?;
	return Ok(stream_from_reader(file, chunk_size));
}
