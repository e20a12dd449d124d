use anyhow::Result;
use ferry_audiofile::{
	common::vorbiscomment::VorbisComment,
	flac::{
		blocks::{DataUrlFactory, FlacBlock, FlacPictureBlock},
		decode::FlacMetadataDecoder,
	},
};
use serde_json::{json, Value};
use tracing::warn;

use crate::{config::FerryConfig, source};

/// Decode and print the metadata of the flac file at `source`
#[expect(clippy::print_stdout)]
pub async fn run(config: &FerryConfig, source: &str, json: bool, picture_urls: bool) -> Result<()> {
	let stream = source::open(source, config.ferry_read_chunk_size).await?;
	let mut blocks = FlacMetadataDecoder::new(stream).decode_all().await?;

	if json {
		let out: Vec<Value> = blocks
			.iter_mut()
			.map(|b| block_json(b, picture_urls))
			.collect::<Result<_>>()?;
		println!("{}", serde_json::to_string_pretty(&out)?);
		return Ok(());
	}

	for (i, block) in blocks.iter_mut().enumerate() {
		let name = block_name(block);
		match block {
			FlacBlock::Streaminfo(s) => println!(
				"#{i} {name}: {} Hz, {} ch, {} bit, {} samples, md5 {}",
				s.sample_rate,
				s.channels,
				s.bits_per_sample,
				s.total_samples,
				s.md5_hex()
			),

			FlacBlock::Comment(c) => match c.comment() {
				Ok(comment) => {
					println!(
						"#{i} {name}: vendor `{}`, {} comments",
						comment.vendor,
						comment.comments.len()
					);
					for (tag, value) in &comment.comments {
						println!("    {}={value}", tag.name());
					}
					for p in &comment.pictures {
						println!("    picture: {}", picture_line(p));
					}
				}
				Err(error) => {
					warn!(message = "Could not decode vorbis comment", %error);
					println!("#{i} {name}: undecodable");
				}
			},

			FlacBlock::Picture(p) => {
				println!("#{i} {name}: {}", picture_line(p));
				if picture_urls {
					println!("    {}", p.display_url(&DataUrlFactory));
					p.release_url(&DataUrlFactory);
				}
			}

			FlacBlock::Other(raw) => {
				println!("#{i} {name}: {} bytes", raw.len())
			}
		}
	}

	return Ok(());
}

fn block_name(block: &FlacBlock) -> String {
	block.block_type().to_string().to_lowercase()
}

fn picture_line(p: &FlacPictureBlock) -> String {
	format!(
		"{} {} {}x{}, {} bytes",
		p.picture_type,
		p.mime,
		p.width,
		p.height,
		p.img_data.len()
	)
}

fn picture_json(p: &mut FlacPictureBlock, with_url: bool) -> Value {
	let mut v = json!({
		"picture_type": p.picture_type.to_string(),
		"mime": p.mime.to_string(),
		"description": p.description,
		"width": p.width,
		"height": p.height,
		"bit_depth": p.bit_depth,
		"color_count": p.color_count,
		"size": p.img_data.len(),
	});

	if with_url {
		v["url"] = Value::from(p.display_url(&DataUrlFactory));
		p.release_url(&DataUrlFactory);
	}

	return v;
}

fn comment_json(comment: &mut VorbisComment, with_url: bool) -> Value {
	json!({
		"vendor": comment.vendor.as_str(),
		"comments": comment
			.comments
			.iter()
			.map(|(tag, value)| json!([tag.name(), value.as_str()]))
			.collect::<Vec<_>>(),
		"pictures": comment
			.pictures
			.iter_mut()
			.map(|p| picture_json(p, with_url))
			.collect::<Vec<_>>(),
	})
}

fn block_json(block: &mut FlacBlock, with_url: bool) -> Result<Value> {
	let kind = block_name(block);

	return Ok(match block {
		FlacBlock::Streaminfo(s) => json!({ "type": kind, "info": serde_json::to_value(&*s)? }),
		FlacBlock::Picture(p) => json!({ "type": kind, "picture": picture_json(p, with_url) }),
		FlacBlock::Comment(c) => match c.comment() {
			Ok(mut comment) => json!({ "type": kind, "comment": comment_json(&mut comment, with_url) }),
			Err(error) => json!({ "type": kind, "error": error.to_string() }),
		},
		FlacBlock::Other(raw) => json!({ "type": kind, "id": raw.id, "length": raw.len() }),
	});
}
