use ferry_util::cursor::{ByteCursor, Endian};
use itertools::Itertools;
use serde::{Serialize, Serializer};

use super::FlacMetablockDecode;
use crate::flac::errors::FlacDecodeError;

/// A streaminfo block in a flac file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlacStreaminfoBlock {
	/// The minimum block size (in samples) used in the stream.
	pub min_block_size: u16,

	/// The maximum block size (in samples) used in the stream.
	/// (Minimum blocksize == maximum blocksize) implies a fixed-blocksize stream.
	pub max_block_size: u16,

	/// The minimum frame size (in bytes) used in the stream.
	/// May be 0 to imply the value is not known.
	pub min_frame_size: u32,

	/// The maximum frame size (in bytes) used in the stream.
	/// May be 0 to imply the value is not known.
	pub max_frame_size: u32,

	/// Sample rate in Hz. Though 20 bits are available,
	/// the maximum sample rate is limited by the structure of frame headers to 655350Hz.
	/// Also, a value of 0 is invalid.
	pub sample_rate: u32,

	/// Number of channels. FLAC supports from 1 to 8 channels
	pub channels: u8,

	/// Bits per sample. FLAC supports from 4 to 32 bits per sample.
	pub bits_per_sample: u8,

	/// Total samples in stream. 'Samples' means inter-channel sample,
	/// i.e. one second of 44.1Khz audio will have 44100 samples regardless of the number of channels.
	/// A value of zero here means the number of total samples is unknown.
	///
	/// This is a 36-bit field.
	pub total_samples: u64,

	/// MD5 signature of the unencoded audio data.
	#[serde(serialize_with = "serialize_md5")]
	pub md5_signature: [u8; 16],
}

fn serialize_md5<S: Serializer>(md5: &[u8; 16], s: S) -> Result<S::Ok, S::Error> {
	s.serialize_str(&md5_hex(md5))
}

fn md5_hex(md5: &[u8; 16]) -> String {
	md5.iter().map(|x| format!("{x:02x}")).join("")
}

impl FlacStreaminfoBlock {
	/// This stream's md5 signature, as 32 lowercase hex digits
	pub fn md5_hex(&self) -> String {
		md5_hex(&self.md5_signature)
	}
}

impl FlacMetablockDecode for FlacStreaminfoBlock {
	fn decode(data: &[u8]) -> Result<Self, FlacDecodeError> {
		let mut d = ByteCursor::new(data);

		let min_block_size = d.read_u16(Endian::Big)?;
		let max_block_size = d.read_u16(Endian::Big)?;
		let min_frame_size = d.read_u24(Endian::Big)?;
		let max_frame_size = d.read_u24(Endian::Big)?;

		let (sample_rate, channels, bits_per_sample, total_samples) = {
			let b = d.read(8)?;

			(
				// 20 bits: sample rate in hz
				(u32::from(b[0]) << 12) | (u32::from(b[1]) << 4) | (u32::from(b[2]) >> 4),
				// 3 bits: number of channels - 1.
				((b[2] & 0b0000_1110) >> 1) + 1,
				// 5 bits: bits per sample - 1.
				(((b[2] & 0b0000_0001) << 4) | (b[3] >> 4)) + 1,
				// 36 bits: total "cross-channel" samples in the stream.
				// Zero means we don't know.
				u64::from_be_bytes([0, 0, 0, b[3] & 0b0000_1111, b[4], b[5], b[6], b[7]]),
			)
		};

		let md5_signature = {
			let mut block = [0u8; 16];
			block.copy_from_slice(d.read(16)?);
			block
		};

		Ok(Self {
			min_block_size,
			max_block_size,
			min_frame_size,
			max_frame_size,
			sample_rate,
			channels,
			bits_per_sample,
			total_samples,
			md5_signature,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::flac::tests::streaminfo_payload;

	#[test]
	fn cd_quality() {
		let data = streaminfo_payload(44100, 2, 16, 0x1_2345_6789);

		// Hand-checked bit packing
		assert_eq!(&data[10..18], &[0x0A, 0xC4, 0x42, 0xF1, 0x23, 0x45, 0x67, 0x89]);

		let s = FlacStreaminfoBlock::decode(&data).unwrap();
		assert_eq!(s.min_block_size, 4096);
		assert_eq!(s.max_block_size, 4096);
		assert_eq!(s.min_frame_size, 14);
		assert_eq!(s.max_frame_size, 0x01_0203);
		assert_eq!(s.sample_rate, 44100);
		assert_eq!(s.channels, 2);
		assert_eq!(s.bits_per_sample, 16);
		assert_eq!(s.total_samples, 0x1_2345_6789);
		assert_eq!(s.md5_hex(), "000102030405060708090a0b0c0d0e0f");
	}

	#[test]
	fn extreme_fields() {
		for (rate, ch, bps, total) in [
			(1, 1, 4, 0),
			(655_350, 8, 32, (1u64 << 36) - 1),
			(96_000, 6, 24, 1),
			(0xF_FFFF, 3, 17, 1u64 << 35),
		] {
			let s = FlacStreaminfoBlock::decode(&streaminfo_payload(rate, ch, bps, total)).unwrap();
			assert_eq!(s.sample_rate, rate);
			assert_eq!(s.channels, ch);
			assert_eq!(s.bits_per_sample, bps);
			assert_eq!(s.total_samples, total);
		}
	}

	#[test]
	fn short_payload() {
		let data = streaminfo_payload(44100, 2, 16, 0);
		assert!(matches!(
			FlacStreaminfoBlock::decode(&data[..20]),
			Err(FlacDecodeError::UnexpectedEof {
				wanted: 16,
				available: 2
			})
		));
	}
}
