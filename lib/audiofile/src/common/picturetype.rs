//! Picture types shared by FLAC picture blocks and vorbis comments

use std::fmt::Display;

/// A picture type according to the ID3v2 APIC frame
#[expect(missing_docs)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PictureType {
	Other,
	PngFileIcon,
	OtherFileIcon,
	FrontCover,
	BackCover,
	LeafletPage,
	Media,
	LeadArtist,
	Artist,
	Conductor,
	BandOrchestra,
	Composer,
	Lyricist,
	RecLocation,
	DuringRecording,
	DuringPerformance,
	VideoScreenCapture,
	ABrightColoredFish,
	Illustration,
	ArtistLogotype,
	PublisherLogotype,

	/// A type code outside the APIC table.
	/// We keep these instead of rejecting the picture.
	Unknown(u32),
}

impl PictureType {
	/// Map an APIC type code to a [`PictureType`]
	pub fn from_idx(idx: u32) -> Self {
		match idx {
			0 => PictureType::Other,
			1 => PictureType::PngFileIcon,
			2 => PictureType::OtherFileIcon,
			3 => PictureType::FrontCover,
			4 => PictureType::BackCover,
			5 => PictureType::LeafletPage,
			6 => PictureType::Media,
			7 => PictureType::LeadArtist,
			8 => PictureType::Artist,
			9 => PictureType::Conductor,
			10 => PictureType::BandOrchestra,
			11 => PictureType::Composer,
			12 => PictureType::Lyricist,
			13 => PictureType::RecLocation,
			14 => PictureType::DuringRecording,
			15 => PictureType::DuringPerformance,
			16 => PictureType::VideoScreenCapture,
			17 => PictureType::ABrightColoredFish,
			18 => PictureType::Illustration,
			19 => PictureType::ArtistLogotype,
			20 => PictureType::PublisherLogotype,
			x => PictureType::Unknown(x),
		}
	}

	/// The APIC type code of this picture type
	pub fn to_idx(&self) -> u32 {
		match self {
			PictureType::Other => 0,
			PictureType::PngFileIcon => 1,
			PictureType::OtherFileIcon => 2,
			PictureType::FrontCover => 3,
			PictureType::BackCover => 4,
			PictureType::LeafletPage => 5,
			PictureType::Media => 6,
			PictureType::LeadArtist => 7,
			PictureType::Artist => 8,
			PictureType::Conductor => 9,
			PictureType::BandOrchestra => 10,
			PictureType::Composer => 11,
			PictureType::Lyricist => 12,
			PictureType::RecLocation => 13,
			PictureType::DuringRecording => 14,
			PictureType::DuringPerformance => 15,
			PictureType::VideoScreenCapture => 16,
			PictureType::ABrightColoredFish => 17,
			PictureType::Illustration => 18,
			PictureType::ArtistLogotype => 19,
			PictureType::PublisherLogotype => 20,
			PictureType::Unknown(x) => *x,
		}
	}
}

impl Display for PictureType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Other => write!(f, "other"),
			Self::PngFileIcon => write!(f, "file icon (png)"),
			Self::OtherFileIcon => write!(f, "file icon"),
			Self::FrontCover => write!(f, "front cover"),
			Self::BackCover => write!(f, "back cover"),
			Self::LeafletPage => write!(f, "leaflet page"),
			Self::Media => write!(f, "media"),
			Self::LeadArtist => write!(f, "lead artist"),
			Self::Artist => write!(f, "artist"),
			Self::Conductor => write!(f, "conductor"),
			Self::BandOrchestra => write!(f, "band"),
			Self::Composer => write!(f, "composer"),
			Self::Lyricist => write!(f, "lyricist"),
			Self::RecLocation => write!(f, "recording location"),
			Self::DuringRecording => write!(f, "during recording"),
			Self::DuringPerformance => write!(f, "during performance"),
			Self::VideoScreenCapture => write!(f, "screen capture"),
			Self::ABrightColoredFish => write!(f, "a bright colored fish"),
			Self::Illustration => write!(f, "illustration"),
			Self::ArtistLogotype => write!(f, "artist logo"),
			Self::PublisherLogotype => write!(f, "publisher logo"),
			Self::Unknown(x) => write!(f, "unknown ({x})"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_round_trip() {
		for i in 0..30 {
			assert_eq!(PictureType::from_idx(i).to_idx(), i);
		}

		assert_eq!(PictureType::from_idx(3), PictureType::FrontCover);
		assert_eq!(PictureType::from_idx(21), PictureType::Unknown(21));
	}
}
