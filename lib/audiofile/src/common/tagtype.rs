//! Cross-format normalized tag types

use smartstring::{LazyCompact, SmartString};
use std::fmt::Display;

/// A universal tag type
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub enum TagType {
	/// A tag we didn't recognize.
	/// Holds the field name exactly as it appeared in the file.
	Other(SmartString<LazyCompact>),

	/// Album name
	Album,
	/// Album artist
	AlbumArtist,
	/// Comment
	Comment,
	/// Release date
	ReleaseDate,
	/// Disk number
	DiskNumber,
	/// Total disks in album
	DiskTotal,
	/// Genre
	Genre,
	/// International standard recording code
	Isrc,
	/// Track lyrics, possibly time-coded
	Lyrics,
	/// This track's number in its album
	TrackNumber,
	/// The total number of tracks in this track's album
	TrackTotal,
	/// The title of this track
	TrackTitle,
	/// This track's artist (the usual `Artist`,
	/// compare to `AlbumArtist`)
	TrackArtist,
	/// The year this track was released
	Year,
}

impl TagType {
	/// Map a vorbis comment field name to a tag type.
	/// Field names are case-insensitive.
	pub fn from_vorbis_key(key: &str) -> Self {
		match &key.to_uppercase()[..] {
			"TITLE" => Self::TrackTitle,
			"ALBUM" => Self::Album,
			"TRACKNUMBER" => Self::TrackNumber,
			"ARTIST" => Self::TrackArtist,
			"ALBUMARTIST" => Self::AlbumArtist,
			"GENRE" => Self::Genre,
			"ISRC" => Self::Isrc,
			"DATE" => Self::ReleaseDate,
			"TOTALTRACKS" | "TRACKTOTAL" => Self::TrackTotal,
			"LYRICS" => Self::Lyrics,
			"COMMENT" | "DESCRIPTION" => Self::Comment,
			"DISCNUMBER" | "DISKNUMBER" => Self::DiskNumber,
			"DISCTOTAL" | "DISKTOTAL" | "TOTALDISCS" => Self::DiskTotal,
			"YEAR" => Self::Year,
			_ => Self::Other(key.into()),
		}
	}

	/// A short, user-facing name for this tag
	pub fn name(&self) -> &str {
		match self {
			Self::Album => "Album",
			Self::AlbumArtist => "AlbumArtist",
			Self::Comment => "Comment",
			Self::ReleaseDate => "ReleaseDate",
			Self::DiskNumber => "DiskNumber",
			Self::DiskTotal => "DiskTotal",
			Self::Genre => "Genre",
			Self::Isrc => "ISRC",
			Self::Lyrics => "Lyrics",
			Self::TrackNumber => "TrackNumber",
			Self::TrackTotal => "TrackTotal",
			Self::TrackTitle => "Title",
			Self::TrackArtist => "Artist",
			Self::Year => "Year",
			Self::Other(x) => x,
		}
	}
}

impl Display for TagType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}
