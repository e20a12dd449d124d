//! Components shared between audio formats

pub mod picturetype;
pub mod tagtype;
pub mod vorbiscomment;
