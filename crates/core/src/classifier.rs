//! Maps arriving files to the transcode profile that applies to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Extensions transcoded with the video profile.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "flv", "wmv", "m4v", "mpg", "mpeg", "webm",
];

/// Extensions transcoded with the audio profile.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a", "aac", "ogg", "wma", "opus"];

/// What kind of media a path holds, judged by its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Ignored,
}

impl MediaKind {
    /// Whether a transcode job is created for this kind.
    pub fn is_transcodable(&self) -> bool {
        !matches!(self, Self::Ignored)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a path by its lowercased extension.
///
/// Total and side-effect free: anything without a recognised extension
/// (including no extension, or one that is not UTF-8) is [`MediaKind::Ignored`].
pub fn classify(path: &Path) -> MediaKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return MediaKind::Ignored;
    };
    let ext = ext.to_ascii_lowercase();

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Video
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Audio
    } else {
        MediaKind::Ignored
    }
}
