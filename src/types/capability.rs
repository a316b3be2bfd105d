//! Generation capabilities

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// A supported generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ImageToImage,
    ImageToVideo,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::ImageToImage, Capability::ImageToVideo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImageToImage => "image-to-image",
            Self::ImageToVideo => "image-to-video",
        }
    }

    /// Noun used in user-facing messages ("Image generation failed ...").
    pub const fn media_noun(self) -> &'static str {
        match self {
            Self::ImageToImage => "Image",
            Self::ImageToVideo => "Video",
        }
    }

    /// Field carrying the media reference in a success response body.
    pub const fn response_field(self) -> &'static str {
        match self {
            Self::ImageToImage => "imageUrl",
            Self::ImageToVideo => "videoUrl",
        }
    }

    /// Top-level prefix for persisted objects.
    pub const fn storage_prefix(self) -> &'static str {
        match self {
            Self::ImageToImage => "image-to-images",
            Self::ImageToVideo => "image-to-videos",
        }
    }

    /// Whether the backend runs jobs asynchronously and needs reconciliation.
    pub const fn is_async(self) -> bool {
        matches!(self, Self::ImageToVideo)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image-to-image" => Ok(Self::ImageToImage),
            "image-to-video" => Ok(Self::ImageToVideo),
            other => Err(format!("Unknown capability: {other}")),
        }
    }
}

/// Allowed image-to-video clip lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoDuration {
    Five,
    Ten,
}

impl VideoDuration {
    /// Allowed durations in seconds.
    pub const ALLOWED: [u32; 2] = [5, 10];

    pub const fn seconds(self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
        }
    }
}

impl TryFrom<u32> for VideoDuration {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            other => Err(other),
        }
    }
}

impl Serialize for VideoDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_round_trips_through_str() {
        for capability in Capability::ALL {
            assert_eq!(capability.as_str().parse::<Capability>(), Ok(capability));
        }
        assert!("text-to-image".parse::<Capability>().is_err());
    }

    #[test]
    fn only_video_is_async() {
        assert!(!Capability::ImageToImage.is_async());
        assert!(Capability::ImageToVideo.is_async());
    }

    #[test]
    fn duration_accepts_only_allowed_values() {
        assert_eq!(VideoDuration::try_from(5), Ok(VideoDuration::Five));
        assert_eq!(VideoDuration::try_from(10), Ok(VideoDuration::Ten));
        assert_eq!(VideoDuration::try_from(7), Err(7));
        assert_eq!(serde_json::to_value(VideoDuration::Ten).unwrap(), 10);
    }
}
