//! Processing request model and form validation.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ValidationError;

/// Which camera captured the clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera. Footage is already correctly oriented.
    #[default]
    Environment,
    /// Front camera. Footage needs a horizontal mirror flip.
    User,
}

impl FacingMode {
    /// Lenient parse: only `"user"` selects the front camera.
    pub fn from_form(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("user") => Self::User,
            _ => Self::Environment,
        }
    }

    pub fn needs_flip(self) -> bool {
        matches!(self, Self::User)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::User => "user",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy for the output's audio track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioMode {
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "mute")]
    Mute,
    #[serde(rename = "music")]
    Music,
    #[serde(rename = "music+original")]
    MusicWithOriginal,
}

impl AudioMode {
    /// Whether an external music track has to be downloaded.
    pub fn needs_music(self) -> bool {
        matches!(self, Self::Music | Self::MusicWithOriginal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Mute => "mute",
            Self::Music => "music",
            Self::MusicWithOriginal => "music+original",
        }
    }
}

impl FromStr for AudioMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(Self::Original),
            "mute" => Ok(Self::Mute),
            "music" => Ok(Self::Music),
            "music+original" => Ok(Self::MusicWithOriginal),
            other => Err(ValidationError::invalid(
                "audioMode",
                format!("unknown value '{}'", other),
            )),
        }
    }
}

impl fmt::Display for AudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim offset and gain applied to the music track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MusicSettings {
    /// Seek offset into the music track, never negative.
    pub start_secs: f64,
    /// Linear gain, always within `[0, 1]`.
    pub volume: f64,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            start_secs: 0.0,
            volume: 1.0,
        }
    }
}

impl MusicSettings {
    /// Builds settings from raw form values.
    ///
    /// An absent start is 0 and an absent volume is 1. Unparseable values fall
    /// back to 0; parsed volumes are clamped into `[0, 1]`.
    pub fn from_form(start: Option<&str>, volume: Option<&str>) -> Self {
        let start_secs = start
            .and_then(parse_number)
            .filter(|s| *s > 0.0)
            .unwrap_or(0.0);

        let volume = match volume {
            None => 1.0,
            Some(raw) => clamp_volume(parse_number(raw).unwrap_or(0.0)),
        };

        Self { start_secs, volume }
    }
}

/// Clamps a gain into `[0, 1]`.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() || volume <= 0.0 {
        // also folds -0.0, which would render as "-0"
        return 0.0;
    }
    volume.min(1.0)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Raw form fields of an upload, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingForm {
    pub facing_mode: Option<String>,
    pub audio_mode: Option<String>,
    pub music_url: Option<String>,
    pub music_start: Option<String>,
    pub music_volume: Option<String>,
    pub destination_url: Option<String>,
}

impl ProcessingForm {
    /// Stores a named form field. Returns `false` for unknown names.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "facingMode" => &mut self.facing_mode,
            "audioMode" => &mut self.audio_mode,
            "musicUrl" => &mut self.music_url,
            "musicStart" => &mut self.music_start,
            "musicVolume" => &mut self.music_volume,
            "muxUploadUrl" | "destinationUploadUrl" => &mut self.destination_url,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A validated processing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingRequest {
    pub video_path: PathBuf,
    pub facing_mode: FacingMode,
    pub audio_mode: AudioMode,
    pub music_url: Option<String>,
    pub music: MusicSettings,
    pub destination_url: String,
}

impl ProcessingRequest {
    /// Validates raw form fields against an uploaded clip.
    ///
    /// Runs before any I/O. Checks, in order: the clip, the destination URL,
    /// the audio mode, and the music URL when the audio mode needs one.
    pub fn from_form(
        form: &ProcessingForm,
        video_path: Option<PathBuf>,
    ) -> Result<Self, ValidationError> {
        let video_path = video_path.ok_or_else(|| ValidationError::missing("video"))?;

        let destination_url = non_empty(form.destination_url.as_deref())
            .ok_or_else(|| ValidationError::missing("muxUploadUrl"))?;
        validate_destination(destination_url)?;

        let audio_mode = match non_empty(form.audio_mode.as_deref()) {
            Some(raw) => raw.parse::<AudioMode>()?,
            None => AudioMode::default(),
        };

        let music_url = non_empty(form.music_url.as_deref()).map(str::to_string);
        if audio_mode.needs_music() && music_url.is_none() {
            return Err(ValidationError::missing("musicUrl"));
        }

        Ok(Self {
            video_path,
            facing_mode: FacingMode::from_form(form.facing_mode.as_deref()),
            audio_mode,
            music_url,
            music: MusicSettings::from_form(
                form.music_start.as_deref(),
                form.music_volume.as_deref(),
            ),
            destination_url: destination_url.to_string(),
        })
    }

    pub fn has_music_url(&self) -> bool {
        self.music_url.is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate_destination(raw: &str) -> Result<(), ValidationError> {
    let url = Url::parse(raw)
        .map_err(|e| ValidationError::invalid("muxUploadUrl", e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ValidationError::invalid(
            "muxUploadUrl",
            format!("unsupported scheme '{}'", other),
        )),
    }
}
