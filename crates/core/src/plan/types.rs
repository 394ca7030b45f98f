//! Plan types.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::TranscoderConfig;

/// The decision cases of the plan builder.
///
/// Selected by an exhaustive match on facing mode, audio mode and whether a
/// music URL was supplied; see [`super::select_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanKind {
    /// Publish the upload untouched.
    PassThrough,
    /// Flip the picture, copy the audio.
    MirrorOnly,
    /// Keep the original audio; copy both streams unless a flip is needed.
    Remux { flip: bool },
    /// Drop the audio track.
    Mute { flip: bool },
    /// Replace the audio with the music track.
    ReplaceAudio { flip: bool },
    /// Mix the music track over the original audio.
    MixAudio { flip: bool },
}

impl PlanKind {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::MirrorOnly => "mirror_only",
            Self::Remux { .. } => "remux",
            Self::Mute { .. } => "mute",
            Self::ReplaceAudio { .. } => "replace_audio",
            Self::MixAudio { .. } => "mix_audio",
        }
    }

    pub fn flips(&self) -> bool {
        match self {
            Self::PassThrough => false,
            Self::MirrorOnly => true,
            Self::Remux { flip }
            | Self::Mute { flip }
            | Self::ReplaceAudio { flip }
            | Self::MixAudio { flip } => *flip,
        }
    }
}

/// A single ffmpeg invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeCommand {
    pub kind: PlanKind,
    /// Full argument list, excluding the binary and log-level flags.
    pub args: Vec<String>,
    /// File the invocation is expected to produce.
    pub output_path: PathBuf,
}

impl TranscodeCommand {
    /// Whether `flag` is immediately followed by `value` somewhere in the args.
    pub fn has_pair(&self, flag: &str, value: &str) -> bool {
        self.args
            .windows(2)
            .any(|pair| pair[0] == flag && pair[1] == value)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }

    /// All values following occurrences of `flag`, in order.
    pub fn values_of(&self, flag: &str) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
            .collect()
    }
}

/// What to do with an uploaded clip.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformPlan {
    /// No transcoding; the upload itself is published.
    PassThrough,
    /// Single-input horizontal flip.
    MirrorOnly(TranscodeCommand),
    /// Everything else: stream copy, mute, music replacement or mixing.
    FullTransform(TranscodeCommand),
}

impl TransformPlan {
    pub fn kind(&self) -> PlanKind {
        match self {
            Self::PassThrough => PlanKind::PassThrough,
            Self::MirrorOnly(cmd) | Self::FullTransform(cmd) => cmd.kind,
        }
    }

    pub fn command(&self) -> Option<&TranscodeCommand> {
        match self {
            Self::PassThrough => None,
            Self::MirrorOnly(cmd) | Self::FullTransform(cmd) => Some(cmd),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough)
    }
}

/// Local files a plan refers to besides the uploaded clip.
#[derive(Debug, Clone, Copy)]
pub struct PlanPaths<'a> {
    /// Downloaded music track, when the audio mode needs one.
    pub music: Option<&'a Path>,
    /// Where the transcoder should write its output.
    pub output: &'a Path,
}

/// Video encoder knobs used whenever the picture is re-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub codec: String,
    pub preset: String,
    pub crf: u8,
    /// Audio codec used whenever audio is re-encoded.
    pub audio_codec: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 20,
            audio_codec: "aac".to_string(),
        }
    }
}

impl From<&TranscoderConfig> for EncoderSettings {
    fn from(config: &TranscoderConfig) -> Self {
        Self {
            preset: config.video_preset.clone(),
            crf: config.video_crf,
            ..Default::default()
        }
    }
}
