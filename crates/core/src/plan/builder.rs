//! Transform plan builder.

use std::path::Path;

use crate::error::ValidationError;
use crate::request::{clamp_volume, AudioMode, FacingMode, ProcessingRequest};

use super::types::{EncoderSettings, PlanKind, PlanPaths, TranscodeCommand, TransformPlan};

/// Selects the decision case for a request.
///
/// Arms are in priority order; the match is exhaustive over every
/// (facing mode, audio mode, music URL present) combination.
pub fn select_kind(request: &ProcessingRequest) -> PlanKind {
    let flip = request.facing_mode.needs_flip();
    match (
        request.facing_mode,
        request.audio_mode,
        request.has_music_url(),
    ) {
        (FacingMode::Environment, AudioMode::Original, false) => PlanKind::PassThrough,
        (FacingMode::User, AudioMode::Original, false) => PlanKind::MirrorOnly,
        (_, AudioMode::Original, true) => PlanKind::Remux { flip },
        (_, AudioMode::Mute, _) => PlanKind::Mute { flip },
        (_, AudioMode::Music, _) => PlanKind::ReplaceAudio { flip },
        (_, AudioMode::MusicWithOriginal, _) => PlanKind::MixAudio { flip },
    }
}

/// Builds the transform plan for a validated request.
///
/// `duration` is the probed length of the clip; when unknown the music track
/// is left untrimmed and `-shortest` bounds the output instead.
pub fn build_plan(
    request: &ProcessingRequest,
    paths: &PlanPaths<'_>,
    duration: Option<f64>,
    encoder: &EncoderSettings,
) -> Result<TransformPlan, ValidationError> {
    if request.audio_mode.needs_music() && !request.has_music_url() {
        return Err(ValidationError::missing("musicUrl"));
    }

    let kind = select_kind(request);
    let video = path_arg(&request.video_path);
    let mut args = vec!["-y".to_string()];

    match kind {
        PlanKind::PassThrough => return Ok(TransformPlan::PassThrough),

        PlanKind::MirrorOnly => {
            args.extend(["-i".to_string(), video]);
            args.extend(flip_args());
            args.extend(video_encode_args(encoder));
            args.extend(["-c:a".to_string(), "copy".to_string()]);
        }

        PlanKind::Remux { flip } => {
            args.extend(["-i".to_string(), video]);
            if flip {
                args.extend(flip_args());
                args.extend(video_encode_args(encoder));
            } else {
                args.extend(["-c:v".to_string(), "copy".to_string()]);
            }
            args.extend(["-c:a".to_string(), "copy".to_string()]);
        }

        PlanKind::Mute { flip } => {
            args.extend(["-i".to_string(), video]);
            if flip {
                args.extend(flip_args());
            }
            args.extend([
                "-map".to_string(),
                "0:v:0".to_string(),
                "-an".to_string(),
            ]);
            if flip {
                args.extend(video_encode_args(encoder));
            } else {
                args.extend(["-c:v".to_string(), "copy".to_string()]);
            }
        }

        PlanKind::ReplaceAudio { flip } | PlanKind::MixAudio { flip } => {
            let music = paths
                .music
                .ok_or_else(|| ValidationError::missing("music track"))?;
            let volume = clamp_volume(request.music.volume);
            let graph = match kind {
                PlanKind::MixAudio { .. } => mix_audio_graph(volume),
                _ => replace_audio_graph(volume, duration),
            };

            args.extend([
                "-i".to_string(),
                video,
                "-ss".to_string(),
                format_number(request.music.start_secs.max(0.0)),
                "-i".to_string(),
                path_arg(music),
                "-filter_complex".to_string(),
                graph,
                "-map".to_string(),
                "0:v:0".to_string(),
                "-map".to_string(),
                "[a]".to_string(),
            ]);
            if flip {
                args.extend(flip_args());
            }
            args.push("-shortest".to_string());
            args.extend(video_encode_args(encoder));
            args.extend(["-c:a".to_string(), encoder.audio_codec.clone()]);
        }
    }

    args.extend(faststart_args());
    args.push(path_arg(paths.output));

    let command = TranscodeCommand {
        kind,
        args,
        output_path: paths.output.to_path_buf(),
    };

    Ok(match kind {
        PlanKind::MirrorOnly => TransformPlan::MirrorOnly(command),
        _ => TransformPlan::FullTransform(command),
    })
}

/// Filter graph replacing the clip's audio with the music track.
///
/// Scales the music by `volume`, trims it to `duration` when known, and
/// resets its timestamps.
pub fn replace_audio_graph(volume: f64, duration: Option<f64>) -> String {
    let tail = match usable_duration(duration) {
        Some(secs) => format!("atrim=0:{},asetpts=N/SR/TB", format_number(secs)),
        None => "asetpts=N/SR/TB".to_string(),
    };
    format!(
        "[1:a]volume={}[ma];[ma]{}[a]",
        format_number(clamp_volume(volume)),
        tail
    )
}

/// Filter graph mixing the volume-scaled music track over the clip's audio.
///
/// The mix lasts as long as the clip's own audio.
pub fn mix_audio_graph(volume: f64) -> String {
    format!(
        "[1:a]volume={}[ma];[0:a][ma]amix=inputs=2:duration=first:dropout_transition=2[a]",
        format_number(clamp_volume(volume))
    )
}

fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

/// Shortest decimal rendering: `1`, `0.3`, `12.5`.
fn format_number(value: f64) -> String {
    // -0 would render as "-0"
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn flip_args() -> [String; 2] {
    ["-vf".to_string(), "hflip".to_string()]
}

fn video_encode_args(encoder: &EncoderSettings) -> [String; 6] {
    [
        "-c:v".to_string(),
        encoder.codec.clone(),
        "-preset".to_string(),
        encoder.preset.clone(),
        "-crf".to_string(),
        encoder.crf.to_string(),
    ]
}

fn faststart_args() -> [String; 2] {
    ["-movflags".to_string(), "+faststart".to_string()]
}
