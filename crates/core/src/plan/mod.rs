//! Transform plan builder.
//!
//! Maps a validated [`ProcessingRequest`](crate::request::ProcessingRequest)
//! and the clip's probed duration to a [`TransformPlan`]: either publish the
//! upload as-is, or run a single ffmpeg invocation.
//!
//! | facing      | audio            | music URL | plan                         |
//! |-------------|------------------|-----------|------------------------------|
//! | environment | original         | no        | pass-through                 |
//! | user        | original         | no        | mirror only (audio copied)   |
//! | any         | original         | yes       | remux, re-encode only if flip|
//! | any         | mute             | any       | video only                   |
//! | any         | music            | any       | music replaces audio         |
//! | any         | music+original   | any       | music mixed over audio       |
//!
//! Every ffmpeg output is written with `+faststart` so it can be played while
//! still downloading.

mod builder;
mod types;

pub use builder::{build_plan, mix_audio_graph, replace_audio_graph, select_kind};
pub use types::{EncoderSettings, PlanKind, PlanPaths, TranscodeCommand, TransformPlan};
