//! Inbound request model.
//!
//! Raw multipart form values arrive as a [`ProcessingForm`] and are validated
//! into a strongly typed [`ProcessingRequest`] before any I/O happens.

mod types;

pub use types::{
    clamp_volume, AudioMode, FacingMode, MusicSettings, ProcessingForm, ProcessingRequest,
};
