pub mod config;
pub mod error;
pub mod metrics;
pub mod plan;
pub mod processor;
pub mod remote;
pub mod request;
pub mod scratch;
pub mod testing;
pub mod transcoder;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, HttpConfig,
    ScratchConfig, ServerConfig, TranscoderConfig,
};
pub use error::{ProcessingError, ValidationError};
pub use plan::{build_plan, EncoderSettings, PlanKind, TranscodeCommand, TransformPlan};
pub use processor::RequestProcessor;
pub use remote::{
    AssetFetcher, AssetPublisher, FetchError, HttpAssetClient, PublishError, PublishResult,
};
pub use request::{AudioMode, FacingMode, MusicSettings, ProcessingForm, ProcessingRequest};
pub use scratch::{ScratchDir, TempArtifact};
pub use transcoder::{FfmpegTranscoder, TranscodeError, TranscodeOutcome, Transcoder};
