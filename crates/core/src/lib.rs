pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod encoder;
pub mod executor;
pub mod helper;
pub mod quiescence;
pub mod registry;
pub mod service;
pub mod source;
pub mod testing;

pub use classifier::{classify, MediaKind, AUDIO_EXTENSIONS, VIDEO_EXTENSIONS};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
    OutputConfig, QuiescenceConfig, QuiescencePolicy, SyncHelperConfig, WatchConfig,
};
pub use dispatcher::{Dispatcher, DispatcherStats, Disposition};
pub use encoder::{Encoder, EncoderConfig, EncoderError, FfmpegEncoder, TranscodeJob};
pub use executor::{JobOutcome, TranscodeExecutor};
pub use helper::{spawn_sync_helper, HelperError, UnsupervisedChild};
pub use quiescence::{QuiescenceGuard, Readiness};
pub use registry::{Claim, InFlightRegistry};
pub use service::{IngestError, IngestService};
pub use source::{Origin, SourceError, WatchedPath};
