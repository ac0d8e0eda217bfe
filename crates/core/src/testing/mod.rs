//! Testing utilities and mock implementations.
//!
//! Lets the dispatcher and the ingest service run end to end without ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediawatch_core::testing::{fixtures, MockEncoder};
//!
//! let encoder = MockEncoder::new();
//! encoder.fail_path("/input/broken.mkv", "moov atom not found");
//! assert!(fixtures::wait_for(Duration::from_secs(5), || encoder.encode_count() == 2).await);
//! ```

mod mock_encoder;

pub use mock_encoder::{MockEncoder, RecordedEncode};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::time::Duration;

    use crate::config::{Config, OutputConfig, QuiescenceConfig};

    /// Output roots under `root`, laid out like a production mount.
    pub fn output_under(root: &Path) -> OutputConfig {
        OutputConfig {
            movies_dir: root.join("output").join("movies"),
            tv_dir: root.join("output").join("tv"),
            music_dir: root.join("output").join("music"),
        }
    }

    /// Config rooted at `root` (`root/input`, `root/output/*`) with no
    /// quiescence delay.
    pub fn config_under(root: &Path) -> Config {
        let mut config = Config::default();
        config.watch.input_dir = root.join("input");
        config.watch.quiescence = QuiescenceConfig {
            delay_ms: 0,
            ..Default::default()
        };
        config.output = output_under(root);
        config
    }

    /// Polls `check` until it holds or `timeout` passes.
    pub async fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        check()
    }
}
