use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use veritas_claims::AUTO_VERIFY_THRESHOLD;
use veritas_ledger::{DEFAULT_APP_TAG, SyncTimings};

/// Frames sampled per second of room-scan video.
pub const FRAME_SAMPLING_RATE: u32 = 1;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Tag stamped on every activity entry.
    pub app_tag: String,
    /// Sync indicator delays.
    pub sync: SyncTimings,
    /// Policy confidence (0–100) at which a parsed policy is trusted as-is.
    pub auto_verify_threshold: f64,
    /// Frames per second extracted from room-scan video.
    pub frame_sampling_rate: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_tag: DEFAULT_APP_TAG.to_string(),
            sync: SyncTimings::default(),
            auto_verify_threshold: AUTO_VERIFY_THRESHOLD,
            frame_sampling_rate: FRAME_SAMPLING_RATE,
        }
    }
}

impl EngineConfig {
    pub fn with_app_tag(mut self, tag: impl Into<String>) -> Self {
        self.app_tag = tag.into();
        self
    }

    pub fn with_sync_timings(mut self, timings: SyncTimings) -> Self {
        self.sync = timings;
        self
    }

    /// Test hook. Production keeps [`AUTO_VERIFY_THRESHOLD`].
    pub fn with_auto_verify_threshold(mut self, threshold: f64) -> Self {
        self.auto_verify_threshold = threshold;
        self
    }

    /// Test hook. Production keeps [`FRAME_SAMPLING_RATE`].
    pub fn with_frame_sampling_rate(mut self, rate: u32) -> Self {
        self.frame_sampling_rate = rate;
        self
    }

    /// Load from `VERITAS_*` environment variables, falling back to defaults.
    ///
    /// - `VERITAS_APP_TAG`
    /// - `VERITAS_SYNC_SYNCING_MS`, `VERITAS_SYNC_IDLE_MS`
    ///
    /// The verification threshold and frame sampling rate are fixed.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(tag) = lookup("VERITAS_APP_TAG").filter(|t| !t.trim().is_empty()) {
            config.app_tag = tag;
        }
        if let Some(ms) = parse::<u64>(&lookup, "VERITAS_SYNC_SYNCING_MS")? {
            config.sync.syncing = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, "VERITAS_SYNC_IDLE_MS")? {
            config.sync.settle = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
