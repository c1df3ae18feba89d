//! Incoming track configuration.

use std::time::Duration;

/// Age after which a cached per-encoding stats entry is recomputed.
pub const DEFAULT_STATS_FRESHNESS: Duration = Duration::from_millis(200);

/// Configuration shared by every [`IncomingStreamTrack`](crate::IncomingStreamTrack)
/// created by an [`IncomingStream`](crate::IncomingStream) or a
/// [`StreamerSession`](crate::StreamerSession).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IncomingTrackConfig {
    stats_freshness: Duration,
}

impl Default for IncomingTrackConfig {
    fn default() -> Self {
        Self {
            stats_freshness: DEFAULT_STATS_FRESHNESS,
        }
    }
}

impl IncomingTrackConfig {
    /// How long a stats entry is served from cache before the receive
    /// source is asked for fresh counters.
    pub fn stats_freshness(&self) -> Duration {
        self.stats_freshness
    }
}

/// Builder for [`IncomingTrackConfig`].
///
/// # Example
///
/// ```
/// use rtc_relay::IncomingTrackConfigBuilder;
/// use std::time::Duration;
///
/// let config = IncomingTrackConfigBuilder::new()
///     .with_stats_freshness(Duration::from_millis(500))
///     .build();
/// assert_eq!(config.stats_freshness(), Duration::from_millis(500));
/// ```
#[derive(Debug, Default)]
pub struct IncomingTrackConfigBuilder {
    config: IncomingTrackConfig,
}

impl IncomingTrackConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stats freshness window.
    pub fn with_stats_freshness(mut self, stats_freshness: Duration) -> Self {
        self.config.stats_freshness = stats_freshness;
        self
    }

    pub fn build(self) -> IncomingTrackConfig {
        self.config
    }
}
