//! Per-encoding statistics of an incoming track.
//!
//! This module provides:
//! - [`IncomingStats`] - one media/rtx/fec sub-source snapshot with cumulative layers
//! - [`IncomingAllStats`] - one encoding's snapshot, ranked by simulcast index
//! - [`IncomingStatsCache`] - the lazily refreshed per-encoding cache
//! - [`select_active_layers`] - active/inactive encodings and the global layer list

#[cfg(test)]
mod stats_test;

mod active_layers;

pub use active_layers::{ActiveEncoding, ActiveLayersInfo, select_active_layers};

use crate::layer::{Layer, aggregate_layers};
use crate::source::{RtpIncomingSource, RtpIncomingSourceGroup, RtpReceiver};
use log::trace;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Statistics of one RTP sub-source (media, rtx or fec).
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingStats {
    pub lost_packets: u64,
    pub drop_packets: u64,
    pub num_packets: u64,
    pub num_rtcp_packets: u64,
    pub total_bytes: u64,
    pub total_rtcp_bytes: u64,
    pub total_plis: u64,
    pub total_nacks: u64,
    pub bitrate: u64,
    /// Cumulative layers, see [`aggregate_layers`].
    pub layers: Vec<Layer>,
}

impl IncomingStats {
    /// Copies the raw counters of `source` and aggregates its layers.
    pub fn from_source(source: &RtpIncomingSource) -> Self {
        Self {
            lost_packets: source.lost_packets,
            drop_packets: source.drop_packets,
            num_packets: source.num_packets,
            num_rtcp_packets: source.num_rtcp_packets,
            total_bytes: source.total_bytes,
            total_rtcp_bytes: source.total_rtcp_bytes,
            total_plis: source.total_plis,
            total_nacks: source.total_nacks,
            bitrate: source.bitrate,
            layers: aggregate_layers(&source.layers),
        }
    }
}

/// Statistics of one encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingAllStats {
    pub rtt: u32,
    pub min_wait_time: u32,
    pub max_wait_time: u32,
    pub avg_wait_time: f64,

    pub media: IncomingStats,
    pub rtx: IncomingStats,
    pub fec: IncomingStats,

    /// Media bitrate, in bps.
    pub bitrate: u64,
    /// Media + fec + rtx bitrate, in bps.
    pub total: u64,

    /// Rank of this encoding by descending bitrate, starting at 1, or -1 when
    /// the encoding carries no media. Reassigned on every stats query.
    pub simulcast_idx: i32,

    #[serde(skip)]
    timestamp: Instant,
}

impl IncomingAllStats {
    pub fn from_source_group(group: &RtpIncomingSourceGroup, now: Instant) -> Self {
        let media = IncomingStats::from_source(&group.media);
        let fec = IncomingStats::from_source(&group.fec);
        let rtx = IncomingStats::from_source(&group.rtx);

        let bitrate = media.bitrate;
        let total = media.bitrate + fec.bitrate + rtx.bitrate;

        Self {
            rtt: group.rtt,
            min_wait_time: group.min_waited_time,
            max_wait_time: group.max_waited_time,
            avg_wait_time: group.avg_waited_time,
            media,
            rtx,
            fec,
            bitrate,
            total,
            simulcast_idx: -1,
            timestamp: now,
        }
    }

    /// When the counters of this snapshot were pulled from the engine.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    fn is_stale(&self, now: Instant, freshness: Duration) -> bool {
        now.saturating_duration_since(self.timestamp) > freshness
    }
}

/// Per-encoding stats cache, keyed by encoding id.
///
/// # Thread Safety
///
/// This struct is not thread-safe. It is owned by its track and only
/// refreshed through the track's `&mut self` methods.
#[derive(Debug)]
pub struct IncomingStatsCache {
    freshness: Duration,
    entries: BTreeMap<String, IncomingAllStats>,
}

impl IncomingStatsCache {
    pub fn new(freshness: Duration) -> Self {
        Self {
            freshness,
            entries: BTreeMap::new(),
        }
    }

    /// Refreshes stale entries and re-ranks the whole cache.
    ///
    /// An encoding without an entry, or whose entry is older than the
    /// freshness window, is updated through `receiver` and replaced. Fresh
    /// entries are kept as they are, timestamp included. The simulcast index
    /// of every cached entry is then recomputed, refreshed or not.
    pub fn refresh<'a, I>(
        &mut self,
        sources: I,
        receiver: &mut dyn RtpReceiver,
        now: Instant,
    ) -> &BTreeMap<String, IncomingAllStats>
    where
        I: IntoIterator<Item = (&'a str, &'a mut RtpIncomingSourceGroup)>,
    {
        for (id, group) in sources {
            let stale = self
                .entries
                .get(id)
                .is_none_or(|entry| entry.is_stale(now, self.freshness));
            if !stale {
                continue;
            }

            receiver.update_source_group(group, now);
            let stats = IncomingAllStats::from_source_group(group, now);
            trace!(
                "encoding {:?} refreshed: bitrate={} total={}",
                id, stats.bitrate, stats.total
            );
            self.entries.insert(id.to_owned(), stats);
        }

        self.assign_simulcast_index();

        &self.entries
    }

    pub fn entries(&self) -> &BTreeMap<String, IncomingAllStats> {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Ranks entries by descending media bitrate. Equal bitrates keep encoding
    /// id order; zero bitrate entries get -1 and do not consume a rank.
    fn assign_simulcast_index(&mut self) {
        let mut ranked: Vec<&mut IncomingAllStats> = self.entries.values_mut().collect();
        ranked.sort_by(|a, b| b.bitrate.cmp(&a.bitrate));

        let mut simulcast_idx = 0;
        for stats in ranked {
            if stats.bitrate > 0 {
                simulcast_idx += 1;
                stats.simulcast_idx = simulcast_idx;
            } else {
                stats.simulcast_idx = -1;
            }

            for layer in &mut stats.media.layers {
                layer.simulcast_idx = Some(stats.simulcast_idx);
            }
        }
    }
}
