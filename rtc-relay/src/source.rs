//! Receive sources and the media engine collaborators.
//!
//! A [`RtpIncomingSourceGroup`] bundles the three RTP sub-sources of one
//! encoding: media, retransmission (rtx) and forward error correction (fec).
//! Each sub-source carries the raw counters last pulled from the engine.
//!
//! Counters are refreshed in two explicit phases: the stats cache first asks
//! the [`RtpReceiver`] to [`update`](RtpReceiver::update_source_group) a
//! group, then reads the fields. Nothing refreshes counters behind a getter.

use crate::description::MediaKind;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// RTP synchronization source identifier, 0 when unset.
#[allow(clippy::upper_case_acronyms)]
pub type SSRC = u32;

/// Raw counters of one (spatial, temporal) layer as seen by the engine.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RtpLayerSource {
    pub spatial_layer_id: u8,
    pub temporal_layer_id: u8,
    pub total_bytes: u64,
    pub num_packets: u64,
    /// Instantaneous bitrate of this layer alone, in bps.
    pub bitrate: u64,
}

/// One RTP sub-source (media, rtx or fec) of a receive-source-group.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RtpIncomingSource {
    pub ssrc: SSRC,

    pub lost_packets: u64,
    pub drop_packets: u64,
    pub num_packets: u64,
    pub num_rtcp_packets: u64,
    pub total_bytes: u64,
    pub total_rtcp_bytes: u64,
    pub total_plis: u64,
    pub total_nacks: u64,
    /// Instantaneous bitrate, in bps.
    pub bitrate: u64,

    /// Per-layer counters, unordered and unique per (spatial, temporal) pair.
    pub layers: Vec<RtpLayerSource>,
}

impl RtpIncomingSource {
    pub fn with_ssrc(ssrc: SSRC) -> Self {
        Self {
            ssrc,
            ..Default::default()
        }
    }
}

/// The media, rtx and fec sub-sources of one encoding.
///
/// Exactly one [`IncomingStreamTrack`](crate::IncomingStreamTrack) owns a
/// group; the transport only learns about it through
/// [`RtpTransport::add_incoming_source_group`].
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RtpIncomingSourceGroup {
    pub kind: MediaKind,
    pub rid: Option<String>,
    pub mid: Option<String>,

    pub media: RtpIncomingSource,
    pub rtx: RtpIncomingSource,
    pub fec: RtpIncomingSource,

    /// Round trip time, in ms.
    pub rtt: u32,
    /// Minimum, maximum and average time packets waited in the jitter buffer, in ms.
    pub min_waited_time: u32,
    pub max_waited_time: u32,
    pub avg_waited_time: f64,
}

impl RtpIncomingSourceGroup {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// The non-zero SSRCs of the group in media, rtx, fec order.
    pub fn ssrcs(&self) -> Vec<SSRC> {
        [self.media.ssrc, self.rtx.ssrc, self.fec.ssrc]
            .into_iter()
            .filter(|ssrc| *ssrc != 0)
            .collect()
    }
}

/// The transport (ICE/DTLS/SRTP) end that demultiplexes incoming RTP into
/// registered receive-source-groups.
pub trait RtpTransport: Send {
    /// Starts routing packets of the group's SSRCs/rid to the engine.
    fn add_incoming_source_group(&mut self, group: &RtpIncomingSourceGroup);

    /// Stops routing packets of the group's SSRCs/rid.
    fn remove_incoming_source_group(&mut self, group: &RtpIncomingSourceGroup);
}

/// Depacketizer reassembling encoded frames of one receive-source-group.
pub trait StreamTrackDepacketizer: Send {
    fn stop(&mut self);
}

/// The receiving half of the media engine.
pub trait RtpReceiver: Send {
    /// Requests a keyframe (RTCP PLI) for `ssrc`.
    fn send_pli(&mut self, ssrc: SSRC);

    /// Refreshes the engine's counters for `group` and copies them into it.
    fn update_source_group(&mut self, group: &mut RtpIncomingSourceGroup, now: Instant);

    /// Binds a depacketizer to `group`.
    fn create_depacketizer(
        &mut self,
        group: &RtpIncomingSourceGroup,
    ) -> Box<dyn StreamTrackDepacketizer>;
}

pub type TransportRef = Arc<Mutex<dyn RtpTransport>>;
pub type ReceiverRef = Arc<Mutex<dyn RtpReceiver>>;
