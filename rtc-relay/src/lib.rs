//! RTC Relay - inbound media tracks for a sans-I/O media relay.
//!
//! This crate maps signaled stream descriptions (per-encoding SSRC groupings,
//! simulcast `rid`/`SIM` signaling, `FID`/`FEC-FR` redundancy groups) onto
//! per-encoding receive sources, aggregates per-encoding and per-layer
//! statistics, and derives which simulcast encodings and layers are active
//! for forwarding decisions.
//!
//! The RTP engine, the ICE/DTLS transport, depacketization and SDP handling
//! are external collaborators reached through the traits in [`source`] and
//! [`streamer`]. Nothing in this crate performs I/O or spawns tasks; every
//! call runs on the caller's thread and every time-dependent operation takes
//! an explicit `now`.
//!
//! # Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`layer`] | Cumulative per-(spatial, temporal) layer aggregation |
//! | [`stats`] | Per-encoding stats cache, simulcast ranking, active layers |
//! | [`source_group`] | Receive-source-group construction from a [`TrackInfo`] |
//! | [`track`] | [`IncomingStreamTrack`] lifecycle, [`OutgoingStreamTrack`] |
//! | [`stream`] | [`IncomingStream`], a collection of incoming tracks |
//! | [`streamer`] | [`StreamerSession`], point-to-point RTP without SDP |
//!
//! # Quick Start
//!
//! ```ignore
//! use rtc_relay::{IncomingStream, IncomingTrackConfig, StreamEventKind};
//! use std::time::Instant;
//!
//! let mut stream = IncomingStream::new(transport, receiver, &stream_info, IncomingTrackConfig::default());
//! stream.on(StreamEventKind::Stopped, |_| log::info!("stream stopped"));
//!
//! if let Some(track) = stream.get_track("video0") {
//!     let mut track = track.lock().unwrap();
//!     let layers = track.get_active_layers(Instant::now());
//!     for layer in &layers.layers {
//!         // pick a layer to forward
//!     }
//! }
//! ```

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod config;
pub mod description;
pub mod layer;
pub mod source;
pub mod source_group;
pub mod stats;
pub mod stream;
pub mod streamer;
pub mod track;

pub use config::{DEFAULT_STATS_FRESHNESS, IncomingTrackConfig, IncomingTrackConfigBuilder};
pub use description::{
    CodecInfo, ENCODING_PARAM_SSRC, MediaInfo, MediaKind, SEMANTICS_FEC_FR, SEMANTICS_FID,
    SEMANTICS_SIM, SourceGroupInfo, StreamInfo, TrackEncodingInfo, TrackInfo,
};
pub use layer::{Layer, MAX_LAYER_ID};
pub use source::{
    ReceiverRef, RtpIncomingSource, RtpIncomingSourceGroup, RtpLayerSource, RtpReceiver,
    RtpTransport, SSRC, StreamTrackDepacketizer, TransportRef,
};
pub use source_group::{SourceGroupStrategy, build_incoming_source_groups};
pub use stats::{
    ActiveEncoding, ActiveLayersInfo, IncomingAllStats, IncomingStats, IncomingStatsCache,
    select_active_layers,
};
pub use stream::{IncomingStream, StreamEvent, StreamEventKind};
pub use streamer::{
    RtpCodecMapping, RtpSession, RtpSessionParameters, SessionEvent, StreamerEndpoint,
    StreamerSession,
};
pub use track::{
    Encoding, EncodingSsrcs, IncomingStreamTrack, IncomingStreamTrackRef, OutgoingStreamTrack,
    OutgoingStreamTrackRef, RtpOutgoingSourceGroup, RtpSender, SenderRef, TrackEvent,
};
