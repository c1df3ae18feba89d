//! Incoming and outgoing media tracks.
//!
//! An [`IncomingStreamTrack`] owns one receive-source-group per encoding and
//! goes through two states, active then stopped. It never learns about its
//! owner: owners subscribe to [`TrackEvent::Stopped`] and forget the track
//! when it fires.


mod incoming;
mod outgoing;

pub use incoming::{Encoding, EncodingSsrcs, IncomingStreamTrack, IncomingStreamTrackRef};
pub use outgoing::{
    OutgoingStreamTrack, OutgoingStreamTrackRef, RtpOutgoingSourceGroup, RtpSender, SenderRef,
};

use shared::notifier::Event;

/// Lifecycle notifications of a track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TrackEvent {
    /// The first consumer attached.
    Attached,
    /// The last consumer detached.
    Detached,
    /// The track stopped, fired once.
    Stopped,
}

impl Event for TrackEvent {
    type Kind = TrackEvent;

    fn kind(&self) -> TrackEvent {
        *self
    }
}
