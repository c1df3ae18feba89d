use super::TrackEvent;
use super::incoming::EncodingSsrcs;
use crate::description::MediaKind;
use crate::source::SSRC;
use log::{debug, warn};
use shared::notifier::Notifier;
use std::fmt;
use std::sync::{Arc, Mutex};

pub type OutgoingStreamTrackRef = Arc<Mutex<OutgoingStreamTrack>>;
pub type SenderRef = Arc<Mutex<dyn RtpSender>>;

/// The SSRCs an outgoing track sends with, 0 when unset.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RtpOutgoingSourceGroup {
    pub kind: MediaKind,
    pub media: SSRC,
    pub rtx: SSRC,
    pub fec: SSRC,
}

/// The sending half of the media engine.
pub trait RtpSender: Send {
    /// Stops sending on the group's SSRCs.
    fn release_outgoing_source_group(&mut self, group: &RtpOutgoingSourceGroup);
}

/// A track sending media through an [`RtpSender`].
///
/// Only the lifecycle needed to pair it with an incoming track is modeled.
pub struct OutgoingStreamTrack {
    id: String,
    media: MediaKind,
    sender: Option<SenderRef>,
    source: RtpOutgoingSourceGroup,
    notifier: Notifier<TrackEvent>,
}

impl fmt::Debug for OutgoingStreamTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingStreamTrack")
            .field("id", &self.id)
            .field("media", &self.media)
            .field("stopped", &self.sender.is_none())
            .field("source", &self.source)
            .finish()
    }
}

impl OutgoingStreamTrack {
    pub fn new(
        id: impl Into<String>,
        media: MediaKind,
        sender: SenderRef,
        source: RtpOutgoingSourceGroup,
    ) -> Self {
        Self {
            id: id.into(),
            media,
            sender: Some(sender),
            source,
            notifier: Notifier::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn media(&self) -> MediaKind {
        self.media
    }

    pub fn ssrcs(&self) -> EncodingSsrcs {
        EncodingSsrcs {
            media: self.source.media,
            rtx: self.source.rtx,
            fec: self.source.fec,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.sender.is_none()
    }

    pub fn on<F>(&mut self, event: TrackEvent, handler: F)
    where
        F: FnMut(&TrackEvent) + Send + 'static,
    {
        self.notifier.on(event, handler);
    }

    pub fn once<F>(&mut self, event: TrackEvent, handler: F)
    where
        F: FnMut(&TrackEvent) + Send + 'static,
    {
        self.notifier.once(event, handler);
    }

    /// Releases the source group and fires [`TrackEvent::Stopped`]. Later
    /// calls do nothing.
    pub fn stop(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };

        match sender.lock() {
            Ok(mut sender) => sender.release_outgoing_source_group(&self.source),
            Err(err) => warn!("outgoing track {:?} source not released: {}", self.id, err),
        }

        debug!("outgoing track {:?} stopped", self.id);
        self.notifier.emit(&TrackEvent::Stopped);
    }
}
