//! Streamer sessions: plain RTP in and out of one port, without signaling.
//!
//! A [`StreamerSession`] pairs one [`IncomingStreamTrack`] and one
//! [`OutgoingStreamTrack`] around a single [`RtpSession`], either listening
//! on a local port or sending to a remote address. Codec and payload type
//! mappings come from a [`MediaInfo`] instead of an SDP negotiation.


use crate::config::IncomingTrackConfig;
use crate::description::{CodecInfo, MediaInfo};
use crate::source::{ReceiverRef, RtpIncomingSourceGroup};
use crate::source_group::frame_kind;
use crate::track::{
    IncomingStreamTrack, IncomingStreamTrackRef, OutgoingStreamTrack, OutgoingStreamTrackRef,
    RtpOutgoingSourceGroup, SenderRef, TrackEvent,
};
use log::{debug, warn};
use shared::notifier::{Event, Notifier};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Weak};

/// Where the RTP session sends or receives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamerEndpoint {
    /// Receive on a local UDP port.
    Local { port: u16 },
    /// Send to a remote address.
    Remote { addr: SocketAddr },
}

/// One codec to payload type mapping of an RTP session.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RtpCodecMapping {
    pub codec: String,
    pub payload_type: u8,
    pub rtx: Option<u8>,
}

impl From<&CodecInfo> for RtpCodecMapping {
    fn from(codec: &CodecInfo) -> Self {
        Self {
            codec: codec.codec.clone(),
            payload_type: codec.payload_type,
            rtx: codec.rtx,
        }
    }
}

/// Initialization parameters of an [`RtpSession`].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RtpSessionParameters {
    pub codecs: Vec<RtpCodecMapping>,
}

impl From<&MediaInfo> for RtpSessionParameters {
    fn from(media: &MediaInfo) -> Self {
        Self {
            codecs: media.codecs.iter().map(RtpCodecMapping::from).collect(),
        }
    }
}

/// A bare RTP session of the media engine.
pub trait RtpSession: Send {
    fn set_local_port(&mut self, port: u16);

    fn set_remote_addr(&mut self, addr: SocketAddr);

    fn init(&mut self, params: &RtpSessionParameters);

    /// The receive-source-group packets of the session are routed to.
    fn incoming_source_group(&self) -> RtpIncomingSourceGroup;

    fn outgoing_source_group(&self) -> RtpOutgoingSourceGroup;

    fn receiver(&self) -> ReceiverRef;

    fn sender(&self) -> SenderRef;

    fn end(&mut self);
}

/// Notifications of a streamer session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Stopped,
}

impl Event for SessionEvent {
    type Kind = SessionEvent;

    fn kind(&self) -> SessionEvent {
        *self
    }
}

type TrackSlot<T> = Arc<Mutex<Option<T>>>;

pub struct StreamerSession {
    id: String,
    endpoint: StreamerEndpoint,
    session: Option<Box<dyn RtpSession>>,
    incoming: TrackSlot<IncomingStreamTrackRef>,
    outgoing: TrackSlot<OutgoingStreamTrackRef>,
    notifier: Notifier<SessionEvent>,
}

impl fmt::Debug for StreamerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamerSession")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("stopped", &self.session.is_none())
            .finish()
    }
}

impl StreamerSession {
    /// Configures `session` for `endpoint`, initializes it with the codecs of
    /// `media` and creates both tracks, each named after the media kind.
    pub fn new(
        id: impl Into<String>,
        endpoint: StreamerEndpoint,
        media: &MediaInfo,
        mut session: Box<dyn RtpSession>,
        config: &IncomingTrackConfig,
    ) -> Self {
        let id = id.into();
        let kind = frame_kind(media.kind);

        match endpoint {
            StreamerEndpoint::Local { port } => session.set_local_port(port),
            StreamerEndpoint::Remote { addr } => session.set_remote_addr(addr),
        }
        session.init(&RtpSessionParameters::from(media));

        let mut incoming = IncomingStreamTrack::new(
            kind.to_string(),
            kind,
            session.receiver(),
            BTreeMap::from([(String::new(), session.incoming_source_group())]),
            config,
        );
        let mut outgoing = OutgoingStreamTrack::new(
            kind.to_string(),
            kind,
            session.sender(),
            session.outgoing_source_group(),
        );

        let incoming_slot: TrackSlot<IncomingStreamTrackRef> = Arc::new(Mutex::new(None));
        let outgoing_slot: TrackSlot<OutgoingStreamTrackRef> = Arc::new(Mutex::new(None));

        let slot = Arc::downgrade(&incoming_slot);
        incoming.once(TrackEvent::Stopped, move |_| clear_slot(&slot));
        let slot = Arc::downgrade(&outgoing_slot);
        outgoing.once(TrackEvent::Stopped, move |_| clear_slot(&slot));

        if let Ok(mut slot) = incoming_slot.lock() {
            *slot = Some(Arc::new(Mutex::new(incoming)));
        }
        if let Ok(mut slot) = outgoing_slot.lock() {
            *slot = Some(Arc::new(Mutex::new(outgoing)));
        }

        debug!("streamer session {:?} started on {:?}", id, endpoint);

        Self {
            id,
            endpoint,
            session: Some(session),
            incoming: incoming_slot,
            outgoing: outgoing_slot,
            notifier: Notifier::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn endpoint(&self) -> StreamerEndpoint {
        self.endpoint
    }

    pub fn is_stopped(&self) -> bool {
        self.session.is_none()
    }

    /// The incoming track, `None` once it stopped.
    pub fn incoming_track(&self) -> Option<IncomingStreamTrackRef> {
        self.incoming.lock().ok()?.clone()
    }

    /// The outgoing track, `None` once it stopped.
    pub fn outgoing_track(&self) -> Option<OutgoingStreamTrackRef> {
        self.outgoing.lock().ok()?.clone()
    }

    pub fn on<F>(&mut self, event: SessionEvent, handler: F)
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.notifier.on(event, handler);
    }

    pub fn once<F>(&mut self, event: SessionEvent, handler: F)
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.notifier.once(event, handler);
    }

    /// Stops both tracks, ends the RTP session and fires
    /// [`SessionEvent::Stopped`]. Later calls do nothing.
    pub fn stop(&mut self) {
        if self.session.is_none() {
            return;
        }

        if let Some(track) = self.incoming_track() {
            match track.lock() {
                Ok(mut track) => track.stop(),
                Err(err) => warn!("session {:?} incoming track not stopped: {}", self.id, err),
            }
        }
        if let Some(track) = self.outgoing_track() {
            match track.lock() {
                Ok(mut track) => track.stop(),
                Err(err) => warn!("session {:?} outgoing track not stopped: {}", self.id, err),
            }
        }

        if let Some(session) = self.session.as_mut() {
            session.end();
        }

        debug!("streamer session {:?} stopped", self.id);
        self.notifier.emit(&SessionEvent::Stopped);

        self.session = None;
    }
}

fn clear_slot<T>(slot: &Weak<Mutex<Option<T>>>) {
    if let Some(slot) = slot.upgrade() {
        if let Ok(mut slot) = slot.lock() {
            *slot = None;
        }
    }
}
