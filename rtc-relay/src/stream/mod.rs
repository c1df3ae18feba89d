//! Incoming streams, the set of tracks received under one stream id.


use crate::config::IncomingTrackConfig;
use crate::description::{MediaKind, StreamInfo, TrackInfo};
use crate::source::{ReceiverRef, RtpIncomingSourceGroup, TransportRef};
use crate::source_group::build_incoming_source_groups;
use crate::stats::IncomingAllStats;
use crate::track::{IncomingStreamTrack, IncomingStreamTrackRef, TrackEvent};
use log::{debug, warn};
use shared::error::{Error, Result};
use shared::notifier::{Event, Notifier};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

/// Notifications of an incoming stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A track was created from a description.
    Track(IncomingStreamTrackRef),
    /// The stream stopped, fired once.
    Stopped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StreamEventKind {
    Track,
    Stopped,
}

impl Event for StreamEvent {
    type Kind = StreamEventKind;

    fn kind(&self) -> StreamEventKind {
        match self {
            StreamEvent::Track(_) => StreamEventKind::Track,
            StreamEvent::Stopped => StreamEventKind::Stopped,
        }
    }
}

struct TrackEntry {
    media: MediaKind,
    track: IncomingStreamTrackRef,
}

type TrackMap = Arc<Mutex<BTreeMap<String, TrackEntry>>>;

/// A received stream and its tracks, keyed by track id.
///
/// Tracks remove themselves from the stream, and unregister their
/// receive-source-groups from the transport, when they stop. Track locks
/// are never taken while the track map is locked.
pub struct IncomingStream {
    id: String,
    transport: Option<TransportRef>,
    receiver: ReceiverRef,
    tracks: TrackMap,
    config: IncomingTrackConfig,
    notifier: Notifier<StreamEvent>,
}

impl fmt::Debug for IncomingStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracks: Vec<String> = self
            .tracks
            .lock()
            .map(|tracks| tracks.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("IncomingStream")
            .field("id", &self.id)
            .field("stopped", &self.transport.is_none())
            .field("tracks", &tracks)
            .field("config", &self.config)
            .finish()
    }
}

impl IncomingStream {
    /// Creates the stream and one track per track description of `info`.
    pub fn new(
        transport: TransportRef,
        receiver: ReceiverRef,
        info: &StreamInfo,
        config: IncomingTrackConfig,
    ) -> Self {
        let mut stream = Self {
            id: info.id.clone(),
            transport: Some(transport),
            receiver,
            tracks: Arc::new(Mutex::new(BTreeMap::new())),
            config,
            notifier: Notifier::new(),
        };

        for track in info.tracks.values() {
            stream.create_track(track);
        }

        stream
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_stopped(&self) -> bool {
        self.transport.is_none()
    }

    /// The descriptor of the stream, rebuilt from the current tracks.
    pub fn stream_info(&self) -> StreamInfo {
        let mut info = StreamInfo::new(self.id.clone());
        for track in self.get_tracks() {
            if let Ok(track) = track.lock() {
                info.add_track(track.track_info().clone());
            }
        }
        info
    }

    /// Per-track statistics keyed by track id, then by encoding id.
    pub fn get_stats(&self, now: Instant) -> BTreeMap<String, BTreeMap<String, IncomingAllStats>> {
        let mut stats = BTreeMap::new();
        for (id, track) in self.snapshot() {
            match track.lock() {
                Ok(mut track) => {
                    stats.insert(id, track.get_stats(now));
                }
                Err(err) => warn!("stream {:?} track {:?} skipped: {}", self.id, id, err),
            }
        }
        stats
    }

    pub fn get_track(&self, id: &str) -> Option<IncomingStreamTrackRef> {
        let tracks = self.tracks.lock().ok()?;
        tracks.get(id).map(|entry| Arc::clone(&entry.track))
    }

    pub fn get_tracks(&self) -> Vec<IncomingStreamTrackRef> {
        self.snapshot().into_values().collect()
    }

    pub fn get_audio_tracks(&self) -> Vec<IncomingStreamTrackRef> {
        self.tracks_of(MediaKind::Audio)
    }

    pub fn get_video_tracks(&self) -> Vec<IncomingStreamTrackRef> {
        self.tracks_of(MediaKind::Video)
    }

    fn tracks_of(&self, media: MediaKind) -> Vec<IncomingStreamTrackRef> {
        match self.tracks.lock() {
            Ok(tracks) => tracks
                .values()
                .filter(|entry| entry.media == media)
                .map(|entry| Arc::clone(&entry.track))
                .collect(),
            Err(_) => vec![],
        }
    }

    fn snapshot(&self) -> BTreeMap<String, IncomingStreamTrackRef> {
        match self.tracks.lock() {
            Ok(tracks) => tracks
                .iter()
                .map(|(id, entry)| (id.clone(), Arc::clone(&entry.track)))
                .collect(),
            Err(_) => BTreeMap::new(),
        }
    }

    /// Adds a track built elsewhere. The track leaves the stream when it
    /// stops; its receive-source-groups stay with whoever registered them.
    ///
    /// Fails with [`Error::ErrDuplicateTrackId`] if the id is taken, leaving
    /// the stream untouched. Once the stream is stopped the track is not
    /// stored and `Ok(())` is returned.
    pub fn add_track(&mut self, track: IncomingStreamTrackRef) -> Result<()> {
        let (id, media) = {
            let track = track.lock()?;
            (track.id().to_owned(), track.media())
        };

        if self.is_stopped() {
            debug!("stream {:?} stopped, track {:?} not added", self.id, id);
            return Ok(());
        }

        if self.tracks.lock()?.contains_key(&id) {
            return Err(Error::ErrDuplicateTrackId);
        }

        self.insert_track(id, media, &track, vec![]);

        Ok(())
    }

    /// Builds the receive-source-groups of `info`, registers them with the
    /// transport, creates the track and fires [`StreamEvent::Track`].
    ///
    /// A track already holding the id is stopped first. Returns `None` once
    /// the stream is stopped.
    pub fn create_track(&mut self, info: &TrackInfo) -> Option<IncomingStreamTrackRef> {
        let transport = self.transport.clone()?;

        if let Some(previous) = self.get_track(&info.id) {
            warn!("stream {:?} replaces track {:?}", self.id, info.id);
            stop_track(&previous);
        }

        let sources = match transport.lock() {
            Ok(mut transport) => build_incoming_source_groups(info, &mut *transport),
            Err(err) => {
                warn!("stream {:?} track {:?} not created: {}", self.id, info.id, err);
                return None;
            }
        };
        let groups: Vec<RtpIncomingSourceGroup> = sources.values().cloned().collect();

        let track = Arc::new(Mutex::new(IncomingStreamTrack::new(
            info.id.clone(),
            info.media,
            Arc::clone(&self.receiver),
            sources,
            &self.config,
        )));

        self.insert_track(info.id.clone(), info.media, &track, groups);
        debug!("stream {:?} created track {:?}", self.id, info.id);

        self.notifier.emit(&StreamEvent::Track(Arc::clone(&track)));

        Some(track)
    }

    /// Stores `track` and forgets it when it stops. `registered` holds the
    /// groups this stream registered for it, unregistered on stop.
    fn insert_track(
        &mut self,
        id: String,
        media: MediaKind,
        track: &IncomingStreamTrackRef,
        registered: Vec<RtpIncomingSourceGroup>,
    ) {
        let tracks = Arc::downgrade(&self.tracks);
        let owned = Arc::downgrade(track);
        let transport = self.transport.clone().filter(|_| !registered.is_empty());
        let track_id = id.clone();

        if let Ok(mut track) = track.lock() {
            track.once(TrackEvent::Stopped, move |_| {
                forget_track(&tracks, &track_id, &owned);
                if let Some(transport) = &transport {
                    release_source_groups(transport, &registered);
                }
            });
        }

        if let Ok(mut tracks) = self.tracks.lock() {
            tracks.insert(
                id,
                TrackEntry {
                    media,
                    track: Arc::clone(track),
                },
            );
        }
    }

    pub fn on<F>(&mut self, event: StreamEventKind, handler: F)
    where
        F: FnMut(&StreamEvent) + Send + 'static,
    {
        self.notifier.on(event, handler);
    }

    pub fn once<F>(&mut self, event: StreamEventKind, handler: F)
    where
        F: FnMut(&StreamEvent) + Send + 'static,
    {
        self.notifier.once(event, handler);
    }

    /// Stops every track, fires [`StreamEvent::Stopped`] and drops the
    /// transport. Later calls do nothing.
    pub fn stop(&mut self) {
        if self.transport.is_none() {
            return;
        }

        let tracks = match self.tracks.lock() {
            Ok(mut tracks) => std::mem::take(&mut *tracks),
            Err(err) => {
                warn!("stream {:?} tracks lost: {}", self.id, err);
                BTreeMap::new()
            }
        };

        for entry in tracks.into_values() {
            stop_track(&entry.track);
        }

        debug!("stream {:?} stopped", self.id);
        self.notifier.emit(&StreamEvent::Stopped);

        self.transport = None;
    }
}

fn stop_track(track: &IncomingStreamTrackRef) {
    match track.lock() {
        Ok(mut track) => track.stop(),
        Err(err) => warn!("track not stopped: {}", err),
    }
}

/// Removes `id` from the map, unless the entry is a newer track with the
/// same id.
fn forget_track(
    tracks: &Weak<Mutex<BTreeMap<String, TrackEntry>>>,
    id: &str,
    track: &Weak<Mutex<IncomingStreamTrack>>,
) {
    let Some(tracks) = tracks.upgrade() else {
        return;
    };
    let Ok(mut tracks) = tracks.lock() else {
        return;
    };

    let same = tracks
        .get(id)
        .is_some_and(|entry| track.ptr_eq(&Arc::downgrade(&entry.track)));
    if same {
        tracks.remove(id);
    }
}

fn release_source_groups(transport: &TransportRef, groups: &[RtpIncomingSourceGroup]) {
    match transport.lock() {
        Ok(mut transport) => {
            for group in groups {
                transport.remove_incoming_source_group(group);
            }
        }
        Err(err) => warn!("source groups not released: {}", err),
    }
}
