use super::TrackEvent;
use crate::config::IncomingTrackConfig;
use crate::description::{
    ENCODING_PARAM_SSRC, MediaKind, SEMANTICS_FEC_FR, SEMANTICS_FID, SourceGroupInfo,
    TrackEncodingInfo, TrackInfo,
};
use crate::source::{ReceiverRef, RtpIncomingSourceGroup, SSRC, StreamTrackDepacketizer};
use crate::stats::{ActiveLayersInfo, IncomingAllStats, IncomingStatsCache, select_active_layers};
use log::{debug, trace, warn};
use shared::notifier::Notifier;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub type IncomingStreamTrackRef = Arc<Mutex<IncomingStreamTrack>>;

/// One encoding of an incoming track: its receive-source-group and the
/// depacketizer bound to it.
pub struct Encoding {
    id: String,
    source: RtpIncomingSourceGroup,
    depacketizer: Option<Box<dyn StreamTrackDepacketizer>>,
}

impl fmt::Debug for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoding")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("depacketizer", &self.depacketizer.is_some())
            .finish()
    }
}

impl Encoding {
    /// The rid, the position in a SIM group, or "" for a single encoding.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &RtpIncomingSourceGroup {
        &self.source
    }

    pub fn has_depacketizer(&self) -> bool {
        self.depacketizer.is_some()
    }
}

/// The SSRCs of one encoding, 0 when unset.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingSsrcs {
    pub media: SSRC,
    pub rtx: SSRC,
    pub fec: SSRC,
}

/// A received media track made of one or more simulcast encodings.
pub struct IncomingStreamTrack {
    id: String,
    media: MediaKind,
    receiver: Option<ReceiverRef>,
    counter: usize,
    encodings: BTreeMap<String, Encoding>,
    track_info: TrackInfo,
    stats: IncomingStatsCache,
    notifier: Notifier<TrackEvent>,
}

impl fmt::Debug for IncomingStreamTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingStreamTrack")
            .field("id", &self.id)
            .field("media", &self.media)
            .field("stopped", &self.receiver.is_none())
            .field("counter", &self.counter)
            .field("encodings", &self.encodings)
            .finish()
    }
}

impl IncomingStreamTrack {
    /// Creates a track reading from `sources`, keyed by encoding id.
    ///
    /// A depacketizer is bound to every source-group, and the signaling
    /// descriptor is rebuilt from the groups.
    pub fn new(
        id: impl Into<String>,
        media: MediaKind,
        receiver: ReceiverRef,
        sources: BTreeMap<String, RtpIncomingSourceGroup>,
        config: &IncomingTrackConfig,
    ) -> Self {
        let id = id.into();
        let track_info = describe(&id, media, &sources);

        let encodings = {
            let mut engine = receiver.lock();
            sources
                .into_iter()
                .map(|(encoding_id, source)| {
                    let depacketizer = match engine.as_mut() {
                        Ok(engine) => Some(engine.create_depacketizer(&source)),
                        Err(err) => {
                            warn!(
                                "track {:?} encoding {:?} without depacketizer: {}",
                                id, encoding_id, err
                            );
                            None
                        }
                    };
                    let encoding = Encoding {
                        id: encoding_id.clone(),
                        source,
                        depacketizer,
                    };
                    (encoding_id, encoding)
                })
                .collect::<BTreeMap<_, _>>()
        };

        debug!(
            "incoming track {:?} ({}) created with {} encoding(s)",
            id,
            media,
            encodings.len()
        );

        Self {
            id,
            media,
            receiver: Some(receiver),
            counter: 0,
            encodings,
            track_info,
            stats: IncomingStatsCache::new(config.stats_freshness()),
            notifier: Notifier::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn media(&self) -> MediaKind {
        self.media
    }

    /// The signaling-ready descriptor of this track: every contributing
    /// SSRC, its `FID`/`FEC-FR` relations and, for simulcast, one encoding
    /// per encoding id carrying its media SSRC.
    pub fn track_info(&self) -> &TrackInfo {
        &self.track_info
    }

    pub fn encodings(&self) -> &BTreeMap<String, Encoding> {
        &self.encodings
    }

    pub fn encoding(&self, id: &str) -> Option<&Encoding> {
        self.encodings.get(id)
    }

    /// The encoding with the lowest id, if any.
    pub fn first_encoding(&self) -> Option<&Encoding> {
        self.encodings.values().next()
    }

    /// The media/rtx/fec SSRCs of each encoding, keyed by encoding id.
    pub fn ssrcs(&self) -> BTreeMap<String, EncodingSsrcs> {
        self.encodings
            .iter()
            .map(|(id, encoding)| {
                let ssrcs = EncodingSsrcs {
                    media: encoding.source.media.ssrc,
                    rtx: encoding.source.rtx.ssrc,
                    fec: encoding.source.fec.ssrc,
                };
                (id.clone(), ssrcs)
            })
            .collect()
    }

    /// Number of consumers currently attached.
    pub fn attached_count(&self) -> usize {
        self.counter
    }

    pub fn is_stopped(&self) -> bool {
        self.receiver.is_none()
    }

    /// Per-encoding statistics, keyed by encoding id.
    ///
    /// Encodings whose cached entry is older than the configured freshness
    /// window are refreshed through the receiver first. Empty once stopped.
    pub fn get_stats(&mut self, now: Instant) -> BTreeMap<String, IncomingAllStats> {
        self.refresh_stats(now);
        self.stats.entries().clone()
    }

    /// Active and inactive encodings and every active layer, from fresh
    /// statistics.
    pub fn get_active_layers(&mut self, now: Instant) -> ActiveLayersInfo {
        self.refresh_stats(now);
        select_active_layers(self.stats.entries())
    }

    fn refresh_stats(&mut self, now: Instant) {
        let Some(receiver) = self.receiver.as_ref() else {
            return;
        };

        let mut engine = match receiver.lock() {
            Ok(engine) => engine,
            Err(err) => {
                warn!("track {:?} stats not refreshed: {}", self.id, err);
                return;
            }
        };

        self.stats.refresh(
            self.encodings
                .iter_mut()
                .map(|(id, encoding)| (id.as_str(), &mut encoding.source)),
            &mut *engine,
            now,
        );
    }

    /// Registers a consumer. The first one fires [`TrackEvent::Attached`].
    pub fn attach(&mut self) {
        if self.is_stopped() {
            return;
        }

        self.counter += 1;
        if self.counter == 1 {
            debug!("incoming track {:?} attached", self.id);
            self.notifier.emit(&TrackEvent::Attached);
        }
    }

    /// Unregisters a consumer. The last one fires [`TrackEvent::Detached`].
    pub fn detach(&mut self) {
        if self.is_stopped() || self.counter == 0 {
            return;
        }

        self.counter -= 1;
        if self.counter == 0 {
            debug!("incoming track {:?} detached", self.id);
            self.notifier.emit(&TrackEvent::Detached);
        }
    }

    /// Requests a keyframe on the media SSRC of every encoding.
    pub fn refresh(&mut self) {
        let Some(receiver) = self.receiver.as_ref() else {
            return;
        };

        let mut engine = match receiver.lock() {
            Ok(engine) => engine,
            Err(err) => {
                warn!("track {:?} keyframe request dropped: {}", self.id, err);
                return;
            }
        };

        for encoding in self.encodings.values() {
            let ssrc = encoding.source.media.ssrc;
            if ssrc == 0 {
                continue;
            }
            trace!("track {:?} pli on ssrc {}", self.id, ssrc);
            engine.send_pli(ssrc);
        }
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

    /// Stops every depacketizer, fires [`TrackEvent::Stopped`] and releases
    /// the receive-source-groups. Later calls do nothing.
    ///
    /// Handlers of `Stopped` run before the encodings are dropped.
    pub fn stop(&mut self) {
        if self.receiver.is_none() {
            return;
        }

        for encoding in self.encodings.values_mut() {
            if let Some(mut depacketizer) = encoding.depacketizer.take() {
                depacketizer.stop();
            }
        }

        debug!("incoming track {:?} stopped", self.id);
        self.notifier.emit(&TrackEvent::Stopped);

        self.encodings.clear();
        self.stats.clear();
        self.receiver = None;
    }
}

fn describe(id: &str, media: MediaKind, sources: &BTreeMap<String, RtpIncomingSourceGroup>) -> TrackInfo {
    let mut info = TrackInfo::new(id, media);

    for (encoding_id, source) in sources {
        if info.media_id.is_none() {
            info.media_id = source.mid.clone();
        }

        for ssrc in source.ssrcs() {
            info.add_ssrc(ssrc);
        }

        if source.rtx.ssrc > 0 {
            info.add_source_group(SourceGroupInfo::new(
                SEMANTICS_FID,
                vec![source.media.ssrc, source.rtx.ssrc],
            ));
        }
        if source.fec.ssrc > 0 {
            info.add_source_group(SourceGroupInfo::new(
                SEMANTICS_FEC_FR,
                vec![source.media.ssrc, source.fec.ssrc],
            ));
        }

        if !encoding_id.is_empty() {
            let mut encoding = TrackEncodingInfo::new(encoding_id.clone(), false);
            if source.media.ssrc > 0 {
                encoding.add_param(ENCODING_PARAM_SSRC, source.media.ssrc.to_string());
            }
            info.add_encoding(encoding);
        }
    }

    info
}
