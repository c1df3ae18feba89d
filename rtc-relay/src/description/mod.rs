//! Signaling-side description of streams and tracks.
//!
//! These types carry what the SDP layer extracted for an incoming stream:
//! the SSRCs of every track, its `ssrc-group` relations (`FID`, `FEC-FR`,
//! `SIM`) and, for RID based simulcast, its per-rid encodings. Parsing and
//! generating SDP happens elsewhere; a description can be produced by any
//! signaling front-end and is cloned back out of a running track by
//! [`IncomingStreamTrack::track_info`](crate::IncomingStreamTrack::track_info).


use crate::source::SSRC;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// `ssrc-group` semantics pairing a media SSRC with its retransmission SSRC.
/// See [RFC 5576](https://www.rfc-editor.org/rfc/rfc5576) and
/// [RFC 4588](https://www.rfc-editor.org/rfc/rfc4588).
pub const SEMANTICS_FID: &str = "FID";
/// `ssrc-group` semantics pairing a media SSRC with its FEC SSRC.
/// See [RFC 5956](https://www.rfc-editor.org/rfc/rfc5956).
pub const SEMANTICS_FEC_FR: &str = "FEC-FR";
/// Legacy `ssrc-group` semantics listing simulcast SSRCs, lowest quality first.
pub const SEMANTICS_SIM: &str = "SIM";

/// Encoding parameter carrying an explicit SSRC for a rid.
pub const ENCODING_PARAM_SSRC: &str = "ssrc";

/// Media kind of a track.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Unspecified or unknown media kind
    #[default]
    Unspecified,

    /// Audio track
    Audio,

    /// Video track
    Video,
}

impl From<&str> for MediaKind {
    fn from(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("audio") {
            MediaKind::Audio
        } else if raw.eq_ignore_ascii_case("video") {
            MediaKind::Video
        } else {
            MediaKind::Unspecified
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Unspecified => "unspecified",
        };
        write!(f, "{s}")
    }
}

/// A `ssrc-group` relation, e.g. `a=ssrc-group:FID 2231627014 632943048`.
///
/// The first SSRC is the primary media SSRC, the following ones are related
/// to it according to `semantics`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceGroupInfo {
    pub semantics: String,
    pub ssrcs: Vec<SSRC>,
}

impl SourceGroupInfo {
    pub fn new(semantics: impl Into<String>, ssrcs: Vec<SSRC>) -> Self {
        Self {
            semantics: semantics.into(),
            ssrcs,
        }
    }

    /// The primary SSRC of the relation.
    pub fn primary(&self) -> Option<SSRC> {
        self.ssrcs.first().copied()
    }

    /// The companion SSRC (rtx or fec) of a two-SSRC relation.
    pub fn companion(&self) -> Option<SSRC> {
        self.ssrcs.get(1).copied()
    }
}

/// One rid-identified simulcast encoding, `a=rid:<id> recv <params>`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEncodingInfo {
    pub id: String,
    pub paused: bool,
    pub params: BTreeMap<String, String>,
}

impl TrackEncodingInfo {
    pub fn new(id: impl Into<String>, paused: bool) -> Self {
        Self {
            id: id.into(),
            paused,
            params: BTreeMap::new(),
        }
    }

    pub fn add_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Description of one track of a stream.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub id: String,
    pub media: MediaKind,
    /// The `a=mid` of the media section carrying this track.
    pub media_id: Option<String>,
    pub ssrcs: Vec<SSRC>,
    pub groups: Vec<SourceGroupInfo>,
    /// Simulcast encodings, one inner list of alternatives per layer.
    pub encodings: Vec<Vec<TrackEncodingInfo>>,
}

impl TrackInfo {
    pub fn new(id: impl Into<String>, media: MediaKind) -> Self {
        Self {
            id: id.into(),
            media,
            ..Default::default()
        }
    }

    pub fn add_ssrc(&mut self, ssrc: SSRC) {
        self.ssrcs.push(ssrc);
    }

    pub fn add_source_group(&mut self, group: SourceGroupInfo) {
        self.groups.push(group);
    }

    /// Returns the first `ssrc-group` with the given semantics.
    pub fn source_group(&self, semantics: &str) -> Option<&SourceGroupInfo> {
        self.groups.iter().find(|group| group.semantics == semantics)
    }

    /// Adds a single encoding as its own simulcast layer.
    pub fn add_encoding(&mut self, encoding: TrackEncodingInfo) {
        self.encodings.push(vec![encoding]);
    }

    /// Adds a simulcast layer made of several alternative encodings.
    pub fn add_alternative_encodings(&mut self, alternatives: Vec<TrackEncodingInfo>) {
        self.encodings.push(alternatives);
    }

    /// Whether any rid based encoding is signaled.
    pub fn has_encodings(&self) -> bool {
        self.encodings.iter().any(|alternatives| !alternatives.is_empty())
    }
}

/// Description of a stream (`a=msid` stream id) and its tracks.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub id: String,
    pub tracks: BTreeMap<String, TrackInfo>,
}

impl StreamInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: BTreeMap::new(),
        }
    }

    pub fn add_track(&mut self, track: TrackInfo) {
        self.tracks.insert(track.id.clone(), track);
    }

    pub fn track(&self, id: &str) -> Option<&TrackInfo> {
        self.tracks.get(id)
    }
}

/// A codec negotiated for a streamer session, `a=rtpmap` plus its `apt` rtx.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodecInfo {
    pub codec: String,
    pub payload_type: u8,
    pub rtx: Option<u8>,
}

impl CodecInfo {
    pub fn new(codec: impl Into<String>, payload_type: u8) -> Self {
        Self {
            codec: codec.into(),
            payload_type,
            rtx: None,
        }
    }

    pub fn with_rtx(mut self, rtx: u8) -> Self {
        self.rtx = Some(rtx);
        self
    }
}

/// Description of a single media section.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub id: String,
    pub kind: MediaKind,
    pub codecs: Vec<CodecInfo>,
}

impl MediaInfo {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            codecs: vec![],
        }
    }

    pub fn add_codec(&mut self, codec: CodecInfo) {
        self.codecs.push(codec);
    }
}
