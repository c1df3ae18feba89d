//! Receive-source-group construction from a track description.
//!
//! Three mutually exclusive signaling conventions map a [`TrackInfo`] onto
//! one [`RtpIncomingSourceGroup`] per encoding. The first one that matches
//! wins, see [`SourceGroupStrategy::detect`].

#[cfg(test)]
mod source_group_test;

use crate::description::{
    ENCODING_PARAM_SSRC, MediaKind, SEMANTICS_FEC_FR, SEMANTICS_FID, SEMANTICS_SIM, SourceGroupInfo,
    TrackInfo,
};
use crate::source::{RtpIncomingSourceGroup, RtpTransport, SSRC};
use log::{trace, warn};
use shared::error::Result;
use std::collections::BTreeMap;

/// How the encodings of a track are signaled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceGroupStrategy {
    /// `a=rid` encodings, keyed by rid.
    RidEncodings,
    /// Legacy `a=ssrc-group:SIM`, keyed by position in the group.
    Sim,
    /// A single encoding keyed by the empty string.
    Flat,
}

impl SourceGroupStrategy {
    /// Rid encodings take precedence over a SIM group, even when both are
    /// signaled.
    pub fn detect(info: &TrackInfo) -> Self {
        if info.has_encodings() {
            SourceGroupStrategy::RidEncodings
        } else if info.source_group(SEMANTICS_SIM).is_some() {
            SourceGroupStrategy::Sim
        } else {
            SourceGroupStrategy::Flat
        }
    }
}

/// Receive-source-groups only know audio and video frames.
pub(crate) fn frame_kind(media: MediaKind) -> MediaKind {
    if media == MediaKind::Video {
        MediaKind::Video
    } else {
        MediaKind::Audio
    }
}

pub(crate) fn parse_ssrc(raw: &str) -> Result<SSRC> {
    Ok(raw.parse::<SSRC>()?)
}

/// Builds the receive-source-groups of `info`, keyed by encoding id, and
/// registers each of them with `transport`.
///
/// Encodings with a malformed `ssrc` parameter are skipped with a warning;
/// the remaining ones are still built.
pub fn build_incoming_source_groups(
    info: &TrackInfo,
    transport: &mut dyn RtpTransport,
) -> BTreeMap<String, RtpIncomingSourceGroup> {
    let kind = frame_kind(info.media);
    let strategy = SourceGroupStrategy::detect(info);
    trace!("track {:?} source groups by {:?}", info.id, strategy);

    let groups = match strategy {
        SourceGroupStrategy::RidEncodings => rid_source_groups(info, kind),
        SourceGroupStrategy::Sim => sim_source_groups(info, kind),
        SourceGroupStrategy::Flat => flat_source_groups(info, kind),
    };

    for group in groups.values() {
        transport.add_incoming_source_group(group);
    }

    groups
}

fn rid_source_groups(info: &TrackInfo, kind: MediaKind) -> BTreeMap<String, RtpIncomingSourceGroup> {
    let mut groups = BTreeMap::new();

    for encoding in info.encodings.iter().flatten() {
        let mut group = RtpIncomingSourceGroup::new(kind);
        group.rid = Some(encoding.id.clone());
        group.mid = info.media_id.clone();

        if let Some(raw) = encoding.param(ENCODING_PARAM_SSRC) {
            let ssrc = match parse_ssrc(raw) {
                Ok(ssrc) => ssrc,
                Err(err) => {
                    warn!(
                        "track {:?} encoding {:?} skipped: {}",
                        info.id, encoding.id, err
                    );
                    continue;
                }
            };
            group.media.ssrc = ssrc;
            bind_companions(&mut group, &info.groups);
        }

        groups.insert(encoding.id.clone(), group);
    }

    groups
}

fn sim_source_groups(info: &TrackInfo, kind: MediaKind) -> BTreeMap<String, RtpIncomingSourceGroup> {
    let mut groups = BTreeMap::new();

    let Some(sim) = info.source_group(SEMANTICS_SIM) else {
        return groups;
    };

    for (index, ssrc) in sim.ssrcs.iter().enumerate() {
        let mut group = RtpIncomingSourceGroup::new(kind);
        group.media.ssrc = *ssrc;
        bind_companions(&mut group, &info.groups);

        groups.insert(index.to_string(), group);
    }

    groups
}

fn flat_source_groups(info: &TrackInfo, kind: MediaKind) -> BTreeMap<String, RtpIncomingSourceGroup> {
    let mut group = RtpIncomingSourceGroup::new(kind);

    match info.ssrcs.first() {
        Some(ssrc) => group.media.ssrc = *ssrc,
        None => warn!("track {:?} signals no ssrc", info.id),
    }

    group.rtx.ssrc = info
        .source_group(SEMANTICS_FID)
        .and_then(SourceGroupInfo::companion)
        .unwrap_or_default();
    group.fec.ssrc = info
        .source_group(SEMANTICS_FEC_FR)
        .and_then(SourceGroupInfo::companion)
        .unwrap_or_default();

    BTreeMap::from([(String::new(), group)])
}

/// Binds rtx/fec from the `FID`/`FEC-FR` relations whose primary SSRC is the
/// group's media SSRC. Relations without a companion SSRC are ignored.
fn bind_companions(group: &mut RtpIncomingSourceGroup, relations: &[SourceGroupInfo]) {
    for relation in relations {
        if relation.primary() != Some(group.media.ssrc) {
            continue;
        }
        let Some(companion) = relation.companion() else {
            continue;
        };

        if relation.semantics == SEMANTICS_FID {
            group.rtx.ssrc = companion;
        } else if relation.semantics == SEMANTICS_FEC_FR {
            group.fec.ssrc = companion;
        }
    }
}
