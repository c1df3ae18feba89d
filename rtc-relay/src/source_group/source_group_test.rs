use super::*;
use crate::description::TrackEncodingInfo;

#[derive(Default)]
struct RecordingTransport {
    added: Vec<RtpIncomingSourceGroup>,
}

impl RtpTransport for RecordingTransport {
    fn add_incoming_source_group(&mut self, group: &RtpIncomingSourceGroup) {
        self.added.push(group.clone());
    }

    fn remove_incoming_source_group(&mut self, _group: &RtpIncomingSourceGroup) {}
}

fn encoding(rid: &str, ssrc: Option<&str>) -> TrackEncodingInfo {
    let mut encoding = TrackEncodingInfo::new(rid, false);
    if let Some(ssrc) = ssrc {
        encoding.add_param(ENCODING_PARAM_SSRC, ssrc);
    }
    encoding
}

fn simulcast_track() -> TrackInfo {
    let mut info = TrackInfo::new("video0", MediaKind::Video);
    info.media_id = Some("1".to_owned());
    for ssrc in [100, 101, 200, 201] {
        info.add_ssrc(ssrc);
    }
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_FID, vec![100, 101]));
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_FID, vec![200, 201]));
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_FEC_FR, vec![200, 202]));
    info
}

#[test]
fn test_detect_strategy() {
    let mut info = TrackInfo::new("t", MediaKind::Video);
    assert_eq!(SourceGroupStrategy::detect(&info), SourceGroupStrategy::Flat);

    info.add_source_group(SourceGroupInfo::new(SEMANTICS_SIM, vec![1, 2]));
    assert_eq!(SourceGroupStrategy::detect(&info), SourceGroupStrategy::Sim);

    info.add_encoding(encoding("h", Some("1")));
    assert_eq!(
        SourceGroupStrategy::detect(&info),
        SourceGroupStrategy::RidEncodings
    );
}

#[test]
fn test_rid_encodings() {
    let mut info = simulcast_track();
    info.add_encoding(encoding("l", Some("100")));
    info.add_alternative_encodings(vec![encoding("h", Some("200")), encoding("x", None)]);
    // Ignored, rid encodings win.
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_SIM, vec![100, 200]));

    let mut transport = RecordingTransport::default();
    let groups = build_incoming_source_groups(&info, &mut transport);

    let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["h", "l", "x"]);

    let l = &groups["l"];
    assert_eq!(l.kind, MediaKind::Video);
    assert_eq!(l.rid.as_deref(), Some("l"));
    assert_eq!(l.mid.as_deref(), Some("1"));
    assert_eq!((l.media.ssrc, l.rtx.ssrc, l.fec.ssrc), (100, 101, 0));

    let h = &groups["h"];
    assert_eq!((h.media.ssrc, h.rtx.ssrc, h.fec.ssrc), (200, 201, 202));

    let x = &groups["x"];
    assert_eq!(x.rid.as_deref(), Some("x"));
    assert!(x.ssrcs().is_empty());

    assert_eq!(transport.added.len(), 3);
}

#[test]
fn test_rid_malformed_ssrc_is_skipped() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut info = simulcast_track();
    info.add_encoding(encoding("bad", Some("not-a-number")));
    info.add_encoding(encoding("big", Some("4294967296")));
    info.add_encoding(encoding("good", Some("100")));

    let mut transport = RecordingTransport::default();
    let groups = build_incoming_source_groups(&info, &mut transport);

    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["good"]);
    assert_eq!(transport.added.len(), 1);
}

#[test]
fn test_sim_group() {
    let mut info = simulcast_track();
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_SIM, vec![100, 200, 300]));

    let mut transport = RecordingTransport::default();
    let groups = build_incoming_source_groups(&info, &mut transport);

    let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["0", "1", "2"]);
    assert_eq!(groups["0"].ssrcs(), vec![100, 101]);
    assert_eq!(groups["1"].ssrcs(), vec![200, 201, 202]);
    assert_eq!(groups["2"].ssrcs(), vec![300]);
    assert!(groups.values().all(|g| g.rid.is_none()));
    assert_eq!(transport.added.len(), 3);
}

#[test]
fn test_flat() {
    let mut info = TrackInfo::new("audio0", MediaKind::Audio);
    info.add_ssrc(10);
    info.add_ssrc(11);
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_FID, vec![10, 11]));

    let mut transport = RecordingTransport::default();
    let groups = build_incoming_source_groups(&info, &mut transport);

    assert_eq!(groups.len(), 1);
    let group = &groups[""];
    assert_eq!(group.kind, MediaKind::Audio);
    assert_eq!((group.media.ssrc, group.rtx.ssrc, group.fec.ssrc), (10, 11, 0));
    assert_eq!(transport.added, vec![group.clone()]);
}

#[test]
fn test_flat_without_ssrc() {
    let info = TrackInfo::new("empty", MediaKind::Unspecified);

    let mut transport = RecordingTransport::default();
    let groups = build_incoming_source_groups(&info, &mut transport);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[""].kind, MediaKind::Audio);
    assert!(groups[""].ssrcs().is_empty());
}

#[test]
fn test_short_relations_are_ignored() {
    let mut info = TrackInfo::new("video0", MediaKind::Video);
    info.add_ssrc(10);
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_FID, vec![10]));
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_FEC_FR, vec![]));
    info.add_source_group(SourceGroupInfo::new(SEMANTICS_SIM, vec![10]));

    let mut transport = RecordingTransport::default();
    let groups = build_incoming_source_groups(&info, &mut transport);

    assert_eq!(groups["0"].ssrcs(), vec![10]);
}

#[test]
fn test_parse_ssrc() {
    assert_eq!(parse_ssrc("2231627014"), Ok(2231627014));
    assert!(matches!(
        parse_ssrc("-1"),
        Err(shared::error::Error::ErrSsrcParse(_))
    ));
}

#[test]
fn test_padded_ssrc_is_malformed() {
    assert!(matches!(
        parse_ssrc(" 123 "),
        Err(shared::error::Error::ErrSsrcParse(_))
    ));

    let mut info = simulcast_track();
    info.add_encoding(encoding("padded", Some(" 100")));
    info.add_encoding(encoding("plain", Some("200")));

    let mut transport = RecordingTransport::default();
    let groups = build_incoming_source_groups(&info, &mut transport);

    let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["plain"]);
}
