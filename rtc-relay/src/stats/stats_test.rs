use super::*;
use crate::description::MediaKind;
use crate::layer::MAX_LAYER_ID;
use crate::source::{RtpLayerSource, SSRC, StreamTrackDepacketizer};
use std::collections::HashMap;

/// Receiver reporting a fixed media bitrate per SSRC.
#[derive(Default)]
struct StaticReceiver {
    bitrates: HashMap<SSRC, u64>,
    layers: HashMap<SSRC, Vec<RtpLayerSource>>,
    updates: Vec<SSRC>,
}

struct NopDepacketizer;

impl StreamTrackDepacketizer for NopDepacketizer {
    fn stop(&mut self) {}
}

impl RtpReceiver for StaticReceiver {
    fn send_pli(&mut self, _ssrc: SSRC) {}

    fn update_source_group(&mut self, group: &mut RtpIncomingSourceGroup, _now: Instant) {
        let ssrc = group.media.ssrc;
        self.updates.push(ssrc);
        group.media.bitrate = self.bitrates.get(&ssrc).copied().unwrap_or_default();
        group.media.layers = self.layers.get(&ssrc).cloned().unwrap_or_default();
        group.rtx.bitrate = group.media.bitrate / 10;
    }

    fn create_depacketizer(
        &mut self,
        _group: &RtpIncomingSourceGroup,
    ) -> Box<dyn StreamTrackDepacketizer> {
        Box::new(NopDepacketizer)
    }
}

fn group(ssrc: SSRC) -> RtpIncomingSourceGroup {
    let mut group = RtpIncomingSourceGroup::new(MediaKind::Video);
    group.media.ssrc = ssrc;
    group
}

fn groups(ssrcs: &[(&str, SSRC)]) -> BTreeMap<String, RtpIncomingSourceGroup> {
    ssrcs
        .iter()
        .map(|(id, ssrc)| (id.to_string(), group(*ssrc)))
        .collect()
}

fn refresh(
    cache: &mut IncomingStatsCache,
    groups: &mut BTreeMap<String, RtpIncomingSourceGroup>,
    receiver: &mut StaticReceiver,
    now: Instant,
) -> BTreeMap<String, IncomingAllStats> {
    cache
        .refresh(
            groups.iter_mut().map(|(id, g)| (id.as_str(), g)),
            receiver,
            now,
        )
        .clone()
}

#[test]
fn test_simulcast_index_ranking() {
    let mut receiver = StaticReceiver::default();
    receiver.bitrates.insert(1, 0);
    receiver.bitrates.insert(2, 50);
    receiver.bitrates.insert(3, 0);
    receiver.bitrates.insert(4, 200);

    let mut groups = groups(&[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
    let mut cache = IncomingStatsCache::new(Duration::from_millis(200));
    let stats = refresh(&mut cache, &mut groups, &mut receiver, Instant::now());

    let ranks: Vec<i32> = stats.values().map(|s| s.simulcast_idx).collect();
    assert_eq!(ranks, vec![-1, 2, -1, 1]);
}

#[test]
fn test_simulcast_index_ties_follow_encoding_id() {
    let mut receiver = StaticReceiver::default();
    receiver.bitrates.insert(1, 100);
    receiver.bitrates.insert(2, 100);

    let mut groups = groups(&[("h", 1), ("l", 2)]);
    let mut cache = IncomingStatsCache::new(Duration::from_millis(200));
    let stats = refresh(&mut cache, &mut groups, &mut receiver, Instant::now());

    assert_eq!(stats["h"].simulcast_idx, 1);
    assert_eq!(stats["l"].simulcast_idx, 2);
}

#[test]
fn test_totals() {
    let mut receiver = StaticReceiver::default();
    receiver.bitrates.insert(1, 1000);

    let mut groups = groups(&[("", 1)]);
    groups.get_mut("").unwrap().rtt = 42;
    let mut cache = IncomingStatsCache::new(Duration::from_millis(200));
    let stats = refresh(&mut cache, &mut groups, &mut receiver, Instant::now());

    let s = &stats[""];
    assert_eq!(s.bitrate, 1000);
    assert_eq!(s.total, 1100);
    assert_eq!(s.rtt, 42);
    assert_eq!(s.simulcast_idx, 1);
}

#[test]
fn test_freshness_window() {
    let mut receiver = StaticReceiver::default();
    receiver.bitrates.insert(1, 1000);

    let mut groups = groups(&[("", 1)]);
    let mut cache = IncomingStatsCache::new(Duration::from_millis(200));

    let t0 = Instant::now();
    let first = refresh(&mut cache, &mut groups, &mut receiver, t0);
    assert_eq!(receiver.updates.len(), 1);

    // Within the window the entry is served as is.
    receiver.bitrates.insert(1, 5000);
    let second = refresh(&mut cache, &mut groups, &mut receiver, t0 + Duration::from_millis(150));
    assert_eq!(receiver.updates.len(), 1);
    assert_eq!(second[""].bitrate, 1000);
    assert_eq!(second[""].timestamp(), first[""].timestamp());

    // Exactly at the boundary the entry is still fresh.
    refresh(&mut cache, &mut groups, &mut receiver, t0 + Duration::from_millis(200));
    assert_eq!(receiver.updates.len(), 1);

    let third = refresh(&mut cache, &mut groups, &mut receiver, t0 + Duration::from_millis(250));
    assert_eq!(receiver.updates.len(), 2);
    assert_eq!(third[""].bitrate, 5000);
    assert_eq!(third[""].timestamp(), t0 + Duration::from_millis(250));
}

#[test]
fn test_refresh_only_stale_entries() {
    let mut receiver = StaticReceiver::default();
    receiver.bitrates.insert(1, 100);
    receiver.bitrates.insert(2, 200);

    let t0 = Instant::now();
    let mut cache = IncomingStatsCache::new(Duration::from_millis(200));
    let mut only_a = groups(&[("a", 1)]);
    refresh(&mut cache, &mut only_a, &mut receiver, t0);

    let mut both = groups(&[("a", 1), ("b", 2)]);
    let stats = refresh(&mut cache, &mut both, &mut receiver, t0 + Duration::from_millis(10));

    assert_eq!(receiver.updates, vec![1, 2]);
    // Ranking covers the untouched entry too.
    assert_eq!(stats["a"].simulcast_idx, 2);
    assert_eq!(stats["b"].simulcast_idx, 1);
}

#[test]
fn test_layers_carry_simulcast_index() {
    let mut receiver = StaticReceiver::default();
    receiver.bitrates.insert(1, 300);
    receiver.layers.insert(
        1,
        vec![
            RtpLayerSource {
                spatial_layer_id: 0,
                temporal_layer_id: 0,
                bitrate: 100,
                ..Default::default()
            },
            RtpLayerSource {
                spatial_layer_id: 0,
                temporal_layer_id: 1,
                bitrate: 200,
                ..Default::default()
            },
        ],
    );

    let mut groups = groups(&[("", 1)]);
    let mut cache = IncomingStatsCache::new(Duration::from_millis(200));
    let stats = refresh(&mut cache, &mut groups, &mut receiver, Instant::now());

    let layers = &stats[""].media.layers;
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[1].bitrate, 300);
    assert!(layers.iter().all(|l| l.simulcast_idx == Some(1)));
}

#[test]
fn test_clear() {
    let mut receiver = StaticReceiver::default();
    let mut groups = groups(&[("", 1)]);
    let mut cache = IncomingStatsCache::new(Duration::from_millis(200));
    refresh(&mut cache, &mut groups, &mut receiver, Instant::now());
    assert_eq!(cache.entries().len(), 1);

    cache.clear();
    assert!(cache.entries().is_empty());
}

fn entry(bitrate: u64, simulcast_idx: i32, layers: Vec<Layer>) -> IncomingAllStats {
    let mut stats = IncomingAllStats::from_source_group(&group(1), Instant::now());
    stats.bitrate = bitrate;
    stats.media.bitrate = bitrate;
    stats.media.layers = layers;
    stats.simulcast_idx = simulcast_idx;
    stats
}

fn layer(spatial: u8, temporal: u8, bitrate: u64) -> Layer {
    Layer {
        spatial_layer_id: spatial,
        temporal_layer_id: temporal,
        bitrate,
        ..Default::default()
    }
}

#[test]
fn test_select_active_layers() {
    let mut stats = BTreeMap::new();
    stats.insert(
        "h".to_owned(),
        entry(900, 1, vec![layer(0, 1, 900), layer(0, 0, 400)]),
    );
    stats.insert("l".to_owned(), entry(0, -1, vec![]));
    stats.insert("m".to_owned(), entry(500, 2, vec![layer(0, 0, 500)]));

    let info = select_active_layers(&stats);

    let active: Vec<&str> = info.active.iter().map(|e| e.encoding_id.as_str()).collect();
    assert_eq!(active, vec!["m", "h"]);

    assert_eq!(info.inactive.len(), 1);
    assert_eq!(info.inactive[0].encoding_id, "l");
    assert_eq!(
        info.inactive[0],
        ActiveEncoding {
            encoding_id: "l".to_owned(),
            ..Default::default()
        }
    );

    let h = &info.active[1];
    let h_bitrates: Vec<u64> = h.layers.iter().map(|l| l.bitrate).collect();
    assert_eq!(h_bitrates, vec![400, 900]);
    assert!(h.layers.iter().all(|l| l.encoding_id.is_none()));

    let global: Vec<(Option<&str>, u64)> = info
        .layers
        .iter()
        .map(|l| (l.encoding_id.as_deref(), l.bitrate))
        .collect();
    assert_eq!(
        global,
        vec![(Some("h"), 400), (Some("m"), 500), (Some("h"), 900)]
    );
}

#[test]
fn test_select_synthesizes_layer_for_non_scalable_encoding() {
    let mut stats = BTreeMap::new();
    stats.insert("".to_owned(), entry(750, 1, vec![]));

    let info = select_active_layers(&stats);

    assert_eq!(info.active.len(), 1);
    let synthesized = &info.active[0].layers[0];
    assert_eq!(synthesized.spatial_layer_id, MAX_LAYER_ID);
    assert_eq!(synthesized.temporal_layer_id, MAX_LAYER_ID);
    assert_eq!(synthesized.bitrate, 750);
    assert_eq!(synthesized.simulcast_idx, Some(1));

    assert_eq!(info.layers.len(), 1);
    assert_eq!(info.layers[0].encoding_id.as_deref(), Some(""));
    assert_eq!(info.layers[0].bitrate, 750);
}

#[test]
fn test_select_empty() {
    let info = select_active_layers(&BTreeMap::new());
    assert_eq!(info, ActiveLayersInfo::default());
}
