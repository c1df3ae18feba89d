use super::IncomingAllStats;
use crate::layer::{Layer, MAX_LAYER_ID};
use serde::Serialize;
use std::collections::BTreeMap;

/// One encoding as seen by the forwarding logic.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEncoding {
    pub encoding_id: String,
    pub simulcast_idx: i32,
    pub bitrate: u64,
    /// Cumulative layers, ascending by bitrate. Empty for inactive encodings.
    pub layers: Vec<Layer>,
}

/// Active and inactive encodings plus every active layer of the track.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLayersInfo {
    /// Encodings carrying media, ascending by bitrate.
    pub active: Vec<ActiveEncoding>,
    /// Encodings with zero bitrate. Only `encoding_id` is set, the other
    /// fields keep their default values.
    pub inactive: Vec<ActiveEncoding>,
    /// Layers of all active encodings tagged with their encoding id,
    /// ascending by bitrate.
    pub layers: Vec<Layer>,
}

/// Splits a stats snapshot into active and inactive encodings.
///
/// An active encoding reporting no layer (a non scalable stream) gets one
/// synthesized layer with [`MAX_LAYER_ID`] ids and the encoding bitrate, so
/// the global list holds at least one row per active encoding.
pub fn select_active_layers(stats: &BTreeMap<String, IncomingAllStats>) -> ActiveLayersInfo {
    let mut active = vec![];
    let mut inactive = vec![];
    let mut all = vec![];

    for (id, state) in stats {
        if state.bitrate == 0 {
            inactive.push(ActiveEncoding {
                encoding_id: id.clone(),
                ..Default::default()
            });
            continue;
        }

        let mut encoding = ActiveEncoding {
            encoding_id: id.clone(),
            simulcast_idx: state.simulcast_idx,
            bitrate: state.bitrate,
            layers: Vec::with_capacity(state.media.layers.len().max(1)),
        };

        for layer in &state.media.layers {
            encoding.layers.push(Layer {
                encoding_id: None,
                ..layer.clone()
            });
            all.push(Layer {
                encoding_id: Some(id.clone()),
                ..layer.clone()
            });
        }

        if encoding.layers.is_empty() {
            let synthesized = Layer {
                encoding_id: None,
                spatial_layer_id: MAX_LAYER_ID,
                temporal_layer_id: MAX_LAYER_ID,
                total_bytes: state.media.total_bytes,
                num_packets: state.media.num_packets,
                bitrate: encoding.bitrate,
                simulcast_idx: Some(encoding.simulcast_idx),
            };
            all.push(Layer {
                encoding_id: Some(id.clone()),
                ..synthesized.clone()
            });
            encoding.layers.push(synthesized);
        } else {
            encoding.layers.sort_by_key(|layer| layer.bitrate);
        }

        active.push(encoding);
    }

    active.sort_by_key(|encoding| encoding.bitrate);
    all.sort_by_key(|layer| layer.bitrate);

    ActiveLayersInfo {
        active,
        inactive,
        layers: all,
    }
}
