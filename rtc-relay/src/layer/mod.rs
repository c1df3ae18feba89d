//! Scalable layer aggregation.
//!
//! Spatial and temporal layers of a scalable encoding depend on every lower
//! layer: decoding (s, t) needs all packets of the layers (s', t') with
//! `s' <= s` and `t' <= t`. The engine reports each layer alone, so before
//! any forwarding decision the counters are folded into cumulative ones.


use crate::source::RtpLayerSource;
use serde::Serialize;

/// Layer id meaning "no layering", used for encodings without layer info.
pub const MAX_LAYER_ID: u8 = 0xFF;

/// Cumulative statistics of one quality layer.
///
/// `total_bytes`, `num_packets` and `bitrate` cover everything needed to
/// decode up to this layer. `encoding_id` is only set on the global layer
/// list of [`ActiveLayersInfo`](crate::ActiveLayersInfo); `simulcast_idx` is
/// set once the stats cache ranked the owning encoding.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_id: Option<String>,
    pub spatial_layer_id: u8,
    pub temporal_layer_id: u8,
    pub total_bytes: u64,
    pub num_packets: u64,
    pub bitrate: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulcast_idx: Option<i32>,
}

impl Layer {
    /// Whether decoding this layer requires the packets of `other`.
    pub fn depends_on(&self, other: &RtpLayerSource) -> bool {
        other.spatial_layer_id <= self.spatial_layer_id
            && other.temporal_layer_id <= self.temporal_layer_id
    }
}

/// Folds raw per-layer counters into cumulative layers.
///
/// One output layer is produced per observed (spatial, temporal) pair, in
/// input order. Quadratic in the number of layers, which stays within a
/// handful of spatial/temporal combinations.
pub fn aggregate_layers(individual: &[RtpLayerSource]) -> Vec<Layer> {
    individual
        .iter()
        .map(|layer| {
            let mut aggregated = Layer {
                spatial_layer_id: layer.spatial_layer_id,
                temporal_layer_id: layer.temporal_layer_id,
                ..Default::default()
            };

            for other in individual {
                if aggregated.depends_on(other) {
                    aggregated.total_bytes += other.total_bytes;
                    aggregated.num_packets += other.num_packets;
                    aggregated.bitrate += other.bitrate;
                }
            }

            aggregated
        })
        .collect()
}
