//! Device position estimation from signal readings
//!
//! Multilateration over per-node RSSI observations:
//!
//! - Readings are resolved against known node placements; unmatched
//!   readings are discarded
//! - RSSI converts to distance via the log-distance path-loss inverse
//! - One usable reading pins the device to that node (low confidence),
//!   two readings bilaterate with inverse-distance weights, three or more
//!   use an inverse-square-distance weighted centroid
//!
//! Estimation never fails: with zero usable readings there simply is no
//! estimate (`None`). Every estimate carries the resolved readings that
//! produced it so downstream consumers can explain the answer.
//!
//! ## Example
//!
//! ```rust,ignore
//! use meshwise_core::position::{PositionEstimator, SignalReading, NodePositionIndex};
//!
//! let index = NodePositionIndex::build(&state, &placements);
//! let estimator = PositionEstimator::default();
//! let readings = vec![
//!     SignalReading::new("aa:bb:cc:00:00:01", -52.0),
//!     SignalReading::new("aa:bb:cc:00:00:02", -68.0),
//!     SignalReading::new("aa:bb:cc:00:00:03", -71.0),
//! ];
//! if let Some(estimate) = estimator.estimate("11:22:33:44:55:66", &readings, &index) {
//!     println!("({:.1}, {:.1}) conf {:.2}", estimate.position.x, estimate.position.y, estimate.confidence);
//! }
//! ```

use crate::geometry::{NodePlacement, PlacementRegistry, Point3};
use crate::signal::{self, DEFAULT_PATH_LOSS_EXPONENT, DEFAULT_REFERENCE_POWER_DBM};
use crate::state::{normalize_mac, MeshNetworkState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One RSSI observation of a device by a mesh node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    /// MAC of the observing node, normalized
    pub node_mac: String,
    /// Observed strength (dBm)
    pub rssi_dbm: f64,
}

impl SignalReading {
    /// Create a reading. The MAC is normalized.
    pub fn new(node_mac: &str, rssi_dbm: f64) -> Self {
        Self {
            node_mac: normalize_mac(node_mac),
            rssi_dbm,
        }
    }
}

/// A reading that matched a known node, with its derived distance.
/// Kept on the estimate for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReading {
    /// MAC of the observing node
    pub node_mac: String,
    /// Id of the observing node
    pub node_id: String,
    /// Observed strength (dBm)
    pub rssi_dbm: f64,
    /// Distance derived from the path-loss model (meters, >= 1)
    pub distance_m: f64,
}

/// How a position was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionMethod {
    /// Only one node heard the device; placed at that node
    SingleNode,
    /// Two nodes heard it; inverse-distance weighted midpoint
    Bilateration,
    /// Three or more nodes; inverse-square-distance weighted centroid
    WeightedCentroid,
}

/// An estimated device position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    /// Estimated position (meters, building coordinates)
    pub position: Point3,
    /// Floor of the strongest contributing node
    pub floor: i32,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Computation method
    pub method: PositionMethod,
    /// The resolved readings the estimate was built from
    pub readings: Vec<ResolvedReading>,
}

/// Node lookup for position estimation: normalized node MAC to placement.
/// Built once per analysis pass from the snapshot and placement registry
/// instead of re-scanning the node list per reading.
#[derive(Debug, Clone, Default)]
pub struct NodePositionIndex {
    entries: HashMap<String, IndexedNode>,
}

#[derive(Debug, Clone)]
struct IndexedNode {
    node_id: String,
    position: Point3,
    floor: i32,
}

impl NodePositionIndex {
    /// Build the index. Nodes without a placement are skipped; devices
    /// heard only by unplaced nodes end up with no estimate.
    pub fn build(state: &MeshNetworkState, placements: &PlacementRegistry) -> Self {
        let mut entries = HashMap::new();
        for node in &state.nodes {
            if let Some(placement) = placements.get(&node.id) {
                entries.insert(
                    normalize_mac(&node.mac),
                    IndexedNode {
                        node_id: node.id.clone(),
                        position: placement.position,
                        floor: placement.floor,
                    },
                );
            }
        }
        Self { entries }
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, node_mac: &str) -> Option<&IndexedNode> {
        self.entries.get(node_mac)
    }
}

/// Tunable constants for the estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionConfig {
    /// Expected RSSI at 1 meter (dBm)
    pub reference_power_dbm: f64,
    /// Log-distance path-loss exponent
    pub path_loss_exponent: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            reference_power_dbm: DEFAULT_REFERENCE_POWER_DBM,
            path_loss_exponent: DEFAULT_PATH_LOSS_EXPONENT,
        }
    }
}

/// Confidence assigned to a single-reading estimate.
const CONFIDENCE_SINGLE: f64 = 0.3;
/// Confidence assigned to a two-reading estimate.
const CONFIDENCE_PAIR: f64 = 0.5;
/// Confidence ceiling for multi-reading estimates.
const CONFIDENCE_CEILING: f64 = 0.9;

/// Multilateration-based position estimator.
#[derive(Debug, Clone, Default)]
pub struct PositionEstimator {
    config: PositionConfig,
}

impl PositionEstimator {
    /// Create an estimator with custom constants.
    pub fn new(config: PositionConfig) -> Self {
        Self { config }
    }

    /// Estimate a device's position from its signal readings.
    ///
    /// Returns `None` when no reading matches a placed node. Never errors:
    /// missing data means "cannot estimate", not a failure.
    pub fn estimate(
        &self,
        device_mac: &str,
        readings: &[SignalReading],
        index: &NodePositionIndex,
    ) -> Option<PositionEstimate> {
        let mut resolved: Vec<(ResolvedReading, Point3, i32)> = Vec::new();
        for reading in readings {
            match index.get(&reading.node_mac) {
                Some(node) => {
                    let distance = signal::rssi_to_distance(
                        reading.rssi_dbm,
                        self.config.reference_power_dbm,
                        self.config.path_loss_exponent,
                    );
                    resolved.push((
                        ResolvedReading {
                            node_mac: reading.node_mac.clone(),
                            node_id: node.node_id.clone(),
                            rssi_dbm: reading.rssi_dbm,
                            distance_m: distance,
                        },
                        node.position,
                        node.floor,
                    ));
                }
                None => {
                    debug!(
                        device = device_mac,
                        node = %reading.node_mac,
                        "discarding reading from unplaced node"
                    );
                }
            }
        }

        if resolved.is_empty() {
            return None;
        }

        // Floor attribution follows the nearest (strongest) contributor.
        let nearest = resolved
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.0.distance_m
                    .partial_cmp(&b.0.distance_m)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        let floor = resolved[nearest].2;

        let (position, confidence, method) = match resolved.len() {
            1 => (resolved[0].1, CONFIDENCE_SINGLE, PositionMethod::SingleNode),
            2 => {
                let position = weighted_position(&resolved, |d| 1.0 / d);
                (position, CONFIDENCE_PAIR, PositionMethod::Bilateration)
            }
            n => {
                let position = weighted_position(&resolved, |d| 1.0 / (d * d));
                let confidence = CONFIDENCE_CEILING.min(0.5 + 0.1 * n as f64);
                (position, confidence, PositionMethod::WeightedCentroid)
            }
        };

        Some(PositionEstimate {
            position,
            floor,
            confidence,
            method,
            readings: resolved.into_iter().map(|(r, _, _)| r).collect(),
        })
    }
}

/// Weighted average of node positions. Distances are already floored at 1m
/// by the signal model, so the weight function never divides by zero.
fn weighted_position<F>(resolved: &[(ResolvedReading, Point3, i32)], weight: F) -> Point3
where
    F: Fn(f64) -> f64,
{
    let total: f64 = resolved.iter().map(|(r, _, _)| weight(r.distance_m)).sum();
    let mut x = 0.0;
    let mut y = 0.0;
    let mut z = 0.0;
    for (reading, position, _) in resolved {
        let w = weight(reading.distance_m) / total;
        x += position.x * w;
        y += position.y * w;
        z += position.z * w;
    }
    Point3::new(x, y, z)
}

/// One device's entry on the spatial map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePosition {
    /// Device MAC, normalized
    pub mac: String,
    /// Hostname if known
    pub hostname: Option<String>,
    /// The estimate, or None when the device could not be located
    pub estimate: Option<PositionEstimate>,
}

/// Estimated positions of all devices plus the node placements used,
/// ready for collaborators to render or serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialMap {
    /// Snapshot timestamp the map was derived from (Unix seconds)
    pub generated_at: u64,
    /// Per-device estimates, sorted by MAC for stable output
    pub devices: Vec<DevicePosition>,
    /// Placements of the mesh nodes themselves
    pub nodes: Vec<NodePlacement>,
}

/// Build the spatial map for every device with readings.
///
/// `readings_by_device` maps device MAC to its signal readings; devices in
/// the snapshot without readings appear on the map with no estimate.
pub fn build_spatial_map(
    state: &MeshNetworkState,
    readings_by_device: &HashMap<String, Vec<SignalReading>>,
    placements: &PlacementRegistry,
    estimator: &PositionEstimator,
) -> SpatialMap {
    let index = NodePositionIndex::build(state, placements);

    let mut devices: Vec<DevicePosition> = state
        .devices
        .iter()
        .map(|device| {
            let estimate = readings_by_device
                .get(&device.mac)
                .and_then(|readings| estimator.estimate(&device.mac, readings, &index));
            DevicePosition {
                mac: device.mac.clone(),
                hostname: device.hostname.clone(),
                estimate,
            }
        })
        .collect();
    devices.sort_by(|a, b| a.mac.cmp(&b.mac));

    let mut nodes: Vec<NodePlacement> = placements.all().cloned().collect();
    nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));

    SpatialMap {
        generated_at: state.captured_at,
        devices,
        nodes,
    }
}

/// Smooths successive estimates per device with an exponential moving
/// average so map positions do not jitter between analysis passes.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    /// Weight of the newest estimate (0-1)
    alpha: f64,
    last: HashMap<String, Point3>,
}

impl PositionTracker {
    /// Create a tracker. `alpha` is clamped to [0.05, 1].
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.05, 1.0),
            last: HashMap::new(),
        }
    }

    /// Blend a fresh estimate with the device's previous smoothed
    /// position and remember the result.
    pub fn smooth(&mut self, device_mac: &str, estimate: &PositionEstimate) -> PositionEstimate {
        let mac = normalize_mac(device_mac);
        let smoothed = match self.last.get(&mac) {
            Some(prev) => Point3::new(
                prev.x + (estimate.position.x - prev.x) * self.alpha,
                prev.y + (estimate.position.y - prev.y) * self.alpha,
                prev.z + (estimate.position.z - prev.z) * self.alpha,
            ),
            None => estimate.position,
        };
        self.last.insert(mac, smoothed);

        let mut result = estimate.clone();
        result.position = smoothed;
        result
    }

    /// Forget a device (e.g. after it leaves the network).
    pub fn forget(&mut self, device_mac: &str) {
        self.last.remove(&normalize_mac(device_mac));
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MeshNode, NodeRole};

    fn fixture() -> (MeshNetworkState, PlacementRegistry) {
        let state = MeshNetworkState::new(
            1_700_000_000,
            vec![
                MeshNode::new("n1", "Living room", "aa:bb:cc:00:00:01", NodeRole::Main),
                MeshNode::new("n2", "Office", "aa:bb:cc:00:00:02", NodeRole::Secondary),
                MeshNode::new("n3", "Bedroom", "aa:bb:cc:00:00:03", NodeRole::Secondary),
            ],
            Vec::new(),
        );
        let mut placements = PlacementRegistry::new();
        placements.upsert(NodePlacement::new(
            "n1",
            0,
            "Ground",
            Point3::new(0.0, 0.0, 1.0),
        ));
        placements.upsert(NodePlacement::new(
            "n2",
            0,
            "Ground",
            Point3::new(10.0, 0.0, 1.0),
        ));
        placements.upsert(NodePlacement::new(
            "n3",
            0,
            "Ground",
            Point3::new(0.0, 10.0, 1.0),
        ));
        (state, placements)
    }

    #[test]
    fn test_no_matching_readings() {
        let (state, placements) = fixture();
        let index = NodePositionIndex::build(&state, &placements);
        let estimator = PositionEstimator::default();

        let readings = vec![SignalReading::new("ff:ff:ff:ff:ff:ff", -60.0)];
        assert!(estimator
            .estimate("11:22:33:44:55:66", &readings, &index)
            .is_none());
        assert!(estimator.estimate("11:22:33:44:55:66", &[], &index).is_none());
    }

    #[test]
    fn test_single_reading_pins_to_node() {
        let (state, placements) = fixture();
        let index = NodePositionIndex::build(&state, &placements);
        let estimator = PositionEstimator::default();

        let readings = vec![SignalReading::new("aa:bb:cc:00:00:01", -55.0)];
        let estimate = estimator
            .estimate("11:22:33:44:55:66", &readings, &index)
            .unwrap();

        assert_eq!(estimate.method, PositionMethod::SingleNode);
        assert_eq!(estimate.position, Point3::new(0.0, 0.0, 1.0));
        assert!((estimate.confidence - 0.3).abs() < 1e-9);
        assert_eq!(estimate.readings.len(), 1);
    }

    #[test]
    fn test_two_readings_bilaterate() {
        let (state, placements) = fixture();
        let index = NodePositionIndex::build(&state, &placements);
        let estimator = PositionEstimator::default();

        // Equal strength: midpoint between n1 and n2.
        let readings = vec![
            SignalReading::new("aa:bb:cc:00:00:01", -65.0),
            SignalReading::new("aa:bb:cc:00:00:02", -65.0),
        ];
        let estimate = estimator
            .estimate("11:22:33:44:55:66", &readings, &index)
            .unwrap();

        assert_eq!(estimate.method, PositionMethod::Bilateration);
        assert!((estimate.position.x - 5.0).abs() < 1e-6);
        assert!((estimate.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bilateration_leans_toward_stronger_node() {
        let (state, placements) = fixture();
        let index = NodePositionIndex::build(&state, &placements);
        let estimator = PositionEstimator::default();

        let readings = vec![
            SignalReading::new("aa:bb:cc:00:00:01", -50.0),
            SignalReading::new("aa:bb:cc:00:00:02", -80.0),
        ];
        let estimate = estimator
            .estimate("11:22:33:44:55:66", &readings, &index)
            .unwrap();

        // n1 is much stronger, so the estimate sits well inside its half.
        assert!(estimate.position.x < 5.0);
    }

    #[test]
    fn test_three_readings_centroid_and_confidence() {
        let (state, placements) = fixture();
        let index = NodePositionIndex::build(&state, &placements);
        let estimator = PositionEstimator::default();

        let readings = vec![
            SignalReading::new("aa:bb:cc:00:00:01", -60.0),
            SignalReading::new("aa:bb:cc:00:00:02", -60.0),
            SignalReading::new("aa:bb:cc:00:00:03", -60.0),
        ];
        let estimate = estimator
            .estimate("11:22:33:44:55:66", &readings, &index)
            .unwrap();

        assert_eq!(estimate.method, PositionMethod::WeightedCentroid);
        assert!((estimate.confidence - 0.8).abs() < 1e-9);
        // Equal weights: centroid of the three anchors.
        assert!((estimate.position.x - 10.0 / 3.0).abs() < 1e-6);
        assert!((estimate.position.y - 10.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_monotonic_in_reading_count() {
        let (state, placements) = fixture();
        let index = NodePositionIndex::build(&state, &placements);
        let estimator = PositionEstimator::default();

        let one = estimator
            .estimate(
                "dev",
                &[SignalReading::new("aa:bb:cc:00:00:01", -60.0)],
                &index,
            )
            .unwrap();
        let two = estimator
            .estimate(
                "dev",
                &[
                    SignalReading::new("aa:bb:cc:00:00:01", -60.0),
                    SignalReading::new("aa:bb:cc:00:00:02", -60.0),
                ],
                &index,
            )
            .unwrap();
        let three = estimator
            .estimate(
                "dev",
                &[
                    SignalReading::new("aa:bb:cc:00:00:01", -60.0),
                    SignalReading::new("aa:bb:cc:00:00:02", -60.0),
                    SignalReading::new("aa:bb:cc:00:00:03", -60.0),
                ],
                &index,
            )
            .unwrap();

        assert!(one.confidence < two.confidence);
        assert!(two.confidence < three.confidence);
        assert!(three.confidence <= 0.9);
    }

    #[test]
    fn test_confidence_ceiling() {
        // Many readings saturate at 0.9.
        let confidence = (0.5_f64 + 0.1 * 10.0).min(0.9);
        assert!((confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_spatial_map_sorted_and_complete() {
        let (mut state, placements) = fixture();
        state.devices = vec![
            crate::state::NetworkDevice::new("cc:cc:cc:cc:cc:02", crate::state::ConnectionType::Wireless5),
            crate::state::NetworkDevice::new("cc:cc:cc:cc:cc:01", crate::state::ConnectionType::Wireless24),
        ];

        let mut readings = HashMap::new();
        readings.insert(
            "cc:cc:cc:cc:cc:01".to_string(),
            vec![SignalReading::new("aa:bb:cc:00:00:01", -60.0)],
        );

        let map = build_spatial_map(&state, &readings, &placements, &PositionEstimator::default());

        assert_eq!(map.devices.len(), 2);
        assert_eq!(map.devices[0].mac, "cc:cc:cc:cc:cc:01");
        assert!(map.devices[0].estimate.is_some());
        assert!(map.devices[1].estimate.is_none());
        assert_eq!(map.nodes.len(), 3);
        assert_eq!(map.generated_at, 1_700_000_000);
    }

    #[test]
    fn test_tracker_smooths_jumps() {
        let (state, placements) = fixture();
        let index = NodePositionIndex::build(&state, &placements);
        let estimator = PositionEstimator::default();
        let mut tracker = PositionTracker::new(0.5);

        let at_n1 = estimator
            .estimate(
                "dev",
                &[SignalReading::new("aa:bb:cc:00:00:01", -55.0)],
                &index,
            )
            .unwrap();
        let at_n2 = estimator
            .estimate(
                "dev",
                &[SignalReading::new("aa:bb:cc:00:00:02", -55.0)],
                &index,
            )
            .unwrap();

        let first = tracker.smooth("dev", &at_n1);
        assert_eq!(first.position, at_n1.position);

        // Jump to n2 is damped halfway by alpha = 0.5.
        let second = tracker.smooth("dev", &at_n2);
        assert!((second.position.x - 5.0).abs() < 1e-9);
    }
}
