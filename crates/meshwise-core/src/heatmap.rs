//! Per-floor signal coverage simulation
//!
//! Simulates received signal strength over a floor grid using the
//! log-distance propagation model:
//!
//! - Per-cell, per-band (2.4/5GHz) prediction for every placed node
//! - Cross-floor leakage: 3D distance through the slab plus a per-floor
//!   attenuation penalty
//! - Interior walls estimated from the floor's room materials
//! - Ambient interference accumulated from neighbor networks, with SNR
//!   derating of the composite quality
//! - Dead-zone extraction via union-find clustering of weak cells
//! - Heuristic recommendations and a brute-force optimal-placement scan
//!
//! A missing building or empty placement registry is not an error: the
//! generator returns a placeholder heatmap whose recommendations tell the
//! caller what to configure. Only a malformed resolution fails fast.

use crate::clustering::cluster_points;
use crate::geometry::{Building, FloorPlan, NodePlacement, PlacementRegistry, Point3};
use crate::signal::{self, WifiBand};
use crate::state::NeighborNetwork;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors for caller mistakes. Missing data never lands here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Grid resolution must be strictly positive or the scan would never
    /// terminate.
    #[error("grid resolution must be > 0 meters, got {0}")]
    InvalidResolution(f64),
}

/// Tunable constants for the coverage simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Node transmit power on 2.4GHz (dBm)
    pub tx_power_24_dbm: f64,
    /// Node transmit power on 5GHz (dBm)
    pub tx_power_5_dbm: f64,
    /// Log-distance path-loss exponent
    pub path_loss_exponent: f64,
    /// Extra attenuation per floor crossed (dB)
    pub floor_attenuation_db: f64,
    /// Estimated spacing between interior walls (meters)
    pub wall_spacing_m: f64,
    /// Cap on estimated wall crossings per path
    pub max_wall_crossings: u32,
    /// Height above the floor at which cells are evaluated (meters)
    pub cell_height_m: f64,
    /// Neighbor networks below this level are invisible as interference (dBm)
    pub interference_visibility_dbm: f64,
    /// SNR below this target derates the composite quality (dB)
    pub snr_target_db: f64,
    /// Cells under this quality are dead-zone candidates
    pub weak_quality_threshold: f64,
    /// Dead-zone linkage distance as a multiple of the grid resolution
    pub dead_zone_linkage_factor: f64,
    /// Minimum cells for a cluster to count as a dead zone
    pub dead_zone_min_cells: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            tx_power_24_dbm: 20.0,
            tx_power_5_dbm: 23.0,
            path_loss_exponent: signal::DEFAULT_PATH_LOSS_EXPONENT,
            floor_attenuation_db: 15.0,
            wall_spacing_m: 6.0,
            max_wall_crossings: 4,
            cell_height_m: 1.0,
            interference_visibility_dbm: -70.0,
            snr_target_db: 20.0,
            weak_quality_threshold: 30.0,
            dead_zone_linkage_factor: 3.0,
            dead_zone_min_cells: 2,
        }
    }
}

/// One simulated grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    /// Cell position on the floor (meters)
    pub x: f64,
    pub y: f64,
    /// Best predicted 2.4GHz signal across all nodes (dBm)
    pub signal_24_dbm: f64,
    /// Best predicted 5GHz signal across all nodes (dBm)
    pub signal_5_dbm: f64,
    /// Composite quality (0-100) after SNR derating
    pub quality: f64,
    /// Node providing the strongest signal, if any node is placed
    pub primary_node: Option<String>,
    /// Accumulated ambient interference (dBm)
    pub interference_dbm: f64,
}

/// Dead-zone severity, from the cluster's average quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeadZoneSeverity {
    Mild,
    Moderate,
    Severe,
}

/// A cluster of weak cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadZone {
    /// Cluster centroid (meters)
    pub center_x: f64,
    pub center_y: f64,
    /// Radius of the bounding circle around the centroid (meters)
    pub radius_m: f64,
    /// Severity from average quality: <10 severe, <20 moderate, else mild
    pub severity: DeadZoneSeverity,
    /// Number of cells in the cluster
    pub cell_count: usize,
    /// Average quality over the cluster
    pub average_quality: f64,
}

/// Complete per-floor coverage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorHeatmap {
    /// Floor number
    pub floor: i32,
    /// Grid resolution used (meters per cell)
    pub resolution_m: f64,
    /// Simulated cells, row-major (y outer, x inner); empty when the
    /// generator had nothing to simulate
    pub points: Vec<HeatmapPoint>,
    /// Detected dead zones
    pub dead_zones: Vec<DeadZone>,
    /// Mean quality over all cells (0 when no cells)
    pub average_quality: f64,
    /// Human-readable guidance; never empty when `points` is empty
    pub recommendations: Vec<String>,
}

impl FloorHeatmap {
    /// The highest-quality cell, if any cells were simulated.
    pub fn strongest_point(&self) -> Option<&HeatmapPoint> {
        self.points.iter().max_by(|a, b| {
            a.quality
                .partial_cmp(&b.quality)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// The lowest-quality cell, if any cells were simulated.
    pub fn weakest_point(&self) -> Option<&HeatmapPoint> {
        self.points.iter().min_by(|a, b| {
            a.quality
                .partial_cmp(&b.quality)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// A suggested position for an additional or relocated node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSuggestion {
    /// Suggested position (meters)
    pub position: Point3,
    /// Floor the suggestion applies to
    pub floor: i32,
    /// Average quality with current placements
    pub baseline_quality: f64,
    /// Average quality with the synthetic node added
    pub projected_quality: f64,
}

impl PlacementSuggestion {
    /// Quality gain of the suggestion.
    pub fn improvement(&self) -> f64 {
        self.projected_quality - self.baseline_quality
    }
}

/// Candidate step for the optimal-placement scan (meters).
const PLACEMENT_SCAN_STEP_M: f64 = 5.0;
/// Evaluation grid resolution for the placement scan (meters).
const PLACEMENT_EVAL_RESOLUTION_M: f64 = 2.0;
/// Minimum average-quality gain for a suggestion to be worth reporting.
const PLACEMENT_MIN_IMPROVEMENT: f64 = 5.0;

/// Coverage heatmap generator.
#[derive(Debug, Clone, Default)]
pub struct HeatmapGenerator {
    config: HeatmapConfig,
}

impl HeatmapGenerator {
    /// Create a generator with custom constants.
    pub fn new(config: HeatmapConfig) -> Self {
        Self { config }
    }

    /// Simulate coverage for one floor.
    ///
    /// `neighbors` are foreign networks from the latest scan; they join
    /// the building's recorded `neighbor_networks` as interference
    /// sources. Fails only on a non-positive resolution; a floor that is
    /// not in the building or an empty placement registry produces a
    /// placeholder result with explanatory recommendations.
    pub fn generate(
        &self,
        building: &Building,
        floor_number: i32,
        placements: &PlacementRegistry,
        neighbors: &[NeighborNetwork],
        resolution_m: f64,
    ) -> Result<FloorHeatmap, AnalysisError> {
        if resolution_m <= 0.0 || !resolution_m.is_finite() {
            return Err(AnalysisError::InvalidResolution(resolution_m));
        }

        let floor = match building.floor(floor_number) {
            Some(f) => f,
            None => {
                warn!(floor = floor_number, "no floor plan configured");
                return Ok(self.placeholder(
                    floor_number,
                    resolution_m,
                    "No floor plan configured for this floor; add the floor's dimensions to the building model",
                ));
            }
        };

        if placements.is_empty() {
            warn!(floor = floor_number, "no node placements configured");
            return Ok(self.placeholder(
                floor_number,
                resolution_m,
                "No node placements configured; record where each mesh node is located to enable coverage mapping",
            ));
        }

        // Stable node order so equal-signal ties resolve identically on
        // every run.
        let mut nodes: Vec<&NodePlacement> = placements.all().collect();
        nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));

        let interference_dbm =
            self.ambient_interference_dbm(building.neighbor_networks.iter().chain(neighbors));
        let wall_db = floor.average_wall_attenuation_db();

        let mut points = Vec::new();
        let mut y = 0.0;
        while y <= floor.length_m + 1e-9 {
            let mut x = 0.0;
            while x <= floor.width_m + 1e-9 {
                points.push(self.simulate_cell(
                    x,
                    y,
                    floor,
                    &nodes,
                    building.floor_height_m,
                    wall_db,
                    interference_dbm,
                ));
                x += resolution_m;
            }
            y += resolution_m;
        }

        let average_quality = if points.is_empty() {
            0.0
        } else {
            points.iter().map(|p| p.quality).sum::<f64>() / points.len() as f64
        };

        let dead_zones = self.detect_dead_zones(&points, resolution_m);
        let recommendations = self.recommend(
            floor,
            placements,
            &points,
            &dead_zones,
            average_quality,
        );

        Ok(FloorHeatmap {
            floor: floor_number,
            resolution_m,
            points,
            dead_zones,
            average_quality,
            recommendations,
        })
    }

    /// Scan for the best position for one additional node on a floor.
    ///
    /// Brute force: candidate positions every 5m with a 5m margin from the
    /// walls, each evaluated by re-running the coverage simulation with a
    /// synthetic node added. O(cells x candidates), so treat it as an
    /// offline operation. Returns None when no candidate improves the average
    /// quality by more than 5 points, or when the floor is unknown.
    pub fn find_optimal_placement(
        &self,
        building: &Building,
        floor_number: i32,
        placements: &PlacementRegistry,
        neighbors: &[NeighborNetwork],
    ) -> Option<PlacementSuggestion> {
        building.floor(floor_number)?;

        let baseline = self
            .generate(
                building,
                floor_number,
                placements,
                neighbors,
                PLACEMENT_EVAL_RESOLUTION_M,
            )
            .ok()?;
        // An empty registry yields a placeholder with no cells; the scan
        // below would compare against a meaningless baseline.
        if baseline.points.is_empty() && placements.is_empty() {
            return None;
        }

        let floor = building.floor(floor_number)?;
        let mut best: Option<PlacementSuggestion> = None;

        let mut y = PLACEMENT_SCAN_STEP_M;
        while y <= floor.length_m - PLACEMENT_SCAN_STEP_M + 1e-9 {
            let mut x = PLACEMENT_SCAN_STEP_M;
            while x <= floor.width_m - PLACEMENT_SCAN_STEP_M + 1e-9 {
                let mut trial = placements.clone();
                trial.upsert(NodePlacement::new(
                    "__candidate__",
                    floor_number,
                    &floor.label,
                    Point3::new(x, y, 1.0),
                ));

                if let Ok(projected) = self.generate(
                    building,
                    floor_number,
                    &trial,
                    neighbors,
                    PLACEMENT_EVAL_RESOLUTION_M,
                ) {
                    let suggestion = PlacementSuggestion {
                        position: Point3::new(x, y, 1.0),
                        floor: floor_number,
                        baseline_quality: baseline.average_quality,
                        projected_quality: projected.average_quality,
                    };
                    let better_than_best = best
                        .as_ref()
                        .map(|b| suggestion.improvement() > b.improvement())
                        .unwrap_or(true);
                    if suggestion.improvement() > PLACEMENT_MIN_IMPROVEMENT && better_than_best {
                        best = Some(suggestion);
                    }
                }
                x += PLACEMENT_SCAN_STEP_M;
            }
            y += PLACEMENT_SCAN_STEP_M;
        }

        best
    }

    fn placeholder(&self, floor: i32, resolution_m: f64, reason: &str) -> FloorHeatmap {
        FloorHeatmap {
            floor,
            resolution_m,
            points: Vec::new(),
            dead_zones: Vec::new(),
            average_quality: 0.0,
            recommendations: vec![reason.to_string()],
        }
    }

    /// Sum neighbor powers above the visibility threshold in linear
    /// milliwatts, back to dBm. No visible neighbors floors at -120 dBm.
    fn ambient_interference_dbm<'a>(
        &self,
        neighbors: impl Iterator<Item = &'a NeighborNetwork>,
    ) -> f64 {
        let total_mw: f64 = neighbors
            .filter(|n| (n.rssi_dbm as f64) > self.config.interference_visibility_dbm)
            .map(|n| signal::dbm_to_mw(n.rssi_dbm as f64))
            .sum();
        signal::mw_to_dbm(total_mw)
    }

    #[allow(clippy::too_many_arguments)]
    fn simulate_cell(
        &self,
        x: f64,
        y: f64,
        floor: &FloorPlan,
        nodes: &[&NodePlacement],
        floor_height_m: f64,
        wall_db: f64,
        interference_dbm: f64,
    ) -> HeatmapPoint {
        let cell = Point3::new(x, y, self.config.cell_height_m);

        let mut best_24 = f64::NEG_INFINITY;
        let mut best_5 = f64::NEG_INFINITY;
        let mut primary: Option<(&str, f64)> = None;

        for node in nodes {
            let floors_crossed = (node.floor - floor.floor).unsigned_abs();
            let dx = node.position.x - cell.x;
            let dy = node.position.y - cell.y;
            let dz = floors_crossed as f64 * floor_height_m + (node.position.z - cell.z);
            let distance = (dx * dx + dy * dy + dz * dz).sqrt();

            let walls = ((cell.distance_2d(&node.position) / self.config.wall_spacing_m) as u32)
                .min(self.config.max_wall_crossings);
            let attenuation = walls as f64 * wall_db
                + floors_crossed as f64 * self.config.floor_attenuation_db;

            let rssi_24 = self.config.tx_power_24_dbm
                - signal::path_loss_db(
                    distance,
                    WifiBand::Ghz24.nominal_frequency_mhz(),
                    self.config.path_loss_exponent,
                )
                - attenuation;
            let rssi_5 = self.config.tx_power_5_dbm
                - signal::path_loss_db(
                    distance,
                    WifiBand::Ghz5.nominal_frequency_mhz(),
                    self.config.path_loss_exponent,
                )
                - attenuation;

            best_24 = best_24.max(rssi_24);
            best_5 = best_5.max(rssi_5);

            let node_best = rssi_24.max(rssi_5);
            let is_new_primary = primary.map(|(_, s)| node_best > s).unwrap_or(true);
            if is_new_primary {
                primary = Some((node.node_id.as_str(), node_best));
            }
        }

        let strongest = best_24.max(best_5);
        let mut quality = signal::rssi_to_quality(strongest);
        let snr = strongest - interference_dbm;
        if snr < self.config.snr_target_db {
            quality *= (snr.max(0.0) / self.config.snr_target_db).clamp(0.0, 1.0);
        }

        HeatmapPoint {
            x,
            y,
            signal_24_dbm: best_24,
            signal_5_dbm: best_5,
            quality: quality.clamp(0.0, 100.0),
            primary_node: primary.map(|(id, _)| id.to_string()),
            interference_dbm,
        }
    }

    fn detect_dead_zones(&self, points: &[HeatmapPoint], resolution_m: f64) -> Vec<DeadZone> {
        let weak: Vec<&HeatmapPoint> = points
            .iter()
            .filter(|p| p.quality < self.config.weak_quality_threshold)
            .collect();
        if weak.is_empty() {
            return Vec::new();
        }

        let coords: Vec<(f64, f64)> = weak.iter().map(|p| (p.x, p.y)).collect();
        let linkage = self.config.dead_zone_linkage_factor * resolution_m;

        cluster_points(&coords, linkage)
            .into_iter()
            .filter(|cluster| cluster.len() >= self.config.dead_zone_min_cells)
            .map(|cluster| {
                let n = cluster.len() as f64;
                let cx = cluster.iter().map(|&i| weak[i].x).sum::<f64>() / n;
                let cy = cluster.iter().map(|&i| weak[i].y).sum::<f64>() / n;
                let radius = cluster
                    .iter()
                    .map(|&i| {
                        let dx = weak[i].x - cx;
                        let dy = weak[i].y - cy;
                        (dx * dx + dy * dy).sqrt()
                    })
                    .fold(0.0, f64::max);
                let avg_quality = cluster.iter().map(|&i| weak[i].quality).sum::<f64>() / n;

                let severity = if avg_quality < 10.0 {
                    DeadZoneSeverity::Severe
                } else if avg_quality < 20.0 {
                    DeadZoneSeverity::Moderate
                } else {
                    DeadZoneSeverity::Mild
                };

                DeadZone {
                    center_x: cx,
                    center_y: cy,
                    radius_m: radius,
                    severity,
                    cell_count: cluster.len(),
                    average_quality: avg_quality,
                }
            })
            .collect()
    }

    fn recommend(
        &self,
        floor: &FloorPlan,
        placements: &PlacementRegistry,
        points: &[HeatmapPoint],
        dead_zones: &[DeadZone],
        average_quality: f64,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if placements.on_floor(floor.floor).is_empty() {
            recommendations.push(format!(
                "No mesh node is placed on floor {} ({}); coverage there relies entirely on leakage from other floors",
                floor.floor, floor.label
            ));
        }

        if let Some(severe) = dead_zones
            .iter()
            .find(|z| z.severity == DeadZoneSeverity::Severe)
        {
            recommendations.push(format!(
                "Severe dead zone around ({:.0}m, {:.0}m); add a node or satellite near that area",
                severe.center_x, severe.center_y
            ));
        } else if !dead_zones.is_empty() {
            recommendations.push(format!(
                "{} dead zone(s) detected; consider repositioning the nearest node",
                dead_zones.len()
            ));
        }

        if average_quality < 50.0 {
            recommendations.push(format!(
                "Average coverage quality on floor {} is {:.0}/100; review node placement and transmit power",
                floor.floor, average_quality
            ));
        }

        let derated = points
            .iter()
            .filter(|p| p.quality < signal::rssi_to_quality(p.signal_24_dbm.max(p.signal_5_dbm)))
            .count();
        if !points.is_empty() && derated as f64 / points.len() as f64 > 0.25 {
            recommendations.push(
                "Ambient interference derates more than a quarter of the floor; changing WiFi channels may help"
                    .to_string(),
            );
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_node_setup() -> (Building, PlacementRegistry) {
        let building = Building::new(vec![FloorPlan::new(0, "Ground", 10.0, 10.0)]);
        let mut placements = PlacementRegistry::new();
        placements.upsert(NodePlacement::new(
            "main",
            0,
            "Ground",
            Point3::new(5.0, 5.0, 1.0),
        ));
        (building, placements)
    }

    #[test]
    fn test_invalid_resolution_fails_fast() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();
        assert!(matches!(
            generator.generate(&building, 0, &placements, &[], 0.0),
            Err(AnalysisError::InvalidResolution(_))
        ));
        assert!(matches!(
            generator.generate(&building, 0, &placements, &[], -1.0),
            Err(AnalysisError::InvalidResolution(_))
        ));
    }

    #[test]
    fn test_no_placements_placeholder() {
        let building = Building::new(vec![FloorPlan::new(0, "Ground", 10.0, 10.0)]);
        let generator = HeatmapGenerator::default();
        let map = generator
            .generate(&building, 0, &PlacementRegistry::new(), &[], 1.0)
            .unwrap();

        assert!(map.points.is_empty());
        assert!(!map.recommendations.is_empty());
    }

    #[test]
    fn test_unknown_floor_placeholder() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();
        let map = generator
            .generate(&building, 7, &placements, &[], 1.0)
            .unwrap();

        assert!(map.points.is_empty());
        assert!(!map.recommendations.is_empty());
    }

    #[test]
    fn test_peak_at_node_position() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();
        let map = generator
            .generate(&building, 0, &placements, &[], 1.0)
            .unwrap();

        // 11x11 grid on a 10x10 floor at 1m resolution.
        assert_eq!(map.points.len(), 121);

        // The cell under the node is at least as good as every other
        // cell and strictly better than the far corner.
        let center = map
            .points
            .iter()
            .find(|p| p.x == 5.0 && p.y == 5.0)
            .unwrap();
        assert!(map.points.iter().all(|p| p.quality <= center.quality));
        let corner = map
            .points
            .iter()
            .find(|p| p.x == 0.0 && p.y == 0.0)
            .unwrap();
        assert!(corner.signal_24_dbm < center.signal_24_dbm);
        assert_eq!(center.primary_node.as_deref(), Some("main"));
    }

    #[test]
    fn test_determinism() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();

        let a = generator
            .generate(&building, 0, &placements, &[], 1.0)
            .unwrap();
        let b = generator
            .generate(&building, 0, &placements, &[], 1.0)
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_quality_clamped() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();
        let map = generator
            .generate(&building, 0, &placements, &[], 1.0)
            .unwrap();

        for point in &map.points {
            assert!(point.quality >= 0.0 && point.quality <= 100.0);
        }
    }

    #[test]
    fn test_cross_floor_attenuation() {
        let building = Building::new(vec![
            FloorPlan::new(0, "Ground", 10.0, 10.0),
            FloorPlan::new(1, "Upstairs", 10.0, 10.0),
        ]);
        let mut placements = PlacementRegistry::new();
        placements.upsert(NodePlacement::new(
            "main",
            0,
            "Ground",
            Point3::new(5.0, 5.0, 1.0),
        ));

        let generator = HeatmapGenerator::default();
        let same_floor = generator
            .generate(&building, 0, &placements, &[], 2.0)
            .unwrap();
        let upstairs = generator
            .generate(&building, 1, &placements, &[], 2.0)
            .unwrap();

        assert!(upstairs.average_quality < same_floor.average_quality);
        // Upstairs has no local node, which the recommendations call out.
        assert!(upstairs
            .recommendations
            .iter()
            .any(|r| r.contains("floor 1")));
    }

    #[test]
    fn test_interference_derates_quality() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();

        let quiet = generator
            .generate(&building, 0, &placements, &[], 1.0)
            .unwrap();
        let noisy_neighbor = NeighborNetwork::new("next-door", 6, WifiBand::Ghz24, -45.0);
        let noisy = generator
            .generate(&building, 0, &placements, &[noisy_neighbor], 1.0)
            .unwrap();

        assert!(noisy.average_quality < quiet.average_quality);
    }

    #[test]
    fn test_building_recorded_neighbors_interfere() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();
        let quiet = generator
            .generate(&building, 0, &placements, &[], 1.0)
            .unwrap();

        let noisy_building = building
            .with_neighbors(vec![NeighborNetwork::new("next-door", 6, WifiBand::Ghz24, -45.0)]);
        let noisy = generator
            .generate(&noisy_building, 0, &placements, &[], 1.0)
            .unwrap();

        assert!(noisy.average_quality < quiet.average_quality);
    }

    #[test]
    fn test_weak_neighbor_invisible() {
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();

        let quiet = generator
            .generate(&building, 0, &placements, &[], 1.0)
            .unwrap();
        let faint = NeighborNetwork::new("far-away", 1, WifiBand::Ghz24, -85.0);
        let with_faint = generator
            .generate(&building, 0, &placements, &[faint], 1.0)
            .unwrap();

        assert_eq!(quiet.average_quality, with_faint.average_quality);
    }

    #[test]
    fn test_dead_zones_on_large_sparse_floor() {
        // A single node in the corner of a very large floor leaves the
        // far corner below the usability threshold.
        let building = Building::new(vec![FloorPlan::new(0, "Warehouse", 120.0, 120.0)]);
        let mut placements = PlacementRegistry::new();
        placements.upsert(NodePlacement::new(
            "main",
            0,
            "Warehouse",
            Point3::new(2.0, 2.0, 1.0),
        ));

        let generator = HeatmapGenerator::default();
        let map = generator
            .generate(&building, 0, &placements, &[], 6.0)
            .unwrap();

        assert!(!map.dead_zones.is_empty());
        let zone = &map.dead_zones[0];
        assert!(zone.cell_count >= 2);
        // The weak area is in the far corner, away from the node.
        assert!(zone.center_x > 60.0 || zone.center_y > 60.0);
    }

    #[test]
    fn test_optimal_placement_on_sparse_floor() {
        let building = Building::new(vec![FloorPlan::new(0, "Warehouse", 60.0, 60.0)]);
        let mut placements = PlacementRegistry::new();
        placements.upsert(NodePlacement::new(
            "main",
            0,
            "Warehouse",
            Point3::new(5.0, 5.0, 1.0),
        ));

        let generator = HeatmapGenerator::default();
        let suggestion = generator
            .find_optimal_placement(&building, 0, &placements, &[])
            .expect("a second node should improve a 60x60 floor");

        assert!(suggestion.improvement() > 5.0);
        // The suggestion respects the 5m margins.
        assert!(suggestion.position.x >= 5.0 && suggestion.position.x <= 55.0);
        assert!(suggestion.position.y >= 5.0 && suggestion.position.y <= 55.0);
        // And lands away from the existing corner node.
        assert!(suggestion.position.distance_2d(&Point3::new(5.0, 5.0, 1.0)) > 10.0);
    }

    #[test]
    fn test_optimal_placement_none_when_saturated() {
        // Small floor already well covered: no worthwhile improvement.
        let (building, placements) = one_node_setup();
        let generator = HeatmapGenerator::default();
        let suggestion = generator.find_optimal_placement(&building, 0, &placements, &[]);
        assert!(suggestion.is_none());
    }
}
