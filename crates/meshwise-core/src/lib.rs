//! # Meshwise Core
//!
//! Analysis engine for home mesh networks. Telemetry collaborators feed in
//! read-only snapshots (mesh state, Zigbee state, channel scans, node
//! placements, connection history, benchmark probes) and this crate turns
//! them into actionable intelligence:
//!
//! - **Device positions** via RSSI multilateration ([`position`])
//! - **Per-floor coverage heatmaps** with dead zones ([`heatmap`])
//! - **Detected problems** with severity and root cause ([`detector`], [`problem`])
//! - **A composite health score** across six categories ([`health`])
//! - **Frequency-conflict reports** for WiFi neighbors and Zigbee ([`channels`])
//! - **Benchmark scores** with trends and **hardware compatibility** ([`benchmark`], [`compat`])
//!
//! ## Data Flow
//!
//! ```text
//! acquisition collaborators                 this crate                     consumers
//! ┌──────────────────────┐    ┌──────────────────────────────────┐    ┌──────────────┐
//! │ MeshNetworkState     │───▶│ ProblemDetector ──▶ NetworkProblem │──▶│ automation / │
//! │ ZigbeeNetworkState   │───▶│ HealthScorer   ──▶ HealthScore    │──▶│ persistence /│
//! │ ChannelScanResult[]  │───▶│ ConflictAnalyzer ─▶ Conflicts     │──▶│ rendering    │
//! │ PlacementRegistry    │───▶│ HeatmapGenerator ─▶ FloorHeatmap  │──▶│              │
//! │ SignalReading[]      │───▶│ PositionEstimator ▶ SpatialMap    │──▶│              │
//! │ benchmark probes     │───▶│ BenchmarkScorer ──▶ SuiteResult   │──▶│              │
//! └──────────────────────┘    └──────────────────────────────────┘    └──────────────┘
//! ```
//!
//! The core is pure, synchronous, and deterministic: no I/O, no clock, no
//! randomness. Identical inputs produce identical problem ids and
//! numerically identical scores, so callers can diff successive analyses.
//! Every analyzer is freely shareable across threads; the only mutable
//! state is the caller-owned [`problem::ProblemRegistry`].
//!
//! ## Example
//!
//! ```rust
//! use meshwise_core::prelude::*;
//!
//! let state = MeshNetworkState::new(
//!     1_700_000_000,
//!     vec![MeshNode::new("main", "Main router", "aa:bb:cc:00:00:01", NodeRole::Main)],
//!     vec![NetworkDevice::new("11:22:33:44:55:66", ConnectionType::Wireless5)
//!         .with_node("main")
//!         .with_signal(-88.0)],
//! );
//!
//! let detector = ProblemDetector::default();
//! let problems = detector.analyze(&AnalysisInput::from_state(&state));
//! assert_eq!(problems[0].id, "signal-critical-11:22:33:44:55:66");
//!
//! let score = HealthScorer::default().score(&problems, None);
//! assert!(score.overall < 100.0);
//! ```

pub mod benchmark;
pub mod channels;
pub mod clustering;
pub mod compat;
pub mod detector;
pub mod geometry;
pub mod health;
pub mod heatmap;
pub mod position;
pub mod problem;
pub mod signal;
pub mod state;
pub mod zigbee;

// Re-export main types
pub use benchmark::{BenchmarkSamples, BenchmarkScorer, BenchmarkSuiteResult, ScoreTrend};
pub use channels::{
    ConflictAnalyzer, ConflictImpact, FrequencyConflict, NeighborConflict, OverlapSeverity,
};
pub use compat::{CompatibilityAnalyzer, CompatibilityReport, HardwareModel, WifiGeneration};
pub use detector::{AnalysisInput, DetectorConfig, ProblemDetector};
pub use geometry::{Building, FloorPlan, NodePlacement, PlacementRegistry, Point3};
pub use health::{ConnectionStabilityReport, HealthScorer, HealthTrend, NetworkHealthScore};
pub use heatmap::{AnalysisError, DeadZone, FloorHeatmap, HeatmapGenerator, HeatmapPoint};
pub use position::{PositionEstimate, PositionEstimator, SignalReading, SpatialMap};
pub use problem::{NetworkProblem, ProblemCategory, ProblemRegistry, Severity};
pub use state::{MeshNetworkState, MeshNode, NetworkDevice, WifiSettings};
pub use zigbee::ZigbeeNetworkState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::benchmark::{BenchmarkSamples, BenchmarkScorer, BenchmarkSuiteResult};
    pub use crate::channels::{ConflictAnalyzer, FrequencyConflict};
    pub use crate::compat::{CompatibilityAnalyzer, CompatibilityReport};
    pub use crate::detector::{AnalysisInput, ProblemDetector};
    pub use crate::geometry::{Building, FloorPlan, NodePlacement, PlacementRegistry, Point3};
    pub use crate::health::{HealthScorer, NetworkHealthScore};
    pub use crate::heatmap::{FloorHeatmap, HeatmapGenerator};
    pub use crate::position::{PositionEstimator, SignalReading, SpatialMap};
    pub use crate::problem::{NetworkProblem, ProblemRegistry, Severity};
    pub use crate::state::{
        ConnectionEvent, ConnectionType, MeshNetworkState, MeshNode, NetworkDevice, NodeRole,
        WifiSettings,
    };
    pub use crate::zigbee::{ZigbeeDevice, ZigbeeDeviceType, ZigbeeNetworkState};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
