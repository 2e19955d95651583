//! Problem taxonomy and registry
//!
//! Detected problems are plain values with deterministic ids: the same
//! root cause on the same affected entity always produces the same id, so
//! repeated analysis passes update entries instead of duplicating them.
//!
//! The [`ProblemRegistry`] is owned by the caller, not the detector. The
//! detector stays pure (snapshot in, fresh problem list out) and the
//! caller reconciles that list against prior state:
//!
//! ```rust,ignore
//! let detected = detector.analyze(&input);
//! registry.merge(detected.clone());
//! registry.reconcile(&detected, input.state.captured_at); // optional auto-resolve
//! ```
//!
//! When analyses run from multiple threads the registry requires
//! single-writer discipline; wrap it in the synchronization of your
//! choice. Everything else in this crate is freely shareable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Problem severity, least to most serious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// What kind of condition a problem describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemCategory {
    /// Device signal below usable thresholds
    SignalWeakness,
    /// Foreign networks or non-WiFi emitters degrading the spectrum
    Interference,
    /// Channel airtime saturation
    Congestion,
    /// Device bouncing between nodes
    RoamingIssue,
    /// Device repeatedly dropping its connection
    DeviceInstability,
    /// WiFi/Zigbee spectral collision
    FrequencyOverlap,
    /// Suboptimal or unsafe radio configuration
    ConfigurationError,
    /// Node resources (clients, CPU, memory) exhausted
    CapacityExceeded,
    /// Zigbee device or network weakness
    ZigbeeIssue,
    /// Non-WiFi infrastructure bottleneck (switch, firewall, NAS)
    InfrastructureIssue,
}

impl ProblemCategory {
    /// Stable slug used as the id prefix.
    pub fn slug(&self) -> &'static str {
        match self {
            ProblemCategory::SignalWeakness => "signal",
            ProblemCategory::Interference => "interference",
            ProblemCategory::Congestion => "congestion",
            ProblemCategory::RoamingIssue => "roaming",
            ProblemCategory::DeviceInstability => "stability",
            ProblemCategory::FrequencyOverlap => "overlap",
            ProblemCategory::ConfigurationError => "config",
            ProblemCategory::CapacityExceeded => "capacity",
            ProblemCategory::ZigbeeIssue => "zigbee",
            ProblemCategory::InfrastructureIssue => "infra",
        }
    }
}

/// A detected network problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkProblem {
    /// Deterministic id: `<category-slug>-<qualifier>-<affected-id>`.
    /// Identical conditions yield identical ids across passes.
    pub id: String,
    /// Condition category
    pub category: ProblemCategory,
    /// Severity
    pub severity: Severity,
    /// Affected device MACs / Zigbee ieee ids
    pub affected_devices: Vec<String>,
    /// Affected mesh node ids
    pub affected_nodes: Vec<String>,
    /// Human description of the observed condition
    pub description: String,
    /// Root cause, as far as the rule can tell
    pub root_cause: String,
    /// Suggested remediation
    pub recommendation: String,
    /// Whether an automation layer could apply the fix unattended
    pub auto_fixable: bool,
    /// When the condition was first detected (Unix seconds)
    pub detected_at: u64,
    /// When the condition was resolved; None while active
    pub resolved_at: Option<u64>,
}

impl NetworkProblem {
    /// Create an active problem. The id should come from
    /// [`NetworkProblem::make_id`] so that re-detection is idempotent.
    pub fn new(
        id: String,
        category: ProblemCategory,
        severity: Severity,
        detected_at: u64,
    ) -> Self {
        Self {
            id,
            category,
            severity,
            affected_devices: Vec::new(),
            affected_nodes: Vec::new(),
            description: String::new(),
            root_cause: String::new(),
            recommendation: String::new(),
            auto_fixable: false,
            detected_at,
            resolved_at: None,
        }
    }

    /// Build a deterministic problem id.
    pub fn make_id(category: ProblemCategory, qualifier: &str, affected: &str) -> String {
        format!("{}-{}-{}", category.slug(), qualifier, affected)
    }

    /// Attach affected devices (builder style).
    pub fn with_devices(mut self, devices: Vec<String>) -> Self {
        self.affected_devices = devices;
        self
    }

    /// Attach affected nodes (builder style).
    pub fn with_nodes(mut self, nodes: Vec<String>) -> Self {
        self.affected_nodes = nodes;
        self
    }

    /// Set the description texts (builder style).
    pub fn with_texts(mut self, description: &str, root_cause: &str, recommendation: &str) -> Self {
        self.description = description.to_string();
        self.root_cause = root_cause.to_string();
        self.recommendation = recommendation.to_string();
        self
    }

    /// Mark the problem auto-fixable (builder style).
    pub fn auto_fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }

    /// True while the problem has not been resolved.
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Keyed collection of problems across analysis passes. Owned by the
/// caller; the detector never touches it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemRegistry {
    problems: HashMap<String, NetworkProblem>,
}

impl ProblemRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a fresh detection pass.
    ///
    /// New ids are inserted as-is. Existing active entries are updated in
    /// place but keep their original `detected_at`, so "how long has this
    /// been broken" survives re-analysis. Previously resolved entries that
    /// reappear are re-opened with the new detection time.
    pub fn merge(&mut self, detected: Vec<NetworkProblem>) {
        for problem in detected {
            match self.problems.get_mut(&problem.id) {
                Some(existing) if existing.is_active() => {
                    let first_detected = existing.detected_at;
                    *existing = problem;
                    existing.detected_at = first_detected;
                }
                _ => {
                    self.problems.insert(problem.id.clone(), problem);
                }
            }
        }
    }

    /// Resolve every active problem whose id is absent from the latest
    /// detection pass. Returns the number of problems resolved.
    pub fn reconcile(&mut self, detected: &[NetworkProblem], now: u64) -> usize {
        let current: std::collections::HashSet<&str> =
            detected.iter().map(|p| p.id.as_str()).collect();
        let mut resolved = 0;
        for problem in self.problems.values_mut() {
            if problem.is_active() && !current.contains(problem.id.as_str()) {
                problem.resolved_at = Some(now);
                resolved += 1;
            }
        }
        resolved
    }

    /// Explicitly resolve one problem. Returns false for unknown ids or
    /// already-resolved entries.
    pub fn resolve(&mut self, id: &str, now: u64) -> bool {
        match self.problems.get_mut(id) {
            Some(problem) if problem.is_active() => {
                problem.resolved_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Look up a problem by id.
    pub fn get(&self, id: &str) -> Option<&NetworkProblem> {
        self.problems.get(id)
    }

    /// Active problems, sorted by severity (most severe first) then id.
    pub fn active(&self) -> Vec<&NetworkProblem> {
        let mut active: Vec<&NetworkProblem> =
            self.problems.values().filter(|p| p.is_active()).collect();
        active.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.id.cmp(&b.id)));
        active
    }

    /// All problems including resolved ones, sorted by id.
    pub fn all(&self) -> Vec<&NetworkProblem> {
        let mut all: Vec<&NetworkProblem> = self.problems.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Drop resolved problems. Returns the number removed.
    pub fn prune_resolved(&mut self) -> usize {
        let before = self.problems.len();
        self.problems.retain(|_, p| p.is_active());
        before - self.problems.len()
    }

    /// Total problem count, resolved included.
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.problems.clear();
    }
}
