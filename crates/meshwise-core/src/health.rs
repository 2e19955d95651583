//! Composite health scoring and connection-stability reporting
//!
//! Folds a detection pass into a six-category health score. Every
//! category starts at 100 and loses a severity-based penalty for each
//! active problem mapped to it; configuration problems count at half
//! weight. The overall score is the clamped mean of the categories, so a
//! pile of warnings in one category cannot zero out the whole network.
//!
//! Also computes a per-device connection-stability report from the
//! device's connect/disconnect history.

use crate::problem::{NetworkProblem, ProblemCategory, Severity};
use crate::state::{ConnectionEvent, ConnectionEventKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The six scored categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthCategory {
    SignalQuality,
    ChannelOptimization,
    DeviceStability,
    MeshBackhaul,
    ZigbeeHealth,
    InterferenceLevel,
}

/// Which categories a problem type damages.
fn categories_for(category: ProblemCategory) -> &'static [HealthCategory] {
    match category {
        ProblemCategory::SignalWeakness => &[HealthCategory::SignalQuality],
        ProblemCategory::Interference => &[HealthCategory::InterferenceLevel],
        ProblemCategory::Congestion => &[HealthCategory::ChannelOptimization],
        ProblemCategory::RoamingIssue | ProblemCategory::DeviceInstability => {
            &[HealthCategory::DeviceStability]
        }
        ProblemCategory::FrequencyOverlap => {
            &[HealthCategory::InterferenceLevel, HealthCategory::ZigbeeHealth]
        }
        ProblemCategory::ConfigurationError => &[HealthCategory::ChannelOptimization],
        ProblemCategory::CapacityExceeded | ProblemCategory::InfrastructureIssue => {
            &[HealthCategory::MeshBackhaul]
        }
        ProblemCategory::ZigbeeIssue => &[HealthCategory::ZigbeeHealth],
    }
}

/// Score movement against the previous analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthTrend {
    Improving,
    Stable,
    Degrading,
}

/// The composite health score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkHealthScore {
    /// Mean of the six categories, clamped to [0, 100]
    pub overall: f64,
    pub signal_quality: f64,
    pub channel_optimization: f64,
    pub device_stability: f64,
    pub mesh_backhaul: f64,
    pub zigbee_health: f64,
    pub interference_level: f64,
    /// Movement against the previous score; `Stable` when there is no
    /// previous score to compare against
    pub trend: HealthTrend,
}

impl NetworkHealthScore {
    /// A perfect score with no history.
    pub fn perfect() -> Self {
        Self {
            overall: 100.0,
            signal_quality: 100.0,
            channel_optimization: 100.0,
            device_stability: 100.0,
            mesh_backhaul: 100.0,
            zigbee_health: 100.0,
            interference_level: 100.0,
            trend: HealthTrend::Stable,
        }
    }
}

/// Penalty weights and trend sensitivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Penalty per critical problem
    pub penalty_critical: f64,
    /// Penalty per error problem
    pub penalty_error: f64,
    /// Penalty per warning problem
    pub penalty_warning: f64,
    /// Penalty per info problem
    pub penalty_info: f64,
    /// Configuration problems apply at this fraction of the penalty
    pub configuration_factor: f64,
    /// Overall-score change below this is considered stable
    pub trend_threshold: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            penalty_critical: 30.0,
            penalty_error: 20.0,
            penalty_warning: 10.0,
            penalty_info: 5.0,
            configuration_factor: 0.5,
            trend_threshold: 5.0,
        }
    }
}

/// Health scorer.
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    config: HealthConfig,
}

impl HealthScorer {
    /// Create a scorer with custom weights.
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    /// Fold active problems into a score. Resolved problems in the input
    /// are ignored. `previous` feeds the trend tag.
    pub fn score(
        &self,
        problems: &[NetworkProblem],
        previous: Option<&NetworkHealthScore>,
    ) -> NetworkHealthScore {
        let mut categories = [100.0f64; 6];

        for problem in problems.iter().filter(|p| p.is_active()) {
            let mut penalty = match problem.severity {
                Severity::Critical => self.config.penalty_critical,
                Severity::Error => self.config.penalty_error,
                Severity::Warning => self.config.penalty_warning,
                Severity::Info => self.config.penalty_info,
            };
            if problem.category == ProblemCategory::ConfigurationError {
                penalty *= self.config.configuration_factor;
            }

            for &category in categories_for(problem.category) {
                let slot = &mut categories[category_slot(category)];
                *slot = (*slot - penalty).max(0.0);
            }
        }

        let overall =
            (categories.iter().sum::<f64>() / categories.len() as f64).clamp(0.0, 100.0);

        let trend = match previous {
            Some(prev) if overall > prev.overall + self.config.trend_threshold => {
                HealthTrend::Improving
            }
            Some(prev) if overall < prev.overall - self.config.trend_threshold => {
                HealthTrend::Degrading
            }
            _ => HealthTrend::Stable,
        };

        NetworkHealthScore {
            overall,
            signal_quality: categories[0],
            channel_optimization: categories[1],
            device_stability: categories[2],
            mesh_backhaul: categories[3],
            zigbee_health: categories[4],
            interference_level: categories[5],
            trend,
        }
    }
}

fn category_slot(category: HealthCategory) -> usize {
    match category {
        HealthCategory::SignalQuality => 0,
        HealthCategory::ChannelOptimization => 1,
        HealthCategory::DeviceStability => 2,
        HealthCategory::MeshBackhaul => 3,
        HealthCategory::ZigbeeHealth => 4,
        HealthCategory::InterferenceLevel => 5,
    }
}

/// Per-device connection stability over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStabilityReport {
    /// Device MAC
    pub device_mac: String,
    /// Period analyzed (Unix seconds, inclusive)
    pub period_start: u64,
    pub period_end: u64,
    /// Disconnects inside the period
    pub total_disconnects: usize,
    /// Mean paired connect-to-disconnect duration (seconds)
    pub average_connection_secs: Option<f64>,
    /// Longest paired connection (seconds)
    pub longest_connection_secs: Option<u64>,
    /// Shortest paired connection (seconds)
    pub shortest_connection_secs: Option<u64>,
    /// Disconnect reasons and their counts; reasonless events group
    /// under "unknown"
    pub disconnect_reasons: BTreeMap<String, usize>,
    /// 100 - 10 per disconnect - 20 if any disconnect occurred, floor 0
    pub stability_score: f64,
}

/// Compute a device's stability report from its event history.
///
/// Events outside the period or belonging to other devices are ignored.
/// Durations come from pairing each connect with the next disconnect;
/// unpaired events contribute to counts but not durations.
pub fn connection_stability(
    device_mac: &str,
    events: &[ConnectionEvent],
    period_start: u64,
    period_end: u64,
) -> ConnectionStabilityReport {
    let mac = crate::state::normalize_mac(device_mac);

    let mut relevant: Vec<&ConnectionEvent> = events
        .iter()
        .filter(|e| e.device_mac == mac)
        .filter(|e| e.timestamp >= period_start && e.timestamp <= period_end)
        .collect();
    relevant.sort_by_key(|e| e.timestamp);

    let mut total_disconnects = 0;
    let mut disconnect_reasons: BTreeMap<String, usize> = BTreeMap::new();
    let mut durations: Vec<u64> = Vec::new();
    let mut connected_since: Option<u64> = None;

    for event in &relevant {
        match &event.kind {
            ConnectionEventKind::Connected => {
                connected_since = Some(event.timestamp);
            }
            ConnectionEventKind::Disconnected { reason } => {
                total_disconnects += 1;
                let key = reason.clone().unwrap_or_else(|| "unknown".to_string());
                *disconnect_reasons.entry(key).or_default() += 1;
                if let Some(start) = connected_since.take() {
                    durations.push(event.timestamp.saturating_sub(start));
                }
            }
            ConnectionEventKind::Roamed { .. } => {}
        }
    }

    let average_connection_secs = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<u64>() as f64 / durations.len() as f64)
    };

    let mut stability_score = 100.0 - 10.0 * total_disconnects as f64;
    if total_disconnects > 0 {
        stability_score -= 20.0;
    }

    ConnectionStabilityReport {
        device_mac: mac,
        period_start,
        period_end,
        total_disconnects,
        average_connection_secs,
        longest_connection_secs: durations.iter().copied().max(),
        shortest_connection_secs: durations.iter().copied().min(),
        disconnect_reasons,
        stability_score: stability_score.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{NetworkProblem, ProblemCategory, Severity};

    fn problem(category: ProblemCategory, severity: Severity, affected: &str) -> NetworkProblem {
        let id = NetworkProblem::make_id(category, "test", affected);
        NetworkProblem::new(id, category, severity, 100)
    }

    #[test]
    fn test_no_problems_perfect_score() {
        let score = HealthScorer::default().score(&[], None);
        assert_eq!(score.overall, 100.0);
        assert_eq!(score.signal_quality, 100.0);
        assert_eq!(score.trend, HealthTrend::Stable);
    }

    #[test]
    fn test_penalties_by_severity() {
        let scorer = HealthScorer::default();

        let critical = scorer.score(
            &[problem(ProblemCategory::SignalWeakness, Severity::Critical, "a")],
            None,
        );
        assert_eq!(critical.signal_quality, 70.0);

        let warning = scorer.score(
            &[problem(ProblemCategory::SignalWeakness, Severity::Warning, "a")],
            None,
        );
        assert_eq!(warning.signal_quality, 90.0);
    }

    #[test]
    fn test_configuration_half_penalty() {
        let score = HealthScorer::default().score(
            &[problem(ProblemCategory::ConfigurationError, Severity::Warning, "wifi")],
            None,
        );
        assert_eq!(score.channel_optimization, 95.0);
    }

    #[test]
    fn test_overlap_hits_two_categories() {
        let score = HealthScorer::default().score(
            &[problem(ProblemCategory::FrequencyOverlap, Severity::Error, "zigbee")],
            None,
        );
        assert_eq!(score.interference_level, 80.0);
        assert_eq!(score.zigbee_health, 80.0);
        assert_eq!(score.signal_quality, 100.0);
    }

    #[test]
    fn test_category_floor_at_zero() {
        let problems: Vec<NetworkProblem> = (0..10)
            .map(|i| {
                problem(
                    ProblemCategory::SignalWeakness,
                    Severity::Critical,
                    &format!("dev-{}", i),
                )
            })
            .collect();
        let score = HealthScorer::default().score(&problems, None);

        assert_eq!(score.signal_quality, 0.0);
        assert!(score.overall >= 0.0 && score.overall <= 100.0);
        // Five untouched categories keep the overall above zero.
        assert!((score.overall - 500.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolved_problems_ignored() {
        let mut resolved = problem(ProblemCategory::SignalWeakness, Severity::Critical, "a");
        resolved.resolved_at = Some(200);
        let score = HealthScorer::default().score(&[resolved], None);
        assert_eq!(score.overall, 100.0);
    }

    #[test]
    fn test_trend_transitions() {
        let scorer = HealthScorer::default();
        let previous = scorer.score(
            &[
                problem(ProblemCategory::SignalWeakness, Severity::Critical, "a"),
                problem(ProblemCategory::Congestion, Severity::Error, "b"),
            ],
            None,
        );

        let improved = scorer.score(&[], Some(&previous));
        assert_eq!(improved.trend, HealthTrend::Improving);

        let same = scorer.score(
            &[
                problem(ProblemCategory::SignalWeakness, Severity::Critical, "a"),
                problem(ProblemCategory::Congestion, Severity::Error, "b"),
            ],
            Some(&previous),
        );
        assert_eq!(same.trend, HealthTrend::Stable);

        let worse = scorer.score(
            &[
                problem(ProblemCategory::SignalWeakness, Severity::Critical, "a"),
                problem(ProblemCategory::Congestion, Severity::Error, "b"),
                problem(ProblemCategory::ZigbeeIssue, Severity::Critical, "c"),
                problem(ProblemCategory::DeviceInstability, Severity::Critical, "d"),
            ],
            Some(&previous),
        );
        assert_eq!(worse.trend, HealthTrend::Degrading);
    }

    #[test]
    fn test_stability_report_pairs_durations() {
        use crate::state::ConnectionEvent;

        let mac = "aa:bb:cc:dd:ee:ff";
        let events = vec![
            ConnectionEvent::new(mac, 1000, ConnectionEventKind::Connected),
            ConnectionEvent::new(
                mac,
                1600,
                ConnectionEventKind::Disconnected {
                    reason: Some("beacon loss".into()),
                },
            ),
            ConnectionEvent::new(mac, 2000, ConnectionEventKind::Connected),
            ConnectionEvent::new(
                mac,
                2200,
                ConnectionEventKind::Disconnected { reason: None },
            ),
        ];

        let report = connection_stability(mac, &events, 0, 10_000);

        assert_eq!(report.total_disconnects, 2);
        assert_eq!(report.longest_connection_secs, Some(600));
        assert_eq!(report.shortest_connection_secs, Some(200));
        assert!((report.average_connection_secs.unwrap() - 400.0).abs() < 1e-9);
        assert_eq!(report.disconnect_reasons.get("beacon loss"), Some(&1));
        assert_eq!(report.disconnect_reasons.get("unknown"), Some(&1));
        // 100 - 2*10 - 20
        assert_eq!(report.stability_score, 60.0);
    }

    #[test]
    fn test_stability_report_clean_device() {
        let events = vec![ConnectionEvent::new(
            "aa:bb:cc:dd:ee:ff",
            1000,
            ConnectionEventKind::Connected,
        )];
        let report = connection_stability("aa:bb:cc:dd:ee:ff", &events, 0, 10_000);

        assert_eq!(report.total_disconnects, 0);
        assert_eq!(report.stability_score, 100.0);
        assert!(report.average_connection_secs.is_none());
    }

    #[test]
    fn test_stability_score_floor() {
        let events: Vec<ConnectionEvent> = (0..20)
            .map(|i| {
                ConnectionEvent::new(
                    "aa:bb:cc:dd:ee:ff",
                    1000 + i,
                    ConnectionEventKind::Disconnected { reason: None },
                )
            })
            .collect();
        let report = connection_stability("aa:bb:cc:dd:ee:ff", &events, 0, 10_000);
        assert_eq!(report.stability_score, 0.0);
    }

    #[test]
    fn test_stability_report_filters_period_and_device() {
        let events = vec![
            ConnectionEvent::new(
                "aa:bb:cc:dd:ee:ff",
                50,
                ConnectionEventKind::Disconnected { reason: None },
            ),
            ConnectionEvent::new(
                "11:22:33:44:55:66",
                1500,
                ConnectionEventKind::Disconnected { reason: None },
            ),
            ConnectionEvent::new(
                "aa:bb:cc:dd:ee:ff",
                1500,
                ConnectionEventKind::Disconnected { reason: None },
            ),
        ];
        let report = connection_stability("AA:BB:CC:DD:EE:FF", &events, 1000, 2000);
        assert_eq!(report.total_disconnects, 1);
    }
}
