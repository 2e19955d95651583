//! Benchmark scoring
//!
//! Turns raw latency and throughput probe samples into a 0-100 composite
//! score with four subscores:
//!
//! - **Latency**: bucketed mean round-trip time
//! - **Throughput**: bucketed mean Mbps
//! - **Stability**: derived from packet loss and jitter
//! - **Coverage**: an estimate derived from loss/jitter/throughput tiers,
//!   since no spatial ground truth exists at benchmark time
//!
//! The overall score blends latency, throughput, and stability at
//! 0.3/0.4/0.3. Results compare against the immediately preceding result
//! to produce an improving/stable/degrading trend.
//!
//! A missing sample type scores neutral (50) rather than failing; the
//! core never errors on absent data.

use serde::{Deserialize, Serialize};

/// One latency probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Round-trip time (milliseconds)
    pub rtt_ms: f64,
    /// Jitter (milliseconds)
    pub jitter_ms: f64,
    /// Packet loss during the probe (0-100%)
    pub loss_percent: f64,
}

impl LatencySample {
    /// Create a sample.
    pub fn new(rtt_ms: f64, jitter_ms: f64, loss_percent: f64) -> Self {
        Self {
            rtt_ms,
            jitter_ms,
            loss_percent,
        }
    }
}

/// One throughput probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSample {
    /// Measured rate (Mbps)
    pub mbps: f64,
}

impl ThroughputSample {
    /// Create a sample.
    pub fn new(mbps: f64) -> Self {
        Self { mbps }
    }
}

/// Raw samples for one benchmark run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkSamples {
    /// Latency probes
    pub latency: Vec<LatencySample>,
    /// Throughput probes
    pub throughput: Vec<ThroughputSample>,
}

impl BenchmarkSamples {
    fn mean_rtt(&self) -> Option<f64> {
        mean(self.latency.iter().map(|s| s.rtt_ms))
    }

    fn mean_jitter(&self) -> Option<f64> {
        mean(self.latency.iter().map(|s| s.jitter_ms))
    }

    fn mean_loss(&self) -> Option<f64> {
        mean(self.latency.iter().map(|s| s.loss_percent))
    }

    fn mean_mbps(&self) -> Option<f64> {
        mean(self.throughput.iter().map(|s| s.mbps))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        None
    } else {
        Some(collected.iter().sum::<f64>() / collected.len() as f64)
    }
}

/// Score movement against the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTrend {
    Improving,
    Stable,
    Degrading,
}

/// Comparison against the preceding result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// Overall score of the previous run
    pub previous_overall: f64,
    /// This run minus the previous run
    pub delta: f64,
    /// Classified movement
    pub trend: ScoreTrend,
}

/// A scored benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSuiteResult {
    /// Caller-chosen run id
    pub id: String,
    /// When the run finished (Unix seconds)
    pub timestamp: u64,
    /// The raw samples the scores were derived from
    pub samples: BenchmarkSamples,
    /// Bucketed latency score (0-100)
    pub latency_score: f64,
    /// Bucketed throughput score (0-100)
    pub throughput_score: f64,
    /// Loss/jitter-derived stability score (0-100)
    pub stability_score: f64,
    /// Coverage estimate (0-100)
    pub coverage_score: f64,
    /// 0.3 * latency + 0.4 * throughput + 0.3 * stability
    pub overall: f64,
    /// Against the previous run, if one was supplied
    pub comparison: Option<BenchmarkComparison>,
}

/// Scoring weights and trend sensitivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Weight of the latency subscore in the overall blend
    pub latency_weight: f64,
    /// Weight of the throughput subscore
    pub throughput_weight: f64,
    /// Weight of the stability subscore
    pub stability_weight: f64,
    /// Subscore used when a sample type is missing
    pub neutral_score: f64,
    /// Overall change below this is a stable trend
    pub trend_threshold: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            latency_weight: 0.3,
            throughput_weight: 0.4,
            stability_weight: 0.3,
            neutral_score: 50.0,
            trend_threshold: 5.0,
        }
    }
}

/// Benchmark scorer.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkScorer {
    config: BenchmarkConfig,
}

impl BenchmarkScorer {
    /// Create a scorer with custom weights.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Score one run. `previous` is the immediately preceding stored
    /// result and only feeds the comparison.
    pub fn score(
        &self,
        id: &str,
        timestamp: u64,
        samples: BenchmarkSamples,
        previous: Option<&BenchmarkSuiteResult>,
    ) -> BenchmarkSuiteResult {
        let latency_score = samples
            .mean_rtt()
            .map(latency_bucket)
            .unwrap_or(self.config.neutral_score);
        let throughput_score = samples
            .mean_mbps()
            .map(throughput_bucket)
            .unwrap_or(self.config.neutral_score);

        let stability_score = match (samples.mean_loss(), samples.mean_jitter()) {
            (Some(loss), Some(jitter)) => (100.0 - 10.0 * loss - jitter).clamp(0.0, 100.0),
            _ => self.config.neutral_score,
        };

        let coverage_score = self.coverage_estimate(&samples);

        let overall = (self.config.latency_weight * latency_score
            + self.config.throughput_weight * throughput_score
            + self.config.stability_weight * stability_score)
            .clamp(0.0, 100.0);

        let comparison = previous.map(|prev| {
            let delta = overall - prev.overall;
            let trend = if delta > self.config.trend_threshold {
                ScoreTrend::Improving
            } else if delta < -self.config.trend_threshold {
                ScoreTrend::Degrading
            } else {
                ScoreTrend::Stable
            };
            BenchmarkComparison {
                previous_overall: prev.overall,
                delta,
                trend,
            }
        });

        BenchmarkSuiteResult {
            id: id.to_string(),
            timestamp,
            samples,
            latency_score,
            throughput_score,
            stability_score,
            coverage_score,
            overall,
            comparison,
        }
    }

    /// Coverage estimate: derate 100 by loss, jitter tiers, and
    /// low-throughput tiers. There is no spatial ground truth at
    /// benchmark time, so this is a proxy, not a measurement.
    fn coverage_estimate(&self, samples: &BenchmarkSamples) -> f64 {
        let mut score: f64 = 100.0;

        if let Some(loss) = samples.mean_loss() {
            score -= loss * 5.0;
        }
        if let Some(jitter) = samples.mean_jitter() {
            if jitter > 20.0 {
                score -= 20.0;
            } else if jitter > 10.0 {
                score -= 10.0;
            }
        }
        if let Some(mbps) = samples.mean_mbps() {
            if mbps < 50.0 {
                score -= 30.0;
            } else if mbps < 100.0 {
                score -= 15.0;
            }
        }

        score.clamp(0.0, 100.0)
    }
}

/// Bucketed latency score.
fn latency_bucket(rtt_ms: f64) -> f64 {
    if rtt_ms < 10.0 {
        100.0
    } else if rtt_ms < 30.0 {
        90.0
    } else if rtt_ms < 50.0 {
        80.0
    } else if rtt_ms < 100.0 {
        60.0
    } else {
        40.0
    }
}

/// Bucketed throughput score.
fn throughput_bucket(mbps: f64) -> f64 {
    if mbps > 500.0 {
        100.0
    } else if mbps > 300.0 {
        90.0
    } else if mbps > 200.0 {
        80.0
    } else if mbps > 100.0 {
        60.0
    } else if mbps > 50.0 {
        40.0
    } else {
        20.0
    }
}
