//! Mixed-generation mesh compatibility analysis
//!
//! Home meshes accumulate hardware over the years: a WiFi 7 flagship next
//! to a WiFi 5 hand-me-down. The mesh runs at the lowest common
//! denominator, so this module computes:
//!
//! - The lowest common WiFi generation across all node models
//! - The capability set every node shares
//! - Advisory (never blocking) recommendations for mixed setups
//! - A 0-100 compatibility score
//!
//! Hardware knowledge is an enum-keyed table; free-form model strings
//! from telemetry resolve through [`HardwareModel::parse`], which
//! lowercases and strips separators before matching. Unknown models are
//! reported, not guessed at.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// WiFi generation, oldest to newest. The ordinal order drives
/// lowest-common-generation computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WifiGeneration {
    /// 802.11ac
    Wifi5,
    /// 802.11ax
    Wifi6,
    /// 802.11ax with 6GHz
    Wifi6E,
    /// 802.11be
    Wifi7,
}

impl WifiGeneration {
    /// Marketing name.
    pub fn name(&self) -> &'static str {
        match self {
            WifiGeneration::Wifi5 => "WiFi 5",
            WifiGeneration::Wifi6 => "WiFi 6",
            WifiGeneration::Wifi6E => "WiFi 6E",
            WifiGeneration::Wifi7 => "WiFi 7",
        }
    }

    fn ordinal(&self) -> u8 {
        match self {
            WifiGeneration::Wifi5 => 0,
            WifiGeneration::Wifi6 => 1,
            WifiGeneration::Wifi6E => 2,
            WifiGeneration::Wifi7 => 3,
        }
    }
}

/// A hardware capability relevant to mesh behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    Beamforming,
    MuMimo,
    Ofdma,
    Wpa3,
    TargetWakeTime,
    Band160Mhz,
    TriBand,
    Band6Ghz,
    MultiLinkOperation,
}

/// Known mesh-capable router models.
///
/// The table is intentionally small and explicit: a model is either here
/// with vetted data or it is unknown. Extend by adding a variant and its
/// rows in the three match tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareModel {
    RtAc68u,
    RtAc86u,
    RtAx58u,
    RtAx86u,
    RtAx92u,
    ZenWifiXt8,
    GtAxe11000,
    ZenWifiEt8,
    GtBe98,
    RtBe96u,
}

impl HardwareModel {
    /// Resolve a free-form model string.
    ///
    /// Normalization: lowercase, then strip dashes, underscores, dots,
    /// and whitespace. "RT-AX86U", "rt_ax86u", and "Rt Ax86u" all match
    /// [`HardwareModel::RtAx86u`].
    pub fn parse(model: &str) -> Option<Self> {
        let normalized: String = model
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | '.' | ' '))
            .collect();

        match normalized.as_str() {
            "rtac68u" => Some(HardwareModel::RtAc68u),
            "rtac86u" => Some(HardwareModel::RtAc86u),
            "rtax58u" => Some(HardwareModel::RtAx58u),
            "rtax86u" => Some(HardwareModel::RtAx86u),
            "rtax92u" => Some(HardwareModel::RtAx92u),
            "zenwifixt8" | "xt8" => Some(HardwareModel::ZenWifiXt8),
            "gtaxe11000" => Some(HardwareModel::GtAxe11000),
            "zenwifiet8" | "et8" => Some(HardwareModel::ZenWifiEt8),
            "gtbe98" => Some(HardwareModel::GtBe98),
            "rtbe96u" => Some(HardwareModel::RtBe96u),
            _ => None,
        }
    }

    /// WiFi generation of the model.
    pub fn generation(&self) -> WifiGeneration {
        match self {
            HardwareModel::RtAc68u | HardwareModel::RtAc86u => WifiGeneration::Wifi5,
            HardwareModel::RtAx58u
            | HardwareModel::RtAx86u
            | HardwareModel::RtAx92u
            | HardwareModel::ZenWifiXt8 => WifiGeneration::Wifi6,
            HardwareModel::GtAxe11000 | HardwareModel::ZenWifiEt8 => WifiGeneration::Wifi6E,
            HardwareModel::GtBe98 | HardwareModel::RtBe96u => WifiGeneration::Wifi7,
        }
    }

    /// Number of radio bands.
    pub fn band_count(&self) -> u8 {
        match self {
            HardwareModel::RtAc68u
            | HardwareModel::RtAc86u
            | HardwareModel::RtAx58u
            | HardwareModel::RtAx86u => 2,
            HardwareModel::RtAx92u
            | HardwareModel::ZenWifiXt8
            | HardwareModel::GtAxe11000
            | HardwareModel::ZenWifiEt8
            | HardwareModel::GtBe98
            | HardwareModel::RtBe96u => 3,
        }
    }

    /// Capabilities of the model.
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            HardwareModel::RtAc68u => &[Beamforming],
            HardwareModel::RtAc86u => &[Beamforming, MuMimo],
            HardwareModel::RtAx58u => &[Beamforming, MuMimo, Ofdma, Wpa3, TargetWakeTime],
            HardwareModel::RtAx86u => {
                &[Beamforming, MuMimo, Ofdma, Wpa3, TargetWakeTime, Band160Mhz]
            }
            HardwareModel::RtAx92u => {
                &[Beamforming, MuMimo, Ofdma, Wpa3, TargetWakeTime, Band160Mhz, TriBand]
            }
            HardwareModel::ZenWifiXt8 => {
                &[Beamforming, MuMimo, Ofdma, Wpa3, TargetWakeTime, Band160Mhz, TriBand]
            }
            HardwareModel::GtAxe11000 => &[
                Beamforming,
                MuMimo,
                Ofdma,
                Wpa3,
                TargetWakeTime,
                Band160Mhz,
                TriBand,
                Band6Ghz,
            ],
            HardwareModel::ZenWifiEt8 => &[
                Beamforming,
                MuMimo,
                Ofdma,
                Wpa3,
                TargetWakeTime,
                Band160Mhz,
                TriBand,
                Band6Ghz,
            ],
            HardwareModel::GtBe98 | HardwareModel::RtBe96u => &[
                Beamforming,
                MuMimo,
                Ofdma,
                Wpa3,
                TargetWakeTime,
                Band160Mhz,
                TriBand,
                Band6Ghz,
                MultiLinkOperation,
            ],
        }
    }
}

/// One advisory recommendation for a mixed mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedMeshRecommendation {
    /// Short summary
    pub summary: String,
    /// Explanation and suggested action
    pub detail: String,
}

/// Result of a compatibility analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// Models that resolved, deduplicated, in input order
    pub models: Vec<HardwareModel>,
    /// Input strings that did not resolve
    pub unknown_models: Vec<String>,
    /// The generation the mesh effectively runs at
    pub lowest_common_generation: Option<WifiGeneration>,
    /// The newest generation present
    pub newest_generation: Option<WifiGeneration>,
    /// Capabilities shared by every resolved model, sorted
    pub shared_capabilities: Vec<Capability>,
    /// Advisory guidance; never blocks a configuration
    pub recommendations: Vec<MixedMeshRecommendation>,
    /// 0-100; penalties for generation spread, lost capabilities, and
    /// the presence of the oldest generation
    pub score: f64,
}

/// Penalty weights for compatibility scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Penalty per generation step between the oldest and newest model
    pub generation_gap_penalty: f64,
    /// Penalty per capability not shared by all models
    pub missing_capability_penalty: f64,
    /// Penalty when a WiFi 5 model is present at all
    pub oldest_generation_penalty: f64,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            generation_gap_penalty: 10.0,
            missing_capability_penalty: 5.0,
            oldest_generation_penalty: 10.0,
        }
    }
}

/// Mixed-generation compatibility analyzer.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityAnalyzer {
    config: CompatConfig,
}

impl CompatibilityAnalyzer {
    /// Create an analyzer with custom penalties.
    pub fn new(config: CompatConfig) -> Self {
        Self { config }
    }

    /// Analyze the model strings reported by the mesh nodes.
    pub fn analyze(&self, model_strings: &[String]) -> CompatibilityReport {
        let mut models: Vec<HardwareModel> = Vec::new();
        let mut unknown: Vec<String> = Vec::new();

        for raw in model_strings {
            match HardwareModel::parse(raw) {
                Some(model) => {
                    if !models.contains(&model) {
                        models.push(model);
                    }
                }
                None => {
                    warn!(model = raw.as_str(), "unknown hardware model");
                    if !unknown.contains(raw) {
                        unknown.push(raw.clone());
                    }
                }
            }
        }

        let lowest = models.iter().map(|m| m.generation()).min();
        let newest = models.iter().map(|m| m.generation()).max();

        let shared_capabilities = intersect_capabilities(&models);
        let all_capabilities = union_capabilities(&models);
        let lost = all_capabilities.len() - shared_capabilities.len();

        let mut recommendations = Vec::new();
        if let (Some(low), Some(high)) = (lowest, newest) {
            if low != high {
                recommendations.push(MixedMeshRecommendation {
                    summary: format!("Mesh spans {} through {}", low.name(), high.name()),
                    detail: format!(
                        "Wireless backhaul and roaming negotiate down to {} features; keep the oldest node wired or on the network edge",
                        low.name()
                    ),
                });
            }
            if low == WifiGeneration::Wifi5 {
                recommendations.push(MixedMeshRecommendation {
                    summary: "A WiFi 5 node limits the mesh".to_string(),
                    detail: "WiFi 5 hardware lacks OFDMA and WPA3; replacing it lifts the whole mesh to modern features".to_string(),
                });
            }
        }

        let band_counts: Vec<u8> = models.iter().map(|m| m.band_count()).collect();
        if band_counts.iter().min() != band_counts.iter().max() {
            recommendations.push(MixedMeshRecommendation {
                summary: "Mixed band counts".to_string(),
                detail: "Dual-band nodes share client and backhaul traffic on one 5GHz radio; prefer tri-band nodes for wireless backhaul hops".to_string(),
            });
        }
        if !unknown.is_empty() {
            recommendations.push(MixedMeshRecommendation {
                summary: format!("{} unrecognized model(s)", unknown.len()),
                detail: format!(
                    "No capability data for: {}; compatibility scoring ignored them",
                    unknown.join(", ")
                ),
            });
        }

        let score = self.score(lowest, newest, lost);

        CompatibilityReport {
            models,
            unknown_models: unknown,
            lowest_common_generation: lowest,
            newest_generation: newest,
            shared_capabilities,
            recommendations,
            score,
        }
    }

    fn score(
        &self,
        lowest: Option<WifiGeneration>,
        newest: Option<WifiGeneration>,
        lost_capabilities: usize,
    ) -> f64 {
        let (Some(low), Some(high)) = (lowest, newest) else {
            return 100.0;
        };

        let gap = (high.ordinal() - low.ordinal()) as f64;
        let mut score = 100.0
            - gap * self.config.generation_gap_penalty
            - lost_capabilities as f64 * self.config.missing_capability_penalty;
        if low == WifiGeneration::Wifi5 {
            score -= self.config.oldest_generation_penalty;
        }
        score.clamp(0.0, 100.0)
    }
}

fn intersect_capabilities(models: &[HardwareModel]) -> Vec<Capability> {
    let Some(first) = models.first() else {
        return Vec::new();
    };
    let mut shared: Vec<Capability> = first
        .capabilities()
        .iter()
        .copied()
        .filter(|cap| models.iter().all(|m| m.capabilities().contains(cap)))
        .collect();
    shared.sort();
    shared
}

fn union_capabilities(models: &[HardwareModel]) -> Vec<Capability> {
    let mut all: Vec<Capability> = Vec::new();
    for model in models {
        for &cap in model.capabilities() {
            if !all.contains(&cap) {
                all.push(cap);
            }
        }
    }
    all.sort();
    all
}
