//! WiFi neighbor and WiFi/Zigbee frequency-conflict analysis
//!
//! Three related views of the 2.4/5GHz spectrum around the mesh:
//!
//! - Per-channel congestion weights accumulated from neighbor networks
//! - Conflicts between the operator's channels and individual neighbors,
//!   classified by overlap and received strength
//! - WiFi/Zigbee spectral collisions with a concrete channel-change
//!   remediation
//!
//! All scoring constants live on [`ConflictConfig`]; the defaults encode
//! the usual home-network heuristics (strong co-channel neighbors hurt,
//! weak or distant ones are noise).

use crate::signal::{self, WifiBand};
use crate::state::{NeighborNetwork, WifiSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Channel-distance overlap between two channels of the same band.
///
/// 2.4GHz channels are 5 MHz apart but 22 MHz wide: co-channel counts as
/// full overlap, within 2 steps as 75%, within 4 steps as 25%. 5GHz
/// channels only collide co-channel or as 40 MHz-bonded pairs (within 4
/// steps, 50%).
pub fn channel_overlap_fraction(own: u8, other: u8, band: WifiBand) -> f64 {
    let distance = (own as i16 - other as i16).unsigned_abs();
    match band {
        WifiBand::Ghz24 => match distance {
            0 => 1.0,
            1..=2 => 0.75,
            3..=4 => 0.25,
            _ => 0.0,
        },
        WifiBand::Ghz5 => match distance {
            0 => 1.0,
            1..=4 => 0.5,
            _ => 0.0,
        },
    }
}

/// Impact of a neighbor conflict on the operator's network.
///
/// Classification: `High` needs at least 75% overlap and a neighbor at
/// -65 dBm or stronger; `Low` is anything with at most 25% overlap or a
/// neighbor at -72 dBm or weaker; the rest is `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConflictImpact {
    Low,
    Medium,
    High,
}

/// A neighbor network conflicting with one of our channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborConflict {
    /// Neighbor SSID
    pub ssid: String,
    /// Neighbor BSSID (may be empty)
    pub bssid: String,
    /// Neighbor channel
    pub channel: u8,
    /// Band of the conflict
    pub band: WifiBand,
    /// Neighbor strength at our antenna (dBm)
    pub rssi_dbm: f32,
    /// Overlap fraction against our channel (0-1)
    pub overlap_fraction: f64,
    /// Classified impact
    pub impact: ConflictImpact,
}

/// A ranked channel candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecommendation {
    /// Recommended channel
    pub channel: u8,
    /// Band the recommendation applies to
    pub band: WifiBand,
    /// Score in [0, 100]; higher is better
    pub score: f64,
    /// Congestion weight accumulated on the channel
    pub congestion_weight: f64,
}

/// WiFi/Zigbee conflict severity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverlapSeverity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl OverlapSeverity {
    /// Tier an overlap fraction: none at 0, low under 0.2, medium under
    /// 0.5, high under 0.8, critical from 0.8 up.
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction <= 0.0 {
            OverlapSeverity::None
        } else if fraction < 0.2 {
            OverlapSeverity::Low
        } else if fraction < 0.5 {
            OverlapSeverity::Medium
        } else if fraction < 0.8 {
            OverlapSeverity::High
        } else {
            OverlapSeverity::Critical
        }
    }
}

/// A WiFi/Zigbee spectral conflict report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyConflict {
    /// Zigbee channel involved
    pub zigbee_channel: u8,
    /// WiFi channel involved (2.4GHz)
    pub wifi_channel: u8,
    /// Band of the WiFi channel
    pub wifi_band: WifiBand,
    /// Spectral overlap fraction (0-1)
    pub overlap_fraction: f64,
    /// Severity tier
    pub severity: OverlapSeverity,
    /// Remediation text; never empty
    pub recommendation: String,
}

/// Tunable constants for conflict analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Neighbors weaker than this are ignored entirely (dBm)
    pub min_neighbor_rssi_dbm: f32,
    /// Overlap at or above this can classify as high impact
    pub high_impact_overlap: f64,
    /// Neighbor strength at or above this can classify as high impact (dBm)
    pub high_impact_rssi_dbm: f32,
    /// Overlap at or below this always classifies as low impact
    pub low_impact_overlap: f64,
    /// Neighbor strength at or below this always classifies as low (dBm)
    pub low_impact_rssi_dbm: f32,
    /// Congestion-to-score factor on 2.4GHz
    pub band_factor_24: f64,
    /// Congestion-to-score factor on 5GHz
    pub band_factor_5: f64,
    /// Channel candidates ranked on 2.4GHz
    pub candidates_24: Vec<u8>,
    /// Channel candidates ranked on 5GHz
    pub candidates_5: Vec<u8>,
    /// Zigbee channels offered as replacements, in preference order
    pub preferred_zigbee_channels: Vec<u8>,
    /// A replacement Zigbee channel must stay under this overlap against
    /// every current WiFi channel
    pub zigbee_replacement_max_overlap: f64,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            min_neighbor_rssi_dbm: -75.0,
            high_impact_overlap: 0.75,
            high_impact_rssi_dbm: -65.0,
            low_impact_overlap: 0.25,
            low_impact_rssi_dbm: -72.0,
            band_factor_24: 10.0,
            band_factor_5: 15.0,
            candidates_24: vec![1, 6, 11],
            candidates_5: vec![36, 44, 149, 157],
            preferred_zigbee_channels: vec![15, 20, 25, 11, 26],
            zigbee_replacement_max_overlap: 0.1,
        }
    }
}

/// Frequency/channel conflict analyzer.
#[derive(Debug, Clone, Default)]
pub struct ConflictAnalyzer {
    config: ConflictConfig,
}

impl ConflictAnalyzer {
    /// Create an analyzer with custom constants.
    pub fn new(config: ConflictConfig) -> Self {
        Self { config }
    }

    /// Spread each neighbor's congestion weight over the channels it
    /// occupies (center +/- half its width in 5 MHz channel steps).
    /// Weights by strength bucket: 3 at -50 dBm or stronger, 2 at -60, 1
    /// at -70, 0.5 below.
    pub fn congestion_map(&self, neighbors: &[NeighborNetwork], band: WifiBand) -> HashMap<u8, f64> {
        let mut map: HashMap<u8, f64> = HashMap::new();
        for neighbor in neighbors.iter().filter(|n| n.band == band) {
            let weight = congestion_weight(neighbor.rssi_dbm);
            // 5 MHz per channel step; a 40 MHz neighbor reaches 4 steps
            // each side of its center.
            let spread = (neighbor.width_mhz / 2 / 5) as i16;
            for offset in -spread..=spread {
                let channel = neighbor.channel as i16 + offset;
                if channel >= 1 && channel <= u8::MAX as i16 {
                    *map.entry(channel as u8).or_default() += weight;
                }
            }
        }
        map
    }

    /// Conflicts between our settings and every audible neighbor.
    /// Neighbors below the RSSI floor or with zero overlap are dropped.
    /// Sorted by impact (highest first), then strength, then SSID.
    pub fn neighbor_conflicts(
        &self,
        settings: &WifiSettings,
        neighbors: &[NeighborNetwork],
    ) -> Vec<NeighborConflict> {
        let mut conflicts: Vec<NeighborConflict> = neighbors
            .iter()
            .filter(|n| n.rssi_dbm > self.config.min_neighbor_rssi_dbm)
            .filter_map(|neighbor| {
                let own_channel = match neighbor.band {
                    WifiBand::Ghz24 => settings.channel_24,
                    WifiBand::Ghz5 => settings.channel_5,
                };
                let overlap = channel_overlap_fraction(own_channel, neighbor.channel, neighbor.band);
                if overlap <= 0.0 {
                    return None;
                }
                Some(NeighborConflict {
                    ssid: neighbor.ssid.clone(),
                    bssid: neighbor.bssid.clone(),
                    channel: neighbor.channel,
                    band: neighbor.band,
                    rssi_dbm: neighbor.rssi_dbm,
                    overlap_fraction: overlap,
                    impact: self.classify_impact(overlap, neighbor.rssi_dbm),
                })
            })
            .collect();

        conflicts.sort_by(|a, b| {
            b.impact
                .cmp(&a.impact)
                .then(
                    b.rssi_dbm
                        .partial_cmp(&a.rssi_dbm)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.ssid.cmp(&b.ssid))
        });
        conflicts
    }

    /// Rank the candidate channels for a band and return the best one.
    /// Score is `100 - congestion * band_factor`, clamped to [0, 100].
    /// Ties keep the earliest candidate in the list.
    pub fn recommend_channel(
        &self,
        neighbors: &[NeighborNetwork],
        band: WifiBand,
    ) -> Option<ChannelRecommendation> {
        let congestion = self.congestion_map(neighbors, band);
        let (candidates, factor) = match band {
            WifiBand::Ghz24 => (&self.config.candidates_24, self.config.band_factor_24),
            WifiBand::Ghz5 => (&self.config.candidates_5, self.config.band_factor_5),
        };

        let mut best: Option<ChannelRecommendation> = None;
        for &channel in candidates {
            let weight = congestion.get(&channel).copied().unwrap_or(0.0);
            let score = (100.0 - weight * factor).clamp(0.0, 100.0);
            let is_better = best.as_ref().map(|b| score > b.score).unwrap_or(true);
            if is_better {
                best = Some(ChannelRecommendation {
                    channel,
                    band,
                    score,
                    congestion_weight: weight,
                });
            }
        }
        best
    }

    /// Analyze the WiFi 2.4GHz channel against the Zigbee channel.
    pub fn wifi_zigbee_conflict(
        &self,
        settings: &WifiSettings,
        zigbee_channel: u8,
    ) -> FrequencyConflict {
        let overlap = signal::wifi_zigbee_overlap(settings.channel_24, zigbee_channel);
        let severity = OverlapSeverity::from_fraction(overlap);

        let recommendation = match severity {
            OverlapSeverity::None | OverlapSeverity::Low => format!(
                "Zigbee channel {} is clear of WiFi channel {}; no change needed",
                zigbee_channel, settings.channel_24
            ),
            _ => match self.replacement_zigbee_channel(settings) {
                Some(replacement) => format!(
                    "Move Zigbee from channel {} to channel {} to clear WiFi channel {}",
                    zigbee_channel, replacement, settings.channel_24
                ),
                None => format!(
                    "Zigbee channel {} collides with WiFi channel {} and no clear Zigbee channel exists; move the WiFi channel instead",
                    zigbee_channel, settings.channel_24
                ),
            },
        };

        FrequencyConflict {
            zigbee_channel,
            wifi_channel: settings.channel_24,
            wifi_band: WifiBand::Ghz24,
            overlap_fraction: overlap,
            severity,
            recommendation,
        }
    }

    /// First preferred Zigbee channel with acceptable overlap against all
    /// current WiFi channels.
    pub fn replacement_zigbee_channel(&self, settings: &WifiSettings) -> Option<u8> {
        self.config
            .preferred_zigbee_channels
            .iter()
            .copied()
            .find(|&candidate| {
                // Only the 2.4GHz WiFi channel shares spectrum with
                // Zigbee; 5GHz cannot collide.
                signal::wifi_zigbee_overlap(settings.channel_24, candidate)
                    < self.config.zigbee_replacement_max_overlap
            })
    }

    fn classify_impact(&self, overlap: f64, rssi_dbm: f32) -> ConflictImpact {
        if overlap <= self.config.low_impact_overlap || rssi_dbm <= self.config.low_impact_rssi_dbm
        {
            ConflictImpact::Low
        } else if overlap >= self.config.high_impact_overlap
            && rssi_dbm >= self.config.high_impact_rssi_dbm
        {
            ConflictImpact::High
        } else {
            ConflictImpact::Medium
        }
    }
}

/// Congestion weight for a neighbor by strength bucket.
fn congestion_weight(rssi_dbm: f32) -> f64 {
    if rssi_dbm >= -50.0 {
        3.0
    } else if rssi_dbm >= -60.0 {
        2.0
    } else if rssi_dbm >= -70.0 {
        1.0
    } else {
        0.5
    }
}
