//! Rule-based problem detection
//!
//! A stateless pass over one telemetry snapshot. Every rule is
//! independent; each inspects its slice of the input and emits problems
//! with deterministic ids, so re-running a pass on unchanged input
//! produces the same problem set and the caller's
//! [`ProblemRegistry`](crate::problem::ProblemRegistry) updates instead of
//! duplicating.
//!
//! Rule groups:
//!
//! - Per-device signal strength
//! - Connection stability (disconnect/roam history)
//! - Channel congestion and per-neighbor interference
//! - WiFi/Zigbee spectral overlap
//! - Zigbee device and network topology
//! - Radio configuration
//! - Node capacity (clients, CPU, memory, uptime)
//! - Non-WiFi infrastructure health (SNMP samples)
//!
//! Every threshold is a named field of [`DetectorConfig`]. The defaults
//! are deliberate heuristics; changing any of them changes observable
//! behavior and must be treated as such.

use crate::channels::channel_overlap_fraction;
use crate::problem::{NetworkProblem, ProblemCategory, Severity};
use crate::signal::wifi_zigbee_overlap;
use crate::state::{
    ChannelScanResult, ConnectionEvent, MeshNetworkState, SecurityMode, SnmpHealthSample,
};
use crate::zigbee::ZigbeeNetworkState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Everything one detection pass looks at. Only the mesh snapshot is
/// mandatory; empty slices and `None` simply skip the matching rules.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    /// The mesh snapshot (required)
    pub state: &'a MeshNetworkState,
    /// Connection history, any order
    pub events: &'a [ConnectionEvent],
    /// Channel occupancy scans
    pub scans: &'a [ChannelScanResult],
    /// Zigbee snapshot, if a bridge is present
    pub zigbee: Option<&'a ZigbeeNetworkState>,
    /// SNMP health of non-WiFi infrastructure
    pub snmp: &'a [SnmpHealthSample],
}

impl<'a> AnalysisInput<'a> {
    /// Input with only the mesh snapshot.
    pub fn from_state(state: &'a MeshNetworkState) -> Self {
        Self {
            state,
            events: &[],
            scans: &[],
            zigbee: None,
            snmp: &[],
        }
    }
}

/// Named thresholds for every detection rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Device RSSI below this is a warning (dBm)
    pub weak_signal_warning_dbm: f32,
    /// Device RSSI below this is critical (dBm)
    pub weak_signal_critical_dbm: f32,
    /// Disconnects in the window for a warning
    pub disconnect_warning_count: usize,
    /// Disconnects in the window for an error
    pub disconnect_error_count: usize,
    /// Trailing window for disconnect counting (seconds)
    pub disconnect_window_secs: u64,
    /// Roam events in the window for a warning
    pub roam_warning_count: usize,
    /// Trailing window for roam counting (seconds)
    pub roam_window_secs: u64,
    /// Channel utilization warning threshold (%)
    pub utilization_warning_percent: f32,
    /// Channel utilization error threshold (%)
    pub utilization_error_percent: f32,
    /// Neighbor channel-overlap fraction that matters
    pub neighbor_overlap_threshold: f64,
    /// Neighbor RSSI that matters (dBm)
    pub neighbor_rssi_threshold_dbm: f32,
    /// WiFi/Zigbee overlap warning threshold
    pub zigbee_overlap_warning: f64,
    /// WiFi/Zigbee overlap error threshold
    pub zigbee_overlap_error: f64,
    /// Zigbee LQI warning threshold
    pub lqi_warning: u8,
    /// Zigbee LQI error threshold
    pub lqi_error: u8,
    /// Available Zigbee device unseen for this long is stale (seconds)
    pub zigbee_stale_secs: u64,
    /// Unavailable fraction for a network-level error (with > 5 devices)
    pub zigbee_unavailable_fraction: f64,
    /// Network average LQI warning threshold (with > 3 devices)
    pub zigbee_avg_lqi_warning: f64,
    /// Network average LQI error threshold
    pub zigbee_avg_lqi_error: f64,
    /// Non-overlapping 2.4GHz channels
    pub preferred_24_channels: [u8; 3],
    /// Minimum acceptable 5GHz channel width (MHz)
    pub min_width_5_mhz: u16,
    /// Client count warning threshold per node
    pub clients_warning: u32,
    /// Client count error threshold per node
    pub clients_error: u32,
    /// Node CPU warning threshold (%)
    pub cpu_warning_percent: f32,
    /// Node memory warning threshold (%)
    pub memory_warning_percent: f32,
    /// Node memory critical threshold (%)
    pub memory_critical_percent: f32,
    /// Node uptime above this is informational (seconds)
    pub uptime_info_secs: u64,
    /// SNMP CPU/memory warning threshold (%)
    pub snmp_load_warning_percent: f32,
    /// SNMP CPU/memory error threshold (%)
    pub snmp_load_error_percent: f32,
    /// SNMP temperature warning threshold (Celsius)
    pub snmp_temperature_warning_c: f32,
    /// SNMP state-table fill fraction for an error
    pub snmp_state_table_error_fraction: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            weak_signal_warning_dbm: -75.0,
            weak_signal_critical_dbm: -85.0,
            disconnect_warning_count: 3,
            disconnect_error_count: 10,
            disconnect_window_secs: 24 * 3600,
            roam_warning_count: 5,
            roam_window_secs: 3600,
            utilization_warning_percent: 70.0,
            utilization_error_percent: 90.0,
            neighbor_overlap_threshold: 0.3,
            neighbor_rssi_threshold_dbm: -70.0,
            zigbee_overlap_warning: 0.5,
            zigbee_overlap_error: 0.8,
            lqi_warning: 50,
            lqi_error: 25,
            zigbee_stale_secs: 24 * 3600,
            zigbee_unavailable_fraction: 0.3,
            zigbee_avg_lqi_warning: 100.0,
            zigbee_avg_lqi_error: 50.0,
            preferred_24_channels: [1, 6, 11],
            min_width_5_mhz: 80,
            clients_warning: 30,
            clients_error: 50,
            cpu_warning_percent: 95.0,
            memory_warning_percent: 85.0,
            memory_critical_percent: 95.0,
            uptime_info_secs: 30 * 24 * 3600,
            snmp_load_warning_percent: 90.0,
            snmp_load_error_percent: 95.0,
            snmp_temperature_warning_c: 80.0,
            snmp_state_table_error_fraction: 0.9,
        }
    }
}

/// The rule engine. Stateless: `analyze` borrows a snapshot and returns a
/// fresh problem list; reconciliation against prior passes belongs to the
/// caller's registry.
#[derive(Debug, Clone, Default)]
pub struct ProblemDetector {
    config: DetectorConfig,
}

impl ProblemDetector {
    /// Create a detector with custom thresholds.
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Run every rule over the input. The result is sorted by problem id
    /// so identical inputs serialize identically.
    pub fn analyze(&self, input: &AnalysisInput<'_>) -> Vec<NetworkProblem> {
        let mut problems = Vec::new();

        self.check_device_signals(input, &mut problems);
        self.check_disconnects(input, &mut problems);
        self.check_roaming(input, &mut problems);
        self.check_channel_scans(input, &mut problems);
        self.check_wifi_zigbee_overlap(input, &mut problems);
        self.check_zigbee(input, &mut problems);
        self.check_configuration(input, &mut problems);
        self.check_capacity(input, &mut problems);
        self.check_infrastructure(input, &mut problems);

        problems.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = problems.len(), "detection pass complete");
        problems
    }

    fn check_device_signals(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let now = input.state.captured_at;
        for device in input.state.connected_devices() {
            let Some(signal) = device.signal_dbm else {
                continue;
            };
            if signal < self.config.weak_signal_critical_dbm {
                let id =
                    NetworkProblem::make_id(ProblemCategory::SignalWeakness, "critical", &device.mac);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::SignalWeakness, Severity::Critical, now)
                        .with_devices(vec![device.mac.clone()])
                        .with_nodes(device.node_id.iter().cloned().collect())
                        .with_texts(
                            &format!(
                                "{} signal is {:.0} dBm, effectively unusable",
                                device.display_name(),
                                signal
                            ),
                            "Device is far outside the coverage of its serving node",
                            "Move the device closer to a node or add coverage near it",
                        ),
                );
            } else if signal < self.config.weak_signal_warning_dbm {
                let id = NetworkProblem::make_id(ProblemCategory::SignalWeakness, "weak", &device.mac);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::SignalWeakness, Severity::Warning, now)
                        .with_devices(vec![device.mac.clone()])
                        .with_nodes(device.node_id.iter().cloned().collect())
                        .with_texts(
                            &format!(
                                "{} signal is {:.0} dBm, below the reliable threshold",
                                device.display_name(),
                                signal
                            ),
                            "Device is near the edge of its serving node's coverage",
                            "Check node placement or steer the device to a closer node",
                        ),
                );
            }
        }
    }

    fn check_disconnects(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let now = input.state.captured_at;
        let cutoff = now.saturating_sub(self.config.disconnect_window_secs);

        let mut per_device: HashMap<&str, usize> = HashMap::new();
        for event in input.events {
            if event.timestamp >= cutoff && event.is_disconnect() {
                *per_device.entry(event.device_mac.as_str()).or_default() += 1;
            }
        }

        for (mac, count) in per_device {
            if count < self.config.disconnect_warning_count {
                continue;
            }
            let severity = if count >= self.config.disconnect_error_count {
                Severity::Error
            } else {
                Severity::Warning
            };
            let id = NetworkProblem::make_id(ProblemCategory::DeviceInstability, "disconnects", mac);
            out.push(
                NetworkProblem::new(id, ProblemCategory::DeviceInstability, severity, now)
                    .with_devices(vec![mac.to_string()])
                    .with_texts(
                        &format!("{} disconnected {} times in the last 24 hours", mac, count),
                        "Unstable link, power saving, or a driver issue on the device",
                        "Check the device's power management and the signal level where it sits",
                    ),
            );
        }
    }

    fn check_roaming(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let now = input.state.captured_at;
        let cutoff = now.saturating_sub(self.config.roam_window_secs);

        let mut per_device: HashMap<&str, usize> = HashMap::new();
        for event in input.events {
            if event.timestamp >= cutoff && event.is_roam() {
                *per_device.entry(event.device_mac.as_str()).or_default() += 1;
            }
        }

        for (mac, count) in per_device {
            if count < self.config.roam_warning_count {
                continue;
            }
            let id = NetworkProblem::make_id(ProblemCategory::RoamingIssue, "excessive", mac);
            out.push(
                NetworkProblem::new(id, ProblemCategory::RoamingIssue, Severity::Warning, now)
                    .with_devices(vec![mac.to_string()])
                    .with_texts(
                        &format!("{} roamed {} times in the last hour", mac, count),
                        "Device sits between nodes with similar signal levels",
                        "Adjust node placement or roaming aggressiveness so one node clearly wins",
                    ),
            );
        }
    }

    fn check_channel_scans(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let now = input.state.captured_at;
        for scan in input.scans {
            let band_slug = match scan.band {
                crate::signal::WifiBand::Ghz24 => "2g",
                crate::signal::WifiBand::Ghz5 => "5g",
            };

            if scan.utilization_percent > self.config.utilization_warning_percent {
                let severity = if scan.utilization_percent > self.config.utilization_error_percent {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                let id = NetworkProblem::make_id(
                    ProblemCategory::Congestion,
                    band_slug,
                    &format!("ch{}", scan.channel),
                );
                out.push(
                    NetworkProblem::new(id, ProblemCategory::Congestion, severity, now)
                        .with_texts(
                            &format!(
                                "Channel {} ({}) is {:.0}% utilized",
                                scan.channel, band_slug, scan.utilization_percent
                            ),
                            "Too much airtime consumed on this channel",
                            "Move to a less occupied channel or reduce legacy-rate traffic",
                        )
                        .auto_fixable(),
                );
            }

            for neighbor in &scan.neighbors {
                if neighbor.band != scan.band {
                    continue;
                }
                let overlap =
                    channel_overlap_fraction(scan.channel, neighbor.channel, scan.band);
                if overlap > self.config.neighbor_overlap_threshold
                    && neighbor.rssi_dbm > self.config.neighbor_rssi_threshold_dbm
                {
                    let affected = if neighbor.bssid.is_empty() {
                        neighbor.ssid.clone()
                    } else {
                        neighbor.bssid.clone()
                    };
                    let id = NetworkProblem::make_id(
                        ProblemCategory::Interference,
                        "neighbor",
                        &affected,
                    );
                    out.push(
                        NetworkProblem::new(id, ProblemCategory::Interference, Severity::Warning, now)
                            .with_texts(
                                &format!(
                                    "Neighbor network '{}' at {:.0} dBm overlaps channel {} by {:.0}%",
                                    neighbor.ssid,
                                    neighbor.rssi_dbm,
                                    scan.channel,
                                    overlap * 100.0
                                ),
                                "A nearby network transmits on an overlapping channel",
                                "Switch to a channel with more separation from the neighbor",
                            )
                            .auto_fixable(),
                    );
                }
            }
        }
    }

    fn check_wifi_zigbee_overlap(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let Some(zigbee) = input.zigbee else { return };
        let now = input.state.captured_at;

        let overlap = wifi_zigbee_overlap(input.state.wifi.channel_24, zigbee.channel);
        if overlap <= self.config.zigbee_overlap_warning {
            return;
        }
        let severity = if overlap > self.config.zigbee_overlap_error {
            Severity::Error
        } else {
            Severity::Warning
        };
        let id = NetworkProblem::make_id(ProblemCategory::FrequencyOverlap, "wifi", "zigbee");
        out.push(
            NetworkProblem::new(id, ProblemCategory::FrequencyOverlap, severity, now)
                .with_devices(zigbee.device_ids())
                .with_texts(
                    &format!(
                        "WiFi channel {} overlaps Zigbee channel {} by {:.0}%",
                        input.state.wifi.channel_24,
                        zigbee.channel,
                        overlap * 100.0
                    ),
                    "Both radios share the same 2.4GHz spectrum slice",
                    "Move the Zigbee network to a channel clear of the WiFi channel",
                )
                .auto_fixable(),
        );
    }

    fn check_zigbee(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let Some(zigbee) = input.zigbee else { return };
        let now = input.state.captured_at;

        for device in &zigbee.devices {
            if !device.available {
                let id = NetworkProblem::make_id(ProblemCategory::ZigbeeIssue, "unavailable", &device.ieee);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::ZigbeeIssue, Severity::Error, now)
                        .with_devices(vec![device.ieee.clone()])
                        .with_texts(
                            &format!("Zigbee device '{}' is unavailable", device.friendly_name),
                            "The device stopped responding to the coordinator",
                            "Check the device's power and its distance to the nearest router",
                        ),
                );
                continue;
            }

            if let Some(lqi) = device.lqi {
                if lqi < self.config.lqi_warning {
                    let severity = if lqi < self.config.lqi_error {
                        Severity::Error
                    } else {
                        Severity::Warning
                    };
                    let id = NetworkProblem::make_id(ProblemCategory::ZigbeeIssue, "weak", &device.ieee);
                    out.push(
                        NetworkProblem::new(id, ProblemCategory::ZigbeeIssue, severity, now)
                            .with_devices(vec![device.ieee.clone()])
                            .with_texts(
                                &format!(
                                    "Zigbee device '{}' link quality is {} (of 255)",
                                    device.friendly_name, lqi
                                ),
                                "Weak mesh route between the device and the coordinator",
                                "Add a router device between it and the coordinator",
                            ),
                    );
                }
            }

            if now.saturating_sub(device.last_seen) > self.config.zigbee_stale_secs {
                let id = NetworkProblem::make_id(ProblemCategory::ZigbeeIssue, "stale", &device.ieee);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::ZigbeeIssue, Severity::Warning, now)
                        .with_devices(vec![device.ieee.clone()])
                        .with_texts(
                            &format!(
                                "Zigbee device '{}' has not been heard from in over 24 hours",
                                device.friendly_name
                            ),
                            "Device may have a dead battery or lost its route",
                            "Wake the device or re-pair it",
                        ),
                );
            }
        }

        if zigbee.end_device_count() > 0 && zigbee.router_count() == 0 {
            let id = NetworkProblem::make_id(ProblemCategory::ZigbeeIssue, "norouters", "network");
            out.push(
                NetworkProblem::new(id, ProblemCategory::ZigbeeIssue, Severity::Warning, now)
                    .with_texts(
                        "Zigbee network has end devices but no routers",
                        "Every end device must reach the coordinator directly",
                        "Add mains-powered router devices to extend the mesh",
                    ),
            );
        }

        if zigbee.devices.len() > 5
            && zigbee.unavailable_fraction() > self.config.zigbee_unavailable_fraction
        {
            let id = NetworkProblem::make_id(ProblemCategory::ZigbeeIssue, "unavailable", "network");
            out.push(
                NetworkProblem::new(id, ProblemCategory::ZigbeeIssue, Severity::Error, now)
                    .with_texts(
                        &format!(
                            "{:.0}% of Zigbee devices are unavailable",
                            zigbee.unavailable_fraction() * 100.0
                        ),
                        "Widespread unavailability points at coordinator or interference trouble",
                        "Check the coordinator and the WiFi/Zigbee channel separation",
                    ),
            );
        }

        if zigbee.devices.len() > 3 {
            if let Some(avg) = zigbee.average_lqi() {
                if avg < self.config.zigbee_avg_lqi_warning {
                    let severity = if avg < self.config.zigbee_avg_lqi_error {
                        Severity::Error
                    } else {
                        Severity::Warning
                    };
                    let id = NetworkProblem::make_id(ProblemCategory::ZigbeeIssue, "lqi", "network");
                    out.push(
                        NetworkProblem::new(id, ProblemCategory::ZigbeeIssue, severity, now)
                            .with_texts(
                                &format!("Zigbee network average LQI is {:.0}", avg),
                                "Overall mesh link quality is poor",
                                "Add routers or move the coordinator away from interference",
                            ),
                    );
                }
            }
        }
    }

    fn check_configuration(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let now = input.state.captured_at;
        let wifi = &input.state.wifi;

        if !self.config.preferred_24_channels.contains(&wifi.channel_24) {
            let id = NetworkProblem::make_id(ProblemCategory::ConfigurationError, "channel24", "wifi");
            out.push(
                NetworkProblem::new(id, ProblemCategory::ConfigurationError, Severity::Warning, now)
                    .with_texts(
                        &format!(
                            "2.4GHz channel {} overlaps two of the non-overlapping channels",
                            wifi.channel_24
                        ),
                        "Only channels 1, 6, and 11 avoid partial overlap in 2.4GHz",
                        "Use channel 1, 6, or 11",
                    )
                    .auto_fixable(),
            );
        }

        for (enabled, name) in [
            (wifi.beamforming, "beamforming"),
            (wifi.mu_mimo, "mumimo"),
            (wifi.ofdma, "ofdma"),
        ] {
            if !enabled {
                let id = NetworkProblem::make_id(ProblemCategory::ConfigurationError, name, "wifi");
                out.push(
                    NetworkProblem::new(id, ProblemCategory::ConfigurationError, Severity::Info, now)
                        .with_texts(
                            &format!("{} is disabled", name),
                            "A WiFi 6 efficiency feature is turned off",
                            &format!("Enable {} unless a device is known to misbehave with it", name),
                        )
                        .auto_fixable(),
                );
            }
        }

        if wifi.width_5_mhz < self.config.min_width_5_mhz {
            let id = NetworkProblem::make_id(ProblemCategory::ConfigurationError, "width5", "wifi");
            out.push(
                NetworkProblem::new(id, ProblemCategory::ConfigurationError, Severity::Warning, now)
                    .with_texts(
                        &format!("5GHz channel width is {} MHz", wifi.width_5_mhz),
                        "Narrow channels halve the available throughput",
                        "Use at least 80 MHz on 5GHz unless the spectrum is crowded",
                    )
                    .auto_fixable(),
            );
        }

        if wifi.security < SecurityMode::Wpa2 {
            let severity = if wifi.security == SecurityMode::Open {
                Severity::Critical
            } else {
                Severity::Error
            };
            let id = NetworkProblem::make_id(ProblemCategory::ConfigurationError, "security", "wifi");
            out.push(
                NetworkProblem::new(id, ProblemCategory::ConfigurationError, severity, now)
                    .with_texts(
                        &format!("WiFi security is {:?}", wifi.security),
                        "The network accepts weakly authenticated or unauthenticated clients",
                        "Switch to WPA2 or WPA3",
                    ),
            );
        }

        if !wifi.roaming_assistant && input.state.node_count() > 1 {
            let id = NetworkProblem::make_id(ProblemCategory::ConfigurationError, "roaming", "wifi");
            out.push(
                NetworkProblem::new(id, ProblemCategory::ConfigurationError, Severity::Warning, now)
                    .with_texts(
                        "Roaming assistant is disabled on a multi-node mesh",
                        "Sticky clients will cling to distant nodes without steering",
                        "Enable the roaming assistant / 802.11k+v steering",
                    )
                    .auto_fixable(),
            );
        }
    }

    fn check_capacity(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let now = input.state.captured_at;
        for node in &input.state.nodes {
            if node.client_count > self.config.clients_warning {
                let severity = if node.client_count > self.config.clients_error {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                let id = NetworkProblem::make_id(ProblemCategory::CapacityExceeded, "clients", &node.id);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::CapacityExceeded, severity, now)
                        .with_nodes(vec![node.id.clone()])
                        .with_texts(
                            &format!("{} serves {} clients", node.name, node.client_count),
                            "Airtime per client shrinks as association count grows",
                            "Spread clients across nodes or add a node",
                        ),
                );
            }

            if node.cpu_percent > self.config.cpu_warning_percent {
                let id = NetworkProblem::make_id(ProblemCategory::CapacityExceeded, "cpu", &node.id);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::CapacityExceeded, Severity::Warning, now)
                        .with_nodes(vec![node.id.clone()])
                        .with_texts(
                            &format!("{} CPU at {:.0}%", node.name, node.cpu_percent),
                            "Sustained high CPU delays forwarding and management traffic",
                            "Check for runaway features (QoS, IDS) or reboot the node",
                        ),
                );
            }

            if node.memory_percent > self.config.memory_warning_percent {
                let severity = if node.memory_percent > self.config.memory_critical_percent {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                let id = NetworkProblem::make_id(ProblemCategory::CapacityExceeded, "memory", &node.id);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::CapacityExceeded, severity, now)
                        .with_nodes(vec![node.id.clone()])
                        .with_texts(
                            &format!("{} memory at {:.0}%", node.name, node.memory_percent),
                            "Memory exhaustion leads to dropped state and reboots",
                            "Reboot the node and review enabled services",
                        ),
                );
            }

            if node.uptime_seconds > self.config.uptime_info_secs {
                let id = NetworkProblem::make_id(ProblemCategory::CapacityExceeded, "uptime", &node.id);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::CapacityExceeded, Severity::Info, now)
                        .with_nodes(vec![node.id.clone()])
                        .with_texts(
                            &format!(
                                "{} has been up for {} days",
                                node.name,
                                node.uptime_seconds / 86_400
                            ),
                            "Long uptimes accumulate leaks on consumer firmware",
                            "Schedule a maintenance reboot",
                        )
                        .auto_fixable(),
                );
            }
        }
    }

    fn check_infrastructure(&self, input: &AnalysisInput<'_>, out: &mut Vec<NetworkProblem>) {
        let now = input.state.captured_at;
        for sample in input.snmp {
            if sample.cpu_percent > self.config.snmp_load_warning_percent {
                let severity = if sample.cpu_percent >= self.config.snmp_load_error_percent {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                let id = NetworkProblem::make_id(ProblemCategory::InfrastructureIssue, "cpu", &sample.device);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::InfrastructureIssue, severity, now)
                        .with_texts(
                            &format!("{} CPU at {:.0}%", sample.device, sample.cpu_percent),
                            "An infrastructure device is a throughput bottleneck",
                            "Investigate load on the device; it may be undersized",
                        ),
                );
            }

            if sample.memory_percent > self.config.snmp_load_warning_percent {
                let severity = if sample.memory_percent >= self.config.snmp_load_error_percent {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                let id =
                    NetworkProblem::make_id(ProblemCategory::InfrastructureIssue, "memory", &sample.device);
                out.push(
                    NetworkProblem::new(id, ProblemCategory::InfrastructureIssue, severity, now)
                        .with_texts(
                            &format!("{} memory at {:.0}%", sample.device, sample.memory_percent),
                            "An infrastructure device is close to memory exhaustion",
                            "Check for connection leaks or reduce tracked state",
                        ),
                );
            }

            if let Some(temp) = sample.temperature_c {
                if temp > self.config.snmp_temperature_warning_c {
                    let id =
                        NetworkProblem::make_id(ProblemCategory::InfrastructureIssue, "temp", &sample.device);
                    out.push(
                        NetworkProblem::new(id, ProblemCategory::InfrastructureIssue, Severity::Warning, now)
                            .with_texts(
                                &format!("{} is running at {:.0}C", sample.device, temp),
                                "Overheating precedes throttling and hardware failure",
                                "Improve airflow around the device",
                            ),
                    );
                }
            }

            if let Some(fill) = sample.state_table_fill() {
                if fill > self.config.snmp_state_table_error_fraction {
                    let id = NetworkProblem::make_id(
                        ProblemCategory::InfrastructureIssue,
                        "statetable",
                        &sample.device,
                    );
                    out.push(
                        NetworkProblem::new(id, ProblemCategory::InfrastructureIssue, Severity::Error, now)
                            .with_texts(
                                &format!("{} state table is {:.0}% full", sample.device, fill * 100.0),
                                "New connections will be dropped once the table fills",
                                "Raise the state-table limit or find the connection-hungry host",
                            ),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::WifiBand;
    use crate::state::{
        ConnectionEventKind, ConnectionType, MeshNode, NeighborNetwork, NetworkDevice, NodeRole,
        WifiSettings,
    };
    use crate::zigbee::{ZigbeeDevice, ZigbeeDeviceType};

    const NOW: u64 = 1_700_000_000;

    fn base_state() -> MeshNetworkState {
        MeshNetworkState::new(
            NOW,
            vec![MeshNode::new("main", "Main router", "aa:bb:cc:00:00:01", NodeRole::Main)],
            Vec::new(),
        )
    }

    fn analyze(state: &MeshNetworkState) -> Vec<NetworkProblem> {
        ProblemDetector::default().analyze(&AnalysisInput::from_state(state))
    }

    #[test]
    fn test_critical_signal_problem_id() {
        let mut state = base_state();
        state.devices.push(
            NetworkDevice::new("11:22:33:44:55:66", ConnectionType::Wireless5)
                .with_node("main")
                .with_signal(-90.0),
        );

        let problems = analyze(&state);
        let signal: Vec<_> = problems
            .iter()
            .filter(|p| p.category == ProblemCategory::SignalWeakness)
            .collect();
        assert_eq!(signal.len(), 1);
        assert_eq!(signal[0].id, "signal-critical-11:22:33:44:55:66");
        assert_eq!(signal[0].severity, Severity::Critical);
    }

    #[test]
    fn test_signal_detection_idempotent() {
        let mut state = base_state();
        state.devices.push(
            NetworkDevice::new("11:22:33:44:55:66", ConnectionType::Wireless5)
                .with_node("main")
                .with_signal(-90.0),
        );

        let detector = ProblemDetector::default();
        let first = detector.analyze(&AnalysisInput::from_state(&state));
        let second = detector.analyze(&AnalysisInput::from_state(&state));
        assert_eq!(first, second);

        let mut registry = crate::problem::ProblemRegistry::new();
        registry.merge(first);
        registry.merge(second);
        assert_eq!(
            registry
                .active()
                .iter()
                .filter(|p| p.id == "signal-critical-11:22:33:44:55:66")
                .count(),
            1
        );
    }

    #[test]
    fn test_warning_signal_threshold() {
        let mut state = base_state();
        state.devices.push(
            NetworkDevice::new("11:22:33:44:55:01", ConnectionType::Wireless24).with_signal(-80.0),
        );
        state.devices.push(
            NetworkDevice::new("11:22:33:44:55:02", ConnectionType::Wireless24).with_signal(-60.0),
        );

        let problems = analyze(&state);
        assert!(problems
            .iter()
            .any(|p| p.id == "signal-weak-11:22:33:44:55:01" && p.severity == Severity::Warning));
        assert!(!problems
            .iter()
            .any(|p| p.affected_devices.contains(&"11:22:33:44:55:02".to_string())));
    }

    #[test]
    fn test_disconnect_rule_thresholds() {
        let state = base_state();
        let mut events = Vec::new();
        for i in 0..4 {
            events.push(ConnectionEvent::new(
                "11:22:33:44:55:66",
                NOW - 1000 - i,
                ConnectionEventKind::Disconnected { reason: None },
            ));
        }
        // Old events outside the 24h window must not count.
        events.push(ConnectionEvent::new(
            "11:22:33:44:55:66",
            NOW - 100_000,
            ConnectionEventKind::Disconnected { reason: None },
        ));

        let input = AnalysisInput {
            state: &state,
            events: &events,
            scans: &[],
            zigbee: None,
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);

        let problem = problems
            .iter()
            .find(|p| p.id == "stability-disconnects-11:22:33:44:55:66")
            .expect("disconnect problem");
        assert_eq!(problem.severity, Severity::Warning);
        assert!(problem.description.contains("4 times"));
    }

    #[test]
    fn test_disconnect_error_at_ten() {
        let state = base_state();
        let events: Vec<ConnectionEvent> = (0..10)
            .map(|i| {
                ConnectionEvent::new(
                    "11:22:33:44:55:66",
                    NOW - 10 - i,
                    ConnectionEventKind::Disconnected { reason: None },
                )
            })
            .collect();

        let input = AnalysisInput {
            state: &state,
            events: &events,
            scans: &[],
            zigbee: None,
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);
        let problem = problems
            .iter()
            .find(|p| p.id == "stability-disconnects-11:22:33:44:55:66")
            .unwrap();
        assert_eq!(problem.severity, Severity::Error);
    }

    #[test]
    fn test_roaming_rule() {
        let state = base_state();
        let events: Vec<ConnectionEvent> = (0..5)
            .map(|i| {
                ConnectionEvent::new(
                    "11:22:33:44:55:66",
                    NOW - 60 * i,
                    ConnectionEventKind::Roamed {
                        from_node: "main".into(),
                        to_node: "upstairs".into(),
                    },
                )
            })
            .collect();

        let input = AnalysisInput {
            state: &state,
            events: &events,
            scans: &[],
            zigbee: None,
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);
        assert!(problems
            .iter()
            .any(|p| p.id == "roaming-excessive-11:22:33:44:55:66"));
    }

    #[test]
    fn test_congestion_rule() {
        let state = base_state();
        let scans = vec![
            ChannelScanResult {
                band: WifiBand::Ghz24,
                channel: 6,
                utilization_percent: 75.0,
                noise_floor_dbm: -95.0,
                neighbors: Vec::new(),
            },
            ChannelScanResult {
                band: WifiBand::Ghz5,
                channel: 36,
                utilization_percent: 95.0,
                noise_floor_dbm: -95.0,
                neighbors: Vec::new(),
            },
        ];

        let input = AnalysisInput {
            state: &state,
            events: &[],
            scans: &scans,
            zigbee: None,
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);

        let warning = problems.iter().find(|p| p.id == "congestion-2g-ch6").unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        let error = problems.iter().find(|p| p.id == "congestion-5g-ch36").unwrap();
        assert_eq!(error.severity, Severity::Error);
    }

    #[test]
    fn test_neighbor_interference_rule() {
        let state = base_state();
        let scans = vec![ChannelScanResult {
            band: WifiBand::Ghz24,
            channel: 6,
            utilization_percent: 10.0,
            noise_floor_dbm: -95.0,
            neighbors: vec![
                NeighborNetwork::new("loud-neighbor", 6, WifiBand::Ghz24, -55.0),
                NeighborNetwork::new("quiet-neighbor", 6, WifiBand::Ghz24, -80.0),
                NeighborNetwork::new("distant-channel", 1, WifiBand::Ghz24, -55.0),
            ],
        }];

        let input = AnalysisInput {
            state: &state,
            events: &[],
            scans: &scans,
            zigbee: None,
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);

        assert!(problems
            .iter()
            .any(|p| p.id == "interference-neighbor-loud-neighbor"));
        // Weak and non-overlapping neighbors do not trigger.
        assert!(!problems
            .iter()
            .any(|p| p.id.contains("quiet-neighbor") || p.id.contains("distant-channel")));
    }

    #[test]
    fn test_wifi_zigbee_overlap_rule() {
        let mut state = base_state();
        state.wifi.channel_24 = 6;
        let zigbee = ZigbeeNetworkState::new(0x1a62, 18, NOW).with_device(
            ZigbeeDevice::new("0x01", "bulb", ZigbeeDeviceType::Router).with_last_seen(NOW),
        );

        let input = AnalysisInput {
            state: &state,
            events: &[],
            scans: &[],
            zigbee: Some(&zigbee),
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);

        let overlap = problems.iter().find(|p| p.id == "overlap-wifi-zigbee").unwrap();
        // Zigbee 18 sits inside WiFi 6: overlap 0.875 > 0.8 -> error.
        assert_eq!(overlap.severity, Severity::Error);
        assert_eq!(overlap.affected_devices, vec!["0x01".to_string()]);
    }

    #[test]
    fn test_zigbee_device_rules() {
        let state = base_state();
        let zigbee = ZigbeeNetworkState::new(0x1a62, 25, NOW)
            .with_device(ZigbeeDevice::new("0x01", "dead-plug", ZigbeeDeviceType::Router).unavailable())
            .with_device(
                ZigbeeDevice::new("0x02", "far-sensor", ZigbeeDeviceType::EndDevice)
                    .with_lqi(20)
                    .with_last_seen(NOW),
            )
            .with_device(
                ZigbeeDevice::new("0x03", "sleepy", ZigbeeDeviceType::EndDevice)
                    .with_lqi(200)
                    .with_last_seen(NOW - 200_000),
            );

        let input = AnalysisInput {
            state: &state,
            events: &[],
            scans: &[],
            zigbee: Some(&zigbee),
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);

        assert!(problems
            .iter()
            .any(|p| p.id == "zigbee-unavailable-0x01" && p.severity == Severity::Error));
        assert!(problems
            .iter()
            .any(|p| p.id == "zigbee-weak-0x02" && p.severity == Severity::Error));
        assert!(problems
            .iter()
            .any(|p| p.id == "zigbee-stale-0x03" && p.severity == Severity::Warning));
    }

    #[test]
    fn test_zigbee_no_routers_rule() {
        let state = base_state();
        let zigbee = ZigbeeNetworkState::new(0x1a62, 25, NOW).with_device(
            ZigbeeDevice::new("0x01", "sensor", ZigbeeDeviceType::EndDevice)
                .with_lqi(120)
                .with_last_seen(NOW),
        );

        let input = AnalysisInput {
            state: &state,
            events: &[],
            scans: &[],
            zigbee: Some(&zigbee),
            snmp: &[],
        };
        let problems = ProblemDetector::default().analyze(&input);
        assert!(problems.iter().any(|p| p.id == "zigbee-norouters-network"));
    }

    #[test]
    fn test_configuration_rules() {
        let mut state = base_state();
        state.nodes.push(MeshNode::new(
            "upstairs",
            "Upstairs",
            "aa:bb:cc:00:00:02",
            NodeRole::Secondary,
        ));
        state.wifi = WifiSettings {
            channel_24: 3,
            width_24_mhz: 20,
            channel_5: 36,
            width_5_mhz: 40,
            security: SecurityMode::Open,
            beamforming: false,
            mu_mimo: true,
            ofdma: true,
            roaming_assistant: false,
        };

        let problems = analyze(&state);

        assert!(problems
            .iter()
            .any(|p| p.id == "config-channel24-wifi" && p.severity == Severity::Warning));
        assert!(problems
            .iter()
            .any(|p| p.id == "config-beamforming-wifi" && p.severity == Severity::Info));
        assert!(problems
            .iter()
            .any(|p| p.id == "config-width5-wifi" && p.severity == Severity::Warning));
        assert!(problems
            .iter()
            .any(|p| p.id == "config-security-wifi" && p.severity == Severity::Critical));
        assert!(problems
            .iter()
            .any(|p| p.id == "config-roaming-wifi" && p.severity == Severity::Warning));
    }

    #[test]
    fn test_weak_security_error_not_critical() {
        let mut state = base_state();
        state.wifi.security = SecurityMode::Wep;
        let problems = analyze(&state);
        let problem = problems.iter().find(|p| p.id == "config-security-wifi").unwrap();
        assert_eq!(problem.severity, Severity::Error);
    }

    #[test]
    fn test_capacity_rules() {
        let mut state = base_state();
        state.nodes[0].client_count = 55;
        state.nodes[0].cpu_percent = 97.0;
        state.nodes[0].memory_percent = 96.0;
        state.nodes[0].uptime_seconds = 40 * 24 * 3600;

        let problems = analyze(&state);

        assert!(problems
            .iter()
            .any(|p| p.id == "capacity-clients-main" && p.severity == Severity::Error));
        assert!(problems
            .iter()
            .any(|p| p.id == "capacity-cpu-main" && p.severity == Severity::Warning));
        assert!(problems
            .iter()
            .any(|p| p.id == "capacity-memory-main" && p.severity == Severity::Critical));
        assert!(problems
            .iter()
            .any(|p| p.id == "capacity-uptime-main" && p.severity == Severity::Info));
    }

    #[test]
    fn test_infrastructure_rules() {
        let state = base_state();
        let snmp = vec![SnmpHealthSample {
            device: "firewall".into(),
            cpu_percent: 96.0,
            memory_percent: 50.0,
            temperature_c: Some(85.0),
            state_table: Some((950, 1000)),
        }];

        let input = AnalysisInput {
            state: &state,
            events: &[],
            scans: &[],
            zigbee: None,
            snmp: &snmp,
        };
        let problems = ProblemDetector::default().analyze(&input);

        assert!(problems
            .iter()
            .any(|p| p.id == "infra-cpu-firewall" && p.severity == Severity::Error));
        assert!(problems.iter().any(|p| p.id == "infra-temp-firewall"));
        assert!(problems
            .iter()
            .any(|p| p.id == "infra-statetable-firewall" && p.severity == Severity::Error));
        assert!(!problems.iter().any(|p| p.id == "infra-memory-firewall"));
    }

    #[test]
    fn test_healthy_network_is_quiet() {
        let mut state = base_state();
        state.devices.push(
            NetworkDevice::new("11:22:33:44:55:66", ConnectionType::Wireless5)
                .with_node("main")
                .with_signal(-55.0),
        );

        let problems = analyze(&state);
        assert!(problems.is_empty(), "unexpected: {:?}", problems);
    }

    #[test]
    fn test_output_sorted_by_id() {
        let mut state = base_state();
        state.nodes[0].client_count = 55;
        state.devices.push(
            NetworkDevice::new("11:22:33:44:55:66", ConnectionType::Wireless5).with_signal(-90.0),
        );

        let problems = analyze(&state);
        let ids: Vec<&str> = problems.iter().map(|p| p.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
