//! Mesh network snapshot types
//!
//! Read-only input snapshots produced by the telemetry-acquisition
//! collaborators and consumed by every analyzer in this crate:
//!
//! - [`MeshNode`]: identity and load of one mesh node
//! - [`NetworkDevice`]: a client device seen on the network
//! - [`WifiSettings`]: the operator's current radio configuration
//! - [`MeshNetworkState`]: one complete snapshot (nodes + devices + settings)
//! - [`ConnectionEvent`]: connect/disconnect/roam history entries
//! - [`ChannelScanResult`] / [`NeighborNetwork`]: channel occupancy scans
//! - [`SnmpHealthSample`]: health of non-WiFi infrastructure devices
//!
//! The core never mutates these; analyzers borrow a snapshot, compute, and
//! return fresh result values. All timestamps are seconds since the Unix
//! epoch and are supplied by the collaborator so analyses stay
//! deterministic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalize a MAC address to the canonical lowercase colon-separated form.
///
/// Accepts colon, dash, or dot separators and bare hex strings. Input that
/// does not look like 6 octets is lowercased and returned as-is rather than
/// rejected; snapshots are telemetry, not user input.
pub fn normalize_mac(mac: &str) -> String {
    let hex: String = mac
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_ascii_lowercase();

    if hex.len() != 12 {
        return mac.trim().to_ascii_lowercase();
    }

    hex.as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(":")
}

/// Role of a node inside the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// The main router (gateway to the WAN)
    Main,
    /// A satellite/extender node
    Secondary,
}

/// Link type connecting a secondary node to the main router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackhaulType {
    Wired,
    Wireless,
}

/// One mesh node: identity plus current load. Mutated only by the
/// acquisition collaborator; read-only to the analyzers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    /// Stable node id
    pub id: String,
    /// Display name
    pub name: String,
    /// Node radio MAC (any format; normalized on lookup)
    pub mac: String,
    /// Management IP address
    pub ip: String,
    /// Firmware version string
    pub firmware: String,
    /// Main or secondary
    pub role: NodeRole,
    /// CPU load (0-100%)
    pub cpu_percent: f32,
    /// Memory usage (0-100%)
    pub memory_percent: f32,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Currently associated client count
    pub client_count: u32,
    /// Backhaul link type
    pub backhaul: BackhaulType,
}

impl MeshNode {
    /// Create a node with idle load figures.
    pub fn new(id: &str, name: &str, mac: &str, role: NodeRole) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            mac: mac.to_string(),
            ip: String::new(),
            firmware: String::new(),
            role,
            cpu_percent: 0.0,
            memory_percent: 0.0,
            uptime_seconds: 0,
            client_count: 0,
            backhaul: BackhaulType::Wired,
        }
    }
}

/// How a device is attached to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Ethernet
    Wired,
    /// 2.4GHz WiFi
    Wireless24,
    /// 5GHz WiFi
    Wireless5,
}

/// Device association status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceStatus {
    Connected,
    Disconnected,
}

/// A client device observed on the mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDevice {
    /// Device MAC, canonical lowercase colon-separated form
    pub mac: String,
    /// Reported hostname, if any
    pub hostname: Option<String>,
    /// OUI vendor, if resolved
    pub vendor: Option<String>,
    /// Attachment type
    pub connection: ConnectionType,
    /// Id of the mesh node the device is associated with
    pub node_id: Option<String>,
    /// Current signal strength (dBm, always <= 0); None for wired devices
    pub signal_dbm: Option<f32>,
    /// Association status
    pub status: DeviceStatus,
    /// First time the device was seen (Unix seconds)
    pub first_seen: u64,
    /// Most recent time the device was seen (Unix seconds)
    pub last_seen: u64,
    /// Lifetime disconnect counter
    pub disconnect_count: u32,
}

impl NetworkDevice {
    /// Create a connected wireless device. The MAC is normalized.
    pub fn new(mac: &str, connection: ConnectionType) -> Self {
        Self {
            mac: normalize_mac(mac),
            hostname: None,
            vendor: None,
            connection,
            node_id: None,
            signal_dbm: None,
            status: DeviceStatus::Connected,
            first_seen: 0,
            last_seen: 0,
            disconnect_count: 0,
        }
    }

    /// Set the hostname (builder style).
    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    /// Set the serving node (builder style).
    pub fn with_node(mut self, node_id: &str) -> Self {
        self.node_id = Some(node_id.to_string());
        self
    }

    /// Set the signal strength (builder style).
    pub fn with_signal(mut self, dbm: f32) -> Self {
        self.signal_dbm = Some(dbm);
        self
    }

    /// Display name: hostname if known, otherwise the MAC.
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.mac)
    }

    /// Check whether the reading is weaker than a threshold. Wired devices
    /// and devices with no reading never count as weak.
    pub fn is_weaker_than(&self, threshold_dbm: f32) -> bool {
        self.signal_dbm.map(|s| s < threshold_dbm).unwrap_or(false)
    }
}

/// WiFi security mode, weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecurityMode {
    Open,
    Wep,
    Wpa,
    Wpa2,
    Wpa3,
}

/// The operator's current WiFi configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiSettings {
    /// 2.4GHz channel (1-14)
    pub channel_24: u8,
    /// 2.4GHz channel width in MHz (20 or 40)
    pub width_24_mhz: u16,
    /// 5GHz channel (36-177)
    pub channel_5: u8,
    /// 5GHz channel width in MHz (20/40/80/160)
    pub width_5_mhz: u16,
    /// Security mode
    pub security: SecurityMode,
    /// Beamforming enabled
    pub beamforming: bool,
    /// MU-MIMO enabled
    pub mu_mimo: bool,
    /// OFDMA enabled
    pub ofdma: bool,
    /// Roaming assistant (802.11k/v steering) enabled
    pub roaming_assistant: bool,
}

impl Default for WifiSettings {
    fn default() -> Self {
        Self {
            channel_24: 6,
            width_24_mhz: 20,
            channel_5: 36,
            width_5_mhz: 80,
            security: SecurityMode::Wpa2,
            beamforming: true,
            mu_mimo: true,
            ofdma: true,
            roaming_assistant: true,
        }
    }
}

/// One complete snapshot of the mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshNetworkState {
    /// When the snapshot was taken (Unix seconds). All trailing-window
    /// rules measure backwards from this instant.
    pub captured_at: u64,
    /// Mesh nodes
    pub nodes: Vec<MeshNode>,
    /// Client devices
    pub devices: Vec<NetworkDevice>,
    /// Radio configuration
    pub wifi: WifiSettings,
}

impl MeshNetworkState {
    /// Create a snapshot.
    pub fn new(captured_at: u64, nodes: Vec<MeshNode>, devices: Vec<NetworkDevice>) -> Self {
        Self {
            captured_at,
            nodes,
            devices,
            wifi: WifiSettings::default(),
        }
    }

    /// Override the WiFi settings (builder style).
    pub fn with_wifi(mut self, wifi: WifiSettings) -> Self {
        self.wifi = wifi;
        self
    }

    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&MeshNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Build a normalized-MAC to node index, once per analysis pass.
    /// Analyzers that resolve signal readings against nodes use this
    /// instead of scanning the node list per reading.
    pub fn node_index(&self) -> HashMap<String, &MeshNode> {
        self.nodes
            .iter()
            .map(|n| (normalize_mac(&n.mac), n))
            .collect()
    }

    /// Count of nodes in the snapshot.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Devices currently marked connected.
    pub fn connected_devices(&self) -> impl Iterator<Item = &NetworkDevice> {
        self.devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Connected)
    }
}

/// Kind of connection event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConnectionEventKind {
    /// Device associated
    Connected,
    /// Device disassociated, with the driver-reported reason if any
    Disconnected { reason: Option<String> },
    /// Device moved between nodes
    Roamed { from_node: String, to_node: String },
}

/// One entry of a device's connection history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    /// Device MAC, normalized
    pub device_mac: String,
    /// When the event happened (Unix seconds)
    pub timestamp: u64,
    /// What happened
    pub kind: ConnectionEventKind,
}

impl ConnectionEvent {
    /// Create an event. The MAC is normalized.
    pub fn new(device_mac: &str, timestamp: u64, kind: ConnectionEventKind) -> Self {
        Self {
            device_mac: normalize_mac(device_mac),
            timestamp,
            kind,
        }
    }

    /// True for disconnect events.
    pub fn is_disconnect(&self) -> bool {
        matches!(self.kind, ConnectionEventKind::Disconnected { .. })
    }

    /// True for roam events.
    pub fn is_roam(&self) -> bool {
        matches!(self.kind, ConnectionEventKind::Roamed { .. })
    }
}

/// A neighboring (foreign) WiFi network observed in a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborNetwork {
    /// Advertised SSID (may be empty for hidden networks)
    pub ssid: String,
    /// BSSID of the neighbor AP
    pub bssid: String,
    /// Channel the neighbor is centered on
    pub channel: u8,
    /// Band the neighbor operates in
    pub band: crate::signal::WifiBand,
    /// Channel width in MHz
    pub width_mhz: u16,
    /// Received strength of the neighbor at our antenna (dBm)
    pub rssi_dbm: f32,
}

impl NeighborNetwork {
    /// Create a neighbor entry.
    pub fn new(ssid: &str, channel: u8, band: crate::signal::WifiBand, rssi_dbm: f32) -> Self {
        Self {
            ssid: ssid.to_string(),
            bssid: String::new(),
            channel,
            band,
            width_mhz: 20,
            rssi_dbm,
        }
    }

    /// Set the channel width (builder style).
    pub fn with_width(mut self, width_mhz: u16) -> Self {
        self.width_mhz = width_mhz;
        self
    }
}

/// Result of scanning one of our own channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelScanResult {
    /// Band scanned
    pub band: crate::signal::WifiBand,
    /// Channel scanned
    pub channel: u8,
    /// Fraction of airtime observed busy (0-100%)
    pub utilization_percent: f32,
    /// Noise floor (dBm)
    pub noise_floor_dbm: f32,
    /// Foreign networks heard during the scan
    pub neighbors: Vec<NeighborNetwork>,
}

/// SNMP-derived health of a non-WiFi infrastructure device (switch,
/// firewall, NAS). Used for bottleneck detection outside the mesh itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmpHealthSample {
    /// Device name as configured in the poller
    pub device: String,
    /// CPU load (0-100%)
    pub cpu_percent: f32,
    /// Memory usage (0-100%)
    pub memory_percent: f32,
    /// Temperature in Celsius, if the device exposes a sensor
    pub temperature_c: Option<f32>,
    /// Connection/state-table usage as (used, capacity), if exposed
    pub state_table: Option<(u32, u32)>,
}

impl SnmpHealthSample {
    /// State-table fill fraction (0-1), if the device reports one.
    pub fn state_table_fill(&self) -> Option<f64> {
        match self.state_table {
            Some((used, capacity)) if capacity > 0 => Some(used as f64 / capacity as f64),
            _ => None,
        }
    }
}
