//! Zigbee network snapshot types
//!
//! Snapshot of the Zigbee side of the home, supplied by the
//! home-automation-bridge collaborator. The detector and conflict analyzer
//! read these to find mesh-topology weaknesses (end devices with no
//! routers, poor link quality) and WiFi/Zigbee spectrum collisions.

use serde::{Deserialize, Serialize};

/// Role of a device in the Zigbee mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZigbeeDeviceType {
    /// The single network coordinator
    Coordinator,
    /// Mains-powered router that relays for others
    Router,
    /// Battery end device; depends on routers for reach
    EndDevice,
}

/// One Zigbee device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigbeeDevice {
    /// IEEE 64-bit address, hex string
    pub ieee: String,
    /// Friendly name from the bridge
    pub friendly_name: String,
    /// Device role
    pub device_type: ZigbeeDeviceType,
    /// Link Quality Indicator (0-255, higher = better); None if unreported
    pub lqi: Option<u8>,
    /// Whether the bridge currently considers the device reachable
    pub available: bool,
    /// Last time the device was heard from (Unix seconds)
    pub last_seen: u64,
}

impl ZigbeeDevice {
    /// Create an available device.
    pub fn new(ieee: &str, friendly_name: &str, device_type: ZigbeeDeviceType) -> Self {
        Self {
            ieee: ieee.to_string(),
            friendly_name: friendly_name.to_string(),
            device_type,
            lqi: None,
            available: true,
            last_seen: 0,
        }
    }

    /// Set the LQI (builder style).
    pub fn with_lqi(mut self, lqi: u8) -> Self {
        self.lqi = Some(lqi);
        self
    }

    /// Set the last-seen timestamp (builder style).
    pub fn with_last_seen(mut self, last_seen: u64) -> Self {
        self.last_seen = last_seen;
        self
    }

    /// Mark the device unavailable (builder style).
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Check whether the link quality is below a threshold. Devices
    /// without an LQI reading never count as weak.
    pub fn is_link_weaker_than(&self, threshold: u8) -> bool {
        self.lqi.map(|l| l < threshold).unwrap_or(false)
    }
}

/// Snapshot of the Zigbee network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigbeeNetworkState {
    /// Personal Area Network identifier
    pub pan_id: u16,
    /// Radio channel (11-26)
    pub channel: u8,
    /// All paired devices
    pub devices: Vec<ZigbeeDevice>,
    /// When the snapshot was taken (Unix seconds)
    pub captured_at: u64,
}

impl ZigbeeNetworkState {
    /// Create a snapshot.
    pub fn new(pan_id: u16, channel: u8, captured_at: u64) -> Self {
        Self {
            pan_id,
            channel,
            devices: Vec::new(),
            captured_at,
        }
    }

    /// Add a device (builder style).
    pub fn with_device(mut self, device: ZigbeeDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Number of routers (coordinator not counted).
    pub fn router_count(&self) -> usize {
        self.devices
            .iter()
            .filter(|d| d.device_type == ZigbeeDeviceType::Router)
            .count()
    }

    /// Number of end devices.
    pub fn end_device_count(&self) -> usize {
        self.devices
            .iter()
            .filter(|d| d.device_type == ZigbeeDeviceType::EndDevice)
            .count()
    }

    /// Fraction of devices currently unavailable (0-1).
    pub fn unavailable_fraction(&self) -> f64 {
        if self.devices.is_empty() {
            return 0.0;
        }
        let down = self.devices.iter().filter(|d| !d.available).count();
        down as f64 / self.devices.len() as f64
    }

    /// Mean LQI over devices that report one; None when nothing reports.
    pub fn average_lqi(&self) -> Option<f64> {
        let readings: Vec<u8> = self.devices.iter().filter_map(|d| d.lqi).collect();
        if readings.is_empty() {
            return None;
        }
        Some(readings.iter().map(|&l| l as f64).sum::<f64>() / readings.len() as f64)
    }

    /// Ids of all devices, for problem attribution.
    pub fn device_ids(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.ieee.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_network() -> ZigbeeNetworkState {
        ZigbeeNetworkState::new(0x1a62, 15, 1_700_000_000)
            .with_device(ZigbeeDevice::new(
                "0x00124b0001",
                "coordinator",
                ZigbeeDeviceType::Coordinator,
            ))
            .with_device(
                ZigbeeDevice::new("0x00124b0002", "plug", ZigbeeDeviceType::Router).with_lqi(180),
            )
            .with_device(
                ZigbeeDevice::new("0x00124b0003", "sensor", ZigbeeDeviceType::EndDevice)
                    .with_lqi(60),
            )
    }

    #[test]
    fn test_counts() {
        let net = sample_network();
        assert_eq!(net.router_count(), 1);
        assert_eq!(net.end_device_count(), 1);
        assert_eq!(net.devices.len(), 3);
    }

    #[test]
    fn test_average_lqi() {
        let net = sample_network();
        assert!((net.average_lqi().unwrap() - 120.0).abs() < 1e-9);

        let empty = ZigbeeNetworkState::new(0x0001, 11, 0);
        assert!(empty.average_lqi().is_none());
    }

    #[test]
    fn test_unavailable_fraction() {
        let mut net = sample_network();
        assert_eq!(net.unavailable_fraction(), 0.0);
        net.devices[2].available = false;
        assert!((net.unavailable_fraction() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_weak_link_predicate() {
        let strong = ZigbeeDevice::new("0x01", "a", ZigbeeDeviceType::Router).with_lqi(200);
        let weak = ZigbeeDevice::new("0x02", "b", ZigbeeDeviceType::EndDevice).with_lqi(30);
        let silent = ZigbeeDevice::new("0x03", "c", ZigbeeDeviceType::EndDevice);

        assert!(!strong.is_link_weaker_than(50));
        assert!(weak.is_link_weaker_than(50));
        assert!(!silent.is_link_weaker_than(50));
    }
}
