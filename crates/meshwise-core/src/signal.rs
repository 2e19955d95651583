//! Signal propagation and frequency math
//!
//! Pure functions shared by the position estimator, coverage mapper, and
//! conflict analyzer:
//!
//! - RSSI to distance conversion (log-distance path loss inverse)
//! - Path loss prediction for coverage simulation
//! - RSSI to quality mapping (0-100)
//! - WiFi and Zigbee channel to center-frequency conversion
//! - WiFi 2.4GHz / Zigbee spectral overlap
//!
//! All functions are stateless and deterministic. Distances are floored at
//! one meter before any logarithm is taken.
//!
//! ## Example
//!
//! ```rust
//! use meshwise_core::signal::{rssi_to_distance, rssi_to_quality, DEFAULT_REFERENCE_POWER_DBM};
//!
//! // A -69 dBm reading with the default -59 dBm reference power and
//! // exponent 2.5 lands at about 2.5 meters.
//! let d = rssi_to_distance(-69.0, DEFAULT_REFERENCE_POWER_DBM, 2.5);
//! assert!(d > 2.0 && d < 3.0);
//!
//! assert_eq!(rssi_to_quality(-50.0), 100.0);
//! assert_eq!(rssi_to_quality(-100.0), 0.0);
//! ```

use std::f64::consts::PI;

/// Speed of light in m/s.
const C: f64 = 299_792_458.0;

/// Default measured power at 1 meter for consumer WiFi hardware (dBm).
pub const DEFAULT_REFERENCE_POWER_DBM: f64 = -59.0;

/// Default indoor path-loss exponent (2.0 = free space, 2.5-4.0 = indoor).
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 2.5;

/// Minimum distance used in any path-loss calculation (meters).
pub const MIN_DISTANCE_M: f64 = 1.0;

/// Half of the occupied bandwidth of a 2.4GHz WiFi channel (MHz).
pub const WIFI_HALF_BANDWIDTH_MHZ: f64 = 11.0;

/// Half of the occupied bandwidth of a Zigbee channel (MHz).
pub const ZIGBEE_HALF_BANDWIDTH_MHZ: f64 = 1.0;

/// WiFi radio band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum WifiBand {
    /// 2.4GHz band (channels 1-14)
    Ghz24,
    /// 5GHz band (channels 36-177)
    Ghz5,
}

impl WifiBand {
    /// Typical center frequency used for propagation modelling (MHz).
    pub fn nominal_frequency_mhz(&self) -> f64 {
        match self {
            WifiBand::Ghz24 => 2437.0, // channel 6
            WifiBand::Ghz5 => 5240.0,  // channel 48
        }
    }
}

/// Estimate distance in meters from an RSSI reading.
///
/// Inverse of the log-distance path-loss model:
/// `d = 10^((tx_power - rssi) / (10 * n))`
///
/// * `rssi_dbm` - Received signal strength (dBm, negative).
/// * `reference_power_dbm` - Expected RSSI at 1 meter.
/// * `path_loss_exponent` - Environment decay constant.
///
/// The result is floored at [`MIN_DISTANCE_M`].
pub fn rssi_to_distance(rssi_dbm: f64, reference_power_dbm: f64, path_loss_exponent: f64) -> f64 {
    let n = if path_loss_exponent > 0.0 {
        path_loss_exponent
    } else {
        DEFAULT_PATH_LOSS_EXPONENT
    };
    let d = 10f64.powf((reference_power_dbm - rssi_dbm) / (10.0 * n));
    d.max(MIN_DISTANCE_M)
}

/// Free-space path loss at 1 meter for the given frequency (dB).
///
/// Friis reference term: `20 * log10(4 * pi * d0 * f / c)` with d0 = 1m.
pub fn reference_path_loss_db(frequency_mhz: f64) -> f64 {
    20.0 * (4.0 * PI * frequency_mhz * 1e6 / C).log10()
}

/// Predicted path loss over a distance using the log-distance model (dB).
///
/// `PL(d) = PL(1m) + 10 * n * log10(d)`, with the distance floored at 1m so
/// the logarithm can never blow up for co-located points.
pub fn path_loss_db(distance_m: f64, frequency_mhz: f64, path_loss_exponent: f64) -> f64 {
    let d = distance_m.max(MIN_DISTANCE_M);
    reference_path_loss_db(frequency_mhz) + 10.0 * path_loss_exponent * d.log10()
}

/// Predicted received power at a distance (dBm).
pub fn received_power_dbm(
    tx_power_dbm: f64,
    distance_m: f64,
    frequency_mhz: f64,
    path_loss_exponent: f64,
) -> f64 {
    tx_power_dbm - path_loss_db(distance_m, frequency_mhz, path_loss_exponent)
}

/// Map RSSI to a 0-100 quality score.
///
/// Linear between -100 dBm (unusable, 0) and -50 dBm (excellent, 100),
/// clamped outside that range.
pub fn rssi_to_quality(rssi_dbm: f64) -> f64 {
    ((rssi_dbm + 100.0) * 2.0).clamp(0.0, 100.0)
}

/// Convert a dBm level to linear milliwatts.
pub fn dbm_to_mw(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}

/// Convert linear milliwatts to dBm. Returns a very low floor for
/// non-positive power instead of a degenerate logarithm.
pub fn mw_to_dbm(mw: f64) -> f64 {
    if mw <= 0.0 {
        return -120.0;
    }
    10.0 * mw.log10()
}

/// Center frequency of a WiFi channel in MHz.
///
/// 2.4GHz channels follow `2407 + 5 * ch` with the Japanese channel 14 at
/// 2484 MHz. 5GHz channels follow `5000 + 5 * ch`.
pub fn wifi_channel_frequency_mhz(channel: u8, band: WifiBand) -> f64 {
    match band {
        WifiBand::Ghz24 => {
            if channel == 14 {
                2484.0
            } else {
                2407.0 + 5.0 * channel as f64
            }
        }
        WifiBand::Ghz5 => 5000.0 + 5.0 * channel as f64,
    }
}

/// Center frequency of a Zigbee (802.15.4, 2.4GHz) channel in MHz.
///
/// Valid channels are 11-26: `2405 + 5 * (ch - 11)`.
pub fn zigbee_channel_frequency_mhz(channel: u8) -> f64 {
    2405.0 + 5.0 * (channel as f64 - 11.0)
}

/// Spectral overlap fraction between a 2.4GHz WiFi channel and a Zigbee
/// channel, in [0, 1].
///
/// Modelled as a linear taper over the combined occupied bandwidths
/// (WiFi +/-11 MHz, Zigbee +/-1 MHz): co-channel is 1.0 and the fraction
/// falls to 0.0 once the centers are 24 MHz apart. WiFi channel 6 against
/// Zigbee 18 (center inside the WiFi band) scores 0.875; against Zigbee 15
/// (at the band edge) 0.5; channel 1 against Zigbee 26 scores 0.
pub fn wifi_zigbee_overlap(wifi_channel: u8, zigbee_channel: u8) -> f64 {
    let wifi_mhz = wifi_channel_frequency_mhz(wifi_channel, WifiBand::Ghz24);
    let zigbee_mhz = zigbee_channel_frequency_mhz(zigbee_channel);
    let separation = (wifi_mhz - zigbee_mhz).abs();
    let span = 2.0 * (WIFI_HALF_BANDWIDTH_MHZ + ZIGBEE_HALF_BANDWIDTH_MHZ);
    (1.0 - separation / span).max(0.0)
}
