//! Configuration types for the IPv4LL engine
//!
//! This module defines the link binding and engine settings consumed by
//! [`crate::Ipv4ll::configure`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ethernet (link-layer) address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a MAC address from its six octets
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The raw octets
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Whether all octets are zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');

        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| crate::Error::config(format!("MAC address too short: {s}")))?;
            if part.len() != 2 {
                return Err(crate::Error::config(format!("Invalid MAC octet '{part}' in {s}")));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::config(format!("Invalid MAC octet '{part}' in {s}")))?;
        }

        if parts.next().is_some() {
            return Err(crate::Error::config(format!("MAC address too long: {s}")));
        }

        Ok(Self(octets))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Main IPv4LL configuration
///
/// Carries the link binding (interface index and MAC address), an optional
/// enumeration seed for the address selector, and engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4llConfig {
    /// Interface index of the network attachment point (must be > 0)
    pub ifindex: u32,

    /// Link-layer address of the interface
    pub mac: MacAddr,

    /// Seed for the address selector
    ///
    /// When absent, the selector keeps its current state.
    #[serde(default)]
    pub enumeration: Option<u64>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Ipv4llConfig {
    /// Create a new configuration for the given link binding
    pub fn new(ifindex: u32, mac: MacAddr) -> Self {
        Self {
            ifindex,
            mac,
            enumeration: None,
            engine: EngineConfig::default(),
        }
    }

    /// Set the enumeration seed
    pub fn with_enumeration(mut self, enumeration: u64) -> Self {
        self.enumeration = Some(enumeration);
        self
    }

    /// Set the engine settings
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Parse a configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ifindex == 0 {
            return Err(crate::Error::config("Interface index must be > 0"));
        }
        if self.mac.is_zero() {
            return Err(crate::Error::config("MAC address cannot be all zeros"));
        }

        self.engine.validate()
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Restart attempts after a CONFLICT or USED outcome
    ///
    /// Each attempt draws a fresh candidate. When every attempt fails to
    /// restart the ACD engine, the run ends with a DOWN event.
    ///
    /// Default: 1 (give up after the first failed restart)
    #[serde(default = "default_restart_attempts")]
    pub restart_attempts: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.restart_attempts == 0 {
            return Err(crate::Error::config("restart_attempts must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            restart_attempts: default_restart_attempts(),
        }
    }
}

fn default_restart_attempts() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_and_display() {
        let mac: MacAddr = "fe:dc:ba:98:76:54".parse().unwrap();
        assert_eq!(mac.octets(), [0xfe, 0xdc, 0xba, 0x98, 0x76, 0x54]);
        assert_eq!(mac.to_string(), "fe:dc:ba:98:76:54");

        let upper: MacAddr = "FE:DC:BA:98:76:54".parse().unwrap();
        assert_eq!(upper, mac);
    }

    #[test]
    fn test_mac_parse_rejects_malformed() {
        assert!("fe:dc:ba:98:76".parse::<MacAddr>().is_err());
        assert!("fe:dc:ba:98:76:54:32".parse::<MacAddr>().is_err());
        assert!("fe:dc:ba:98:76:zz".parse::<MacAddr>().is_err());
        assert!("fedc:ba:98:76:54".parse::<MacAddr>().is_err());
        assert!("".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config = Ipv4llConfig::from_json(
            r#"{ "ifindex": 1, "mac": "fe:dc:ba:98:76:54", "enumeration": 7 }"#,
        )
        .unwrap();

        assert_eq!(config.ifindex, 1);
        assert_eq!(config.mac, MacAddr::new([0xfe, 0xdc, 0xba, 0x98, 0x76, 0x54]));
        assert_eq!(config.enumeration, Some(7));
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_config_json_serializes_mac_as_string() {
        let config = Ipv4llConfig::new(3, MacAddr::new([0, 1, 2, 3, 4, 5]));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["mac"], "00:01:02:03:04:05");
        assert_eq!(value["engine"]["restart_attempts"], 1);
    }

    #[test]
    fn test_config_validation() {
        let mac = MacAddr::new([0xfe, 0xdc, 0xba, 0x98, 0x76, 0x54]);

        assert!(Ipv4llConfig::new(1, mac).validate().is_ok());
        assert!(Ipv4llConfig::new(0, mac).validate().is_err());
        assert!(Ipv4llConfig::new(1, MacAddr::default()).validate().is_err());

        let no_restarts = Ipv4llConfig::new(1, mac).with_engine(EngineConfig {
            restart_attempts: 0,
        });
        assert!(no_restarts.validate().is_err());
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        let result = Ipv4llConfig::from_json(r#"{ "ifindex": 0, "mac": "fe:dc:ba:98:76:54" }"#);
        assert!(matches!(result, Err(crate::Error::Config(_))));

        let result = Ipv4llConfig::from_json(r#"{ "ifindex": 1, "mac": "nope" }"#);
        assert!(matches!(result, Err(crate::Error::Json(_))));
    }
}
