use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::runtime::config::ConfigError;

/// 6-byte hardware address of the Ethernet controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ConfigError;

    /// Accepts `DE:AD:BE:EF:FE:ED` or `de-ad-be-ef-fe-ed`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidMac(s.to_string());

        let mut bytes = [0u8; 6];
        let mut parts = s.split(|c: char| c == ':' || c == '-');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

/// Fixed addressing handed to the interface instead of running DHCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    pub ip: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub subnet: Ipv4Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AddressMode {
    #[default]
    Dhcp,
    Static(StaticConfig),
}

impl AddressMode {
    pub fn is_static(&self) -> bool {
        matches!(self, AddressMode::Static(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AddressMode::Dhcp => "DHCP",
            AddressMode::Static(_) => "Static",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_and_display() {
        let mac: MacAddress = "de:ad:be:ef:fe:ed".parse().unwrap();
        assert_eq!(mac.octets(), [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED]);
        assert_eq!(mac.to_string(), "DE:AD:BE:EF:FE:ED");

        let dashed: MacAddress = "02-00-00-00-00-01".parse().unwrap();
        assert_eq!(dashed, MacAddress::new([0x02, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_mac_parse_rejects_garbage() {
        assert!("de:ad:be:ef:fe".parse::<MacAddress>().is_err());
        assert!("de:ad:be:ef:fe:ed:00".parse::<MacAddress>().is_err());
        assert!("de:ad:be:ef:fe:zz".parse::<MacAddress>().is_err());
        assert!("dead:be:ef:fe:ed".parse::<MacAddress>().is_err());
        assert!(matches!(
            "".parse::<MacAddress>(),
            Err(ConfigError::InvalidMac(_))
        ));
    }

    #[test]
    fn test_address_mode_json_shape() {
        let dhcp: AddressMode = serde_json::from_str(r#"{"mode":"dhcp"}"#).unwrap();
        assert_eq!(dhcp, AddressMode::Dhcp);

        let json = r#"{"mode":"static","ip":"192.168.1.50","dns":"1.1.1.1","gateway":"192.168.1.1","subnet":"255.255.255.0"}"#;
        let fixed: AddressMode = serde_json::from_str(json).unwrap();
        match fixed {
            AddressMode::Static(cfg) => {
                assert_eq!(cfg.ip, Ipv4Addr::new(192, 168, 1, 50));
                assert_eq!(cfg.subnet, Ipv4Addr::new(255, 255, 255, 0));
            }
            _ => panic!("Expected static mode"),
        }
        assert!(fixed.is_static());
        assert_eq!(fixed.label(), "Static");
    }

    #[test]
    fn test_address_mode_defaults_to_dhcp() {
        assert_eq!(AddressMode::default(), AddressMode::Dhcp);
        assert!(!AddressMode::default().is_static());
        assert_eq!(AddressMode::default().label(), "DHCP");
    }
}
