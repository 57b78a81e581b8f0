use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A VISA-style USB resource name, e.g. `USB0::0x1AB1::0x0588::DS1ED141904883::INSTR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub board: u16,
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: Option<String>,
    pub interface: Option<u8>,
}

fn parse_id(text: &str) -> Option<u16> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

impl FromStr for ResourceName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::protocol(format!("invalid USB resource name {:?}", name));

        let mut parts = name.split("::").collect::<Vec<_>>();
        if parts.last().is_some_and(|part| part.eq_ignore_ascii_case("INSTR")) {
            parts.pop();
        }
        if !(3..=5).contains(&parts.len()) {
            return Err(invalid())
        }

        let board = parts[0].get(..3)
            .filter(|prefix| prefix.eq_ignore_ascii_case("USB"))
            .map(|_| &parts[0][3..])
            .ok_or_else(invalid)?;
        let board = if board.is_empty() { 0 } else { board.parse().map_err(|_| invalid())? };

        Ok(ResourceName {
            board,
            vendor_id: parse_id(parts[1]).ok_or_else(invalid)?,
            product_id: parse_id(parts[2]).ok_or_else(invalid)?,
            serial: parts.get(3).map(|&serial| serial.to_owned()),
            interface: match parts.get(4) {
                Some(interface) => Some(interface.parse().map_err(|_| invalid())?),
                None => None,
            },
        })
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USB{}::{:#06X}::{:#06X}", self.board, self.vendor_id, self.product_id)?;
        if let Some(serial) = &self.serial {
            write!(f, "::{}", serial)?;
            if let Some(interface) = self.interface {
                write!(f, "::{}", interface)?;
            }
        }
        write!(f, "::INSTR")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_full() {
        let name: ResourceName = "USB0::0x1AB1::0x0588::DS1ED141904883::INSTR".parse().unwrap();
        assert_eq!(name, ResourceName {
            board: 0,
            vendor_id: 0x1ab1,
            product_id: 0x0588,
            serial: Some("DS1ED141904883".to_owned()),
            interface: None,
        });
    }

    #[test]
    fn test_parse_variants() {
        let name: ResourceName = "usb::6833::1416".parse().unwrap();
        assert_eq!((name.board, name.vendor_id, name.product_id), (0, 0x1ab1, 0x0588));
        assert_eq!(name.serial, None);

        let name: ResourceName = "USB2::0x1AB1::0x04CE::DS1ZA1::1::INSTR".parse().unwrap();
        assert_eq!(name.board, 2);
        assert_eq!(name.interface, Some(1));
    }

    #[test]
    fn test_parse_invalid() {
        for name in ["GPIB0::1::INSTR", "USB0::0x1AB1::INSTR", "USBx::1::2", "USB0::0xZZZZ::1",
                     "TCPIP0::10.0.0.1::INSTR", "USB0::1::2::SN::iface::INSTR"] {
            assert!(name.parse::<ResourceName>().is_err(), "{} parsed", name);
        }
    }

    #[test]
    fn test_display() {
        let name = ResourceName {
            board: 0,
            vendor_id: 0x1ab1,
            product_id: 0x0588,
            serial: Some("DS1ED141904883".to_owned()),
            interface: None,
        };
        assert_eq!(name.to_string(), "USB0::0x1AB1::0x0588::DS1ED141904883::INSTR");
        assert_eq!(ResourceName { serial: None, ..name }.to_string(), "USB0::0x1AB1::0x0588::INSTR");
    }
}
