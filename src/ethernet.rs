//! Ethernet and 802.1Q frame views over borrowed receive buffers.

use byteorder::{ByteOrder, NetworkEndian};
use num_enum::FromPrimitive;
use smoltcp::wire::EthernetAddress;

use crate::dcp::{ParseDcpError, TruncatedAt};

#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u16)]
pub enum EthType {
    Profinet = 0x8892,
    Vlan = 0x8100,
    #[num_enum(default)]
    Other,
}

mod frame_field {
    use crate::field::*;

    pub const DESTINATION: Field = 0..6;
    pub const SOURCE: Field = 6..12;
    pub const ETHERTYPE: Field = 12..14;
    pub const PAYLOAD: Rest = 14..;
}

pub const ETHERNET_HEADER_LENGTH: usize = frame_field::PAYLOAD.start;

pub struct EthernetFrame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> EthernetFrame<T> {
    pub const fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    pub fn new_checked(buffer: T) -> Result<Self, ParseDcpError> {
        let frame = Self::new_unchecked(buffer);
        frame.check_len()?;
        Ok(frame)
    }

    pub fn check_len(&self) -> Result<(), ParseDcpError> {
        if self.buffer.as_ref().len() < ETHERNET_HEADER_LENGTH {
            Err(ParseDcpError::Truncated(TruncatedAt::EthernetHeader))
        } else {
            Ok(())
        }
    }

    pub fn dst_address(&self) -> EthernetAddress {
        let data = self.buffer.as_ref();
        EthernetAddress::from_bytes(&data[frame_field::DESTINATION])
    }

    pub fn src_address(&self) -> EthernetAddress {
        let data = self.buffer.as_ref();
        EthernetAddress::from_bytes(&data[frame_field::SOURCE])
    }

    pub fn eth_type(&self) -> EthType {
        let data = self.buffer.as_ref();
        EthType::from(NetworkEndian::read_u16(&data[frame_field::ETHERTYPE]))
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> EthernetFrame<&'a T> {
    pub fn payload(&self) -> &'a [u8] {
        let data = self.buffer.as_ref();
        &data[frame_field::PAYLOAD]
    }
}

mod vlan_field {
    use crate::field::*;

    // The tag control field (priority and VLAN id) is not interpreted.
    pub const ETHERTYPE: Field = 2..4;
    pub const PAYLOAD: Rest = 4..;
}

pub const VLAN_TAG_LENGTH: usize = vlan_field::PAYLOAD.start;

/// The four tag bytes following an Ethernet header whose ethertype is 0x8100.
pub struct VlanTagFrame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> VlanTagFrame<T> {
    pub const fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    pub fn new_checked(buffer: T) -> Result<Self, ParseDcpError> {
        let frame = Self::new_unchecked(buffer);
        frame.check_len()?;
        Ok(frame)
    }

    pub fn check_len(&self) -> Result<(), ParseDcpError> {
        if self.buffer.as_ref().len() < VLAN_TAG_LENGTH {
            Err(ParseDcpError::Truncated(TruncatedAt::VlanTag))
        } else {
            Ok(())
        }
    }

    /// The encapsulated ethertype.
    pub fn eth_type(&self) -> EthType {
        let data = self.buffer.as_ref();
        EthType::from(NetworkEndian::read_u16(&data[vlan_field::ETHERTYPE]))
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> VlanTagFrame<&'a T> {
    pub fn payload(&self) -> &'a [u8] {
        let data = self.buffer.as_ref();
        &data[vlan_field::PAYLOAD]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_vlan() {
        let raw_packet: [u8; 64] = [
            0x01, 0x0e, 0xcf, 0x00, 0x00, 0x00, 0x52, 0x54, 0x00, 0x8a, 0x3b, 0xa5, 0x88, 0x92,
            0xfe, 0xfe, 0x05, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00, 0xc0, 0x00, 0x04, 0xff, 0xff,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let frame = EthernetFrame::new_checked(&raw_packet[..]).unwrap();

        assert_eq!(
            frame.dst_address(),
            EthernetAddress::from_bytes(&[0x01, 0x0e, 0xcf, 0x00, 0x00, 0x00])
        );
        assert_eq!(
            frame.src_address(),
            EthernetAddress::from_bytes(&[0x52, 0x54, 0x00, 0x8a, 0x3b, 0xa5])
        );
        assert_eq!(frame.eth_type(), EthType::Profinet);
        assert_eq!(frame.payload().len(), 50);
    }

    #[test]
    fn test_vlan() {
        let raw_packet = [
            0x01, 0x0e, 0xcf, 0x00, 0x00, 0x00, 0xa8, 0x5e, 0x45, 0x15, 0x85, 0x46, 0x81, 0x00,
            0x00, 0x00, 0x88, 0x92, 0xfe, 0xfe, 0x05, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01,
            0x00, 0x04, 0xff, 0xff, 0x00, 0x00,
        ];

        let frame = EthernetFrame::new_checked(&raw_packet[..]).unwrap();
        assert_eq!(frame.eth_type(), EthType::Vlan);

        let tag = VlanTagFrame::new_checked(frame.payload()).unwrap();
        assert_eq!(tag.eth_type(), EthType::Profinet);
        assert_eq!(tag.payload()[0..2], [0xfe, 0xfe]);
    }

    #[test]
    fn test_truncated_header() {
        let raw_packet = [0x01, 0x0e, 0xcf, 0x00, 0x00, 0x00, 0x52, 0x54];

        assert_eq!(
            EthernetFrame::new_checked(&raw_packet[..]).err(),
            Some(ParseDcpError::Truncated(TruncatedAt::EthernetHeader))
        );
    }

    #[test]
    fn test_truncated_vlan_tag() {
        let raw_packet = [0x81, 0x00, 0x88];

        assert_eq!(
            VlanTagFrame::new_checked(&raw_packet[..]).err(),
            Some(ParseDcpError::Truncated(TruncatedAt::VlanTag))
        );
    }

    #[test]
    fn test_other_eth_type() {
        let mut raw_packet = [0u8; 14];
        raw_packet[12] = 0x08;
        raw_packet[13] = 0x00;

        let frame = EthernetFrame::new_checked(&raw_packet[..]).unwrap();
        assert_eq!(frame.eth_type(), EthType::Other);
    }
}
