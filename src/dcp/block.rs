use core::fmt;

use byteorder::{ByteOrder, NetworkEndian};
use log::debug;
use num_enum::TryFromPrimitive;
use smoltcp::wire::Ipv4Address;

use super::block_options::{BlockOption, DevicePropertiesSuboption, IpSuboption};

pub const MAX_STATION_NAME_LENGTH: usize = 63;
pub const MAX_VENDOR_VALUE_LENGTH: usize = 63;

mod block_field {
    use crate::field::*;

    pub const OPTION: SmallField = 0;
    pub const SUBOPTION: SmallField = 1;
    pub const BLOCK_LENGTH: Field = 2..4;
    pub const BLOCK_INFO: Field = 4..6;
    pub const PAYLOAD: Rest = 6..;
}

pub const DCP_BLOCK_HEADER_LENGTH: usize = block_field::BLOCK_INFO.start;

/// View of a single TLV block. `block_length` declares the payload size
/// excluding the 4-byte block header; the 2-byte block-info field is the
/// start of that payload.
pub struct DcpBlockFrame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> DcpBlockFrame<T> {
    pub const fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    pub fn option(&self) -> u8 {
        let data = self.buffer.as_ref();
        data[block_field::OPTION]
    }

    pub fn suboption(&self) -> u8 {
        let data = self.buffer.as_ref();
        data[block_field::SUBOPTION]
    }

    pub fn block_length(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[block_field::BLOCK_LENGTH])
    }

    pub fn block_info(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[block_field::BLOCK_INFO])
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> DcpBlockFrame<&'a T> {
    /// The block body after the block-info field. Callers must have checked
    /// `block_length >= 2` first.
    pub fn payload(&self) -> &'a [u8] {
        let data = self.buffer.as_ref();
        &data[block_field::PAYLOAD]
    }
}

/// Walks the block sequence of a validated Identify response payload.
///
/// Recognized blocks fill in the descriptor; unknown or out-of-range blocks
/// are skipped. A block whose declared length extends past the end of the
/// payload stops the walk (malformed trailer) without reading past it.
pub fn parse_identify_blocks(payload: &[u8]) -> DeviceDescriptor {
    let mut descriptor = DeviceDescriptor::default();
    let mut cursor = 0;

    // A meaningful block is the 4-byte header plus at least one payload byte.
    while payload.len() > cursor + DCP_BLOCK_HEADER_LENGTH {
        let remaining = &payload[cursor..];
        let header = DcpBlockFrame::new_unchecked(remaining);
        let block_length = header.block_length() as usize;

        let total = DCP_BLOCK_HEADER_LENGTH + block_length;
        if total > remaining.len() {
            debug!(
                "block at offset {} declares {} bytes, only {} remain",
                cursor,
                block_length,
                remaining.len() - DCP_BLOCK_HEADER_LENGTH
            );
            break;
        }

        let block = DcpBlockFrame::new_unchecked(&remaining[..total]);
        decode_block(&block, block_length, &mut descriptor);

        cursor += total;
        // Blocks are padded to 16-bit alignment.
        if block_length % 2 != 0 {
            cursor += 1;
        }
    }

    descriptor
}

fn decode_block(block: &DcpBlockFrame<&[u8]>, block_length: usize, descriptor: &mut DeviceDescriptor) {
    match BlockOption::try_from_primitive(block.option()) {
        Ok(BlockOption::DeviceProperties) => {
            // Text blocks outside the bounds of their fixed-size fields are
            // skipped entirely rather than truncated.
            match DevicePropertiesSuboption::try_from_primitive(block.suboption()) {
                Ok(DevicePropertiesSuboption::DeviceVendor)
                    if (2..=MAX_VENDOR_VALUE_LENGTH).contains(&block_length) =>
                {
                    descriptor.vendor_value = VendorValue::from_bytes(block.payload());
                }
                Ok(DevicePropertiesSuboption::NameOfStation)
                    if (2..=MAX_STATION_NAME_LENGTH).contains(&block_length) =>
                {
                    descriptor.station_name = StationName::from_bytes(block.payload());
                }
                Ok(DevicePropertiesSuboption::DeviceId) if block_length >= 6 => {
                    let body = block.payload();
                    descriptor.vendor_id = NetworkEndian::read_u16(&body[0..2]);
                    descriptor.device_id = NetworkEndian::read_u16(&body[2..4]);
                }
                Ok(DevicePropertiesSuboption::DeviceRole) if block_length >= 3 => {
                    descriptor.device_role = block.payload()[0];
                }
                _ => (),
            }
        }
        Ok(BlockOption::Ip) => {
            if let Ok(IpSuboption::IpParameter) = IpSuboption::try_from_primitive(block.suboption()) {
                if block_length >= 14 {
                    let body = block.payload();
                    descriptor.ip_block_info = block.block_info();
                    descriptor.ip_address = Ipv4Address::from_bytes(&body[0..4]);
                    descriptor.subnet_mask = Ipv4Address::from_bytes(&body[4..8]);
                    descriptor.gateway = Ipv4Address::from_bytes(&body[8..12]);
                }
            }
        }
        _ => (),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationName {
    bytes: [u8; MAX_STATION_NAME_LENGTH],
    length: usize,
}

impl StationName {
    /// Copies `buffer` into the fixed-size field. Callers guarantee
    /// `buffer.len() <= MAX_STATION_NAME_LENGTH`.
    pub fn from_bytes(buffer: &[u8]) -> Self {
        let mut bytes = [0; MAX_STATION_NAME_LENGTH];
        bytes[..buffer.len()].copy_from_slice(buffer);

        Self {
            bytes,
            length: buffer.len(),
        }
    }

    pub fn from_str(name: &str) -> Self {
        Self::from_bytes(name.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length]
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl Default for StationName {
    fn default() -> Self {
        Self::from_bytes(&[])
    }
}

impl fmt::Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorValue {
    bytes: [u8; MAX_VENDOR_VALUE_LENGTH],
    length: usize,
}

impl VendorValue {
    pub fn from_bytes(buffer: &[u8]) -> Self {
        let mut bytes = [0; MAX_VENDOR_VALUE_LENGTH];
        bytes[..buffer.len()].copy_from_slice(buffer);

        Self {
            bytes,
            length: buffer.len(),
        }
    }

    pub fn from_str(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length]
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl Default for VendorValue {
    fn default() -> Self {
        Self::from_bytes(&[])
    }
}

impl fmt::Display for VendorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Everything an Identify response tells us about a device. Fields stay at
/// their zero/empty defaults when the response does not carry the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub station_name: StationName,
    pub vendor_value: VendorValue,
    pub vendor_id: u16,
    pub device_id: u16,
    pub device_role: u8,
    pub ip_block_info: u16,
    pub ip_address: Ipv4Address,
    pub subnet_mask: Ipv4Address,
    pub gateway: Ipv4Address,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            station_name: StationName::default(),
            vendor_value: VendorValue::default(),
            vendor_id: 0,
            device_id: 0,
            device_role: 0,
            ip_block_info: 0,
            ip_address: Ipv4Address::UNSPECIFIED,
            subnet_mask: Ipv4Address::UNSPECIFIED,
            gateway: Ipv4Address::UNSPECIFIED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_response_blocks() {
        let payload: [u8; 40] = [
            // NameOfStation "plc-01"
            0x02, 0x02, 0x00, 0x08, 0x00, 0x00, b'p', b'l', b'c', b'-', b'0', b'1',
            // DeviceId vendor 0x002a, device 0x0101
            0x02, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x2a, 0x01, 0x01,
            // IpParameter 10.0.0.5 / 255.255.255.0 / 10.0.0.1
            0x01, 0x02, 0x00, 0x0e, 0x00, 0x01, 0x0a, 0x00, 0x00, 0x05, 0xff, 0xff, 0xff, 0x00,
            0x0a, 0x00, 0x00, 0x01,
        ];

        let descriptor = parse_identify_blocks(&payload);

        assert_eq!(descriptor.station_name, StationName::from_str("plc-01"));
        assert!(descriptor.vendor_value.is_empty());
        assert_eq!(descriptor.vendor_id, 0x002a);
        assert_eq!(descriptor.device_id, 0x0101);
        assert_eq!(descriptor.device_role, 0);
        assert_eq!(descriptor.ip_block_info, 1);
        assert_eq!(descriptor.ip_address, Ipv4Address::new(10, 0, 0, 5));
        assert_eq!(descriptor.subnet_mask, Ipv4Address::new(255, 255, 255, 0));
        assert_eq!(descriptor.gateway, Ipv4Address::new(10, 0, 0, 1));
    }

    #[test]
    fn test_oversized_name_block_is_skipped() {
        // A station name declaring 200 bytes must not touch the 63-byte
        // field, and the block after it must still be decoded.
        let mut payload = vec![0x02, 0x02, 0x00, 0xc8, 0x00, 0x00];
        payload.extend(vec![b'x'; 198]);
        payload.extend([0x02, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x2a, 0x01, 0x0d]);

        let descriptor = parse_identify_blocks(&payload);

        assert!(descriptor.station_name.is_empty());
        assert_eq!(descriptor.vendor_id, 0x002a);
        assert_eq!(descriptor.device_id, 0x010d);
    }

    #[test]
    fn test_oversized_vendor_block_is_skipped() {
        // A vendor value declaring 100 bytes must not touch the 63-byte
        // field, and the block after it must still be decoded.
        let mut payload = vec![0x02, 0x01, 0x00, 0x64, 0x00, 0x00];
        payload.extend(vec![b'v'; 98]);
        payload.extend([0x02, 0x02, 0x00, 0x08, 0x00, 0x00]);
        payload.extend(b"plc-01");

        let descriptor = parse_identify_blocks(&payload);

        assert!(descriptor.vendor_value.is_empty());
        assert_eq!(descriptor.station_name, StationName::from_str("plc-01"));
    }

    #[test]
    fn test_name_block_copied_exactly() {
        let payload = [
            0x02, 0x02, 0x00, 0x0a, 0x00, 0x00, b'p', b'l', b'c', b'-', b'0', b'0', b'0', b'1',
        ];

        let descriptor = parse_identify_blocks(&payload);
        assert_eq!(descriptor.station_name.as_bytes(), b"plc-0001");
    }

    #[test]
    fn test_odd_block_length_padding() {
        // First block has an odd length, so the second block header starts
        // at offset 4 + 9 + 1.
        let payload = [
            0x02, 0x02, 0x00, 0x09, 0x00, 0x00, b'p', b'l', b'c', b'-', b'o', b'd', b'd', 0x00,
            0x02, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x2a, 0x01, 0x01,
        ];

        let descriptor = parse_identify_blocks(&payload);

        assert_eq!(descriptor.station_name, StationName::from_str("plc-odd"));
        assert_eq!(descriptor.vendor_id, 0x002a);
        assert_eq!(descriptor.device_id, 0x0101);
    }

    #[test]
    fn test_malformed_trailer_stops_parsing() {
        // Block claims 50 bytes but only 6 follow the header.
        let payload = [
            0x02, 0x02, 0x00, 0x32, 0x00, 0x00, b'p', b'l', b'c', 0x00,
        ];

        let descriptor = parse_identify_blocks(&payload);
        assert_eq!(descriptor, DeviceDescriptor::default());
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        let payload = [
            // DeviceInitiative block, not decoded
            0x06, 0x01, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01,
            // DeviceRole block
            0x02, 0x04, 0x00, 0x04, 0x00, 0x00, 0x02, 0x00,
        ];

        let descriptor = parse_identify_blocks(&payload);
        assert_eq!(descriptor.device_role, 2);
    }

    #[test]
    fn test_header_only_payload() {
        let payload = [0x02, 0x02, 0x00, 0x00];

        let descriptor = parse_identify_blocks(&payload);
        assert_eq!(descriptor, DeviceDescriptor::default());
    }
}
