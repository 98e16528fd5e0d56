//! The DCP wire codec: request encoders, the receive-path validator and the
//! Identify block parser.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::EthernetAddress;

use crate::ethernet::{EthType, EthernetFrame, VlanTagFrame};
use crate::field::{Field, SmallField};

mod block;
mod block_options;
mod error;
mod header;

pub use block::*;
pub use block_options::*;
pub use error::{ParseDcpError, TruncatedAt};
pub use header::*;

/// Multicast address all DCP Identify requests are sent to.
pub const DCP_MULTICAST_ADDRESS: EthernetAddress =
    EthernetAddress([0x01, 0x0e, 0xcf, 0x00, 0x00, 0x00]);

/// Fixed transaction ids marking our own requests on the wire.
pub const DISCOVERY_X_ID: u32 = 0x4242_4242;
pub const FLASH_LED_X_ID: u32 = 0x2424_2424;

const IDENTIFY_RESPONSE_DELAY: u16 = 128;

/// Control/Signal value requesting a single LED flash cycle.
const SIGNAL_FLASH_ONCE: u16 = 0x0100;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum DcpFrameId {
    Hello = 0xfefc,
    GetSet = 0xfefd,
    IdentifyRequest = 0xfefe,
    IdentifyResponse = 0xfeff,
}

mod profinet_field {
    use crate::field::*;

    pub const FRAME_ID: Field = 0..2;
    pub const PAYLOAD: Rest = 2..;
}

pub const PROFINET_HEADER_LENGTH: usize = profinet_field::PAYLOAD.start;

pub struct ProfinetFrame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> ProfinetFrame<T> {
    pub const fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    pub fn new_checked(buffer: T) -> Result<Self, ParseDcpError> {
        let frame = Self::new_unchecked(buffer);
        frame.check_len()?;
        Ok(frame)
    }

    pub fn check_len(&self) -> Result<(), ParseDcpError> {
        if self.buffer.as_ref().len() < PROFINET_HEADER_LENGTH {
            Err(ParseDcpError::Truncated(TruncatedAt::ProfinetHeader))
        } else {
            Ok(())
        }
    }

    pub fn frame_id(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[profinet_field::FRAME_ID])
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> ProfinetFrame<&'a T> {
    pub fn payload(&self) -> &'a [u8] {
        let data = self.buffer.as_ref();
        &data[profinet_field::PAYLOAD]
    }
}

/// A validated DCP frame. `payload` is the block sequence, exactly
/// `header.data_length` bytes long regardless of Ethernet padding.
#[derive(Debug, PartialEq, Eq)]
pub struct DcpFrame<'a> {
    pub destination: EthernetAddress,
    pub source: EthernetAddress,
    pub frame_id: u16,
    pub header: DcpHeader,
    pub payload: &'a [u8],
}

/// Walks Ethernet, optional 802.1Q tag, PROFINET and DCP headers of a
/// received buffer, bounds-checking each stage.
///
/// With `local_addr` set, frames addressed elsewhere are rejected; the
/// all-ones broadcast and the DCP multicast address are always accepted.
/// With `expected_frame_id` set, any other PROFINET frame class is
/// rejected. Every failure is a typed [`ParseDcpError`], never a panic.
pub fn parse_dcp_frame<'a>(
    buffer: &'a [u8],
    local_addr: Option<EthernetAddress>,
    expected_frame_id: Option<DcpFrameId>,
) -> Result<DcpFrame<'a>, ParseDcpError> {
    let eth = EthernetFrame::new_checked(buffer)?;

    if let Some(local) = local_addr {
        let destination = eth.dst_address();
        if destination != local
            && destination != EthernetAddress::BROADCAST
            && destination != DCP_MULTICAST_ADDRESS
        {
            return Err(ParseDcpError::AddressMismatch);
        }
    }

    let (eth_type, profinet_buffer) = match eth.eth_type() {
        EthType::Vlan => {
            let tag = VlanTagFrame::new_checked(eth.payload())?;
            (tag.eth_type(), tag.payload())
        }
        other => (other, eth.payload()),
    };
    if eth_type != EthType::Profinet {
        return Err(ParseDcpError::ProtocolMismatch);
    }

    let profinet = ProfinetFrame::new_checked(profinet_buffer)?;
    if let Some(expected) = expected_frame_id {
        if profinet.frame_id() != expected as u16 {
            return Err(ParseDcpError::FrameIdMismatch);
        }
    }

    let dcp = DcpHeaderFrame::new_checked(profinet.payload())?;

    Ok(DcpFrame {
        destination: eth.dst_address(),
        source: eth.src_address(),
        frame_id: profinet.frame_id(),
        header: DcpHeader::parse(&dcp),
        payload: dcp.payload(),
    })
}

// Outbound request layout. Requests are never VLAN-tagged, so these offsets
// are fixed.
const DESTINATION_FIELD: Field = 0..6;
const SOURCE_FIELD: Field = 6..12;
const ETHERTYPE_FIELD: Field = 12..14;
const FRAME_ID_FIELD: Field = 14..16;
const SERVICE_ID_FIELD: SmallField = 16;
const SERVICE_TYPE_FIELD: SmallField = 17;
const X_ID_FIELD: Field = 18..22;
const RESPONSE_DELAY_FIELD: Field = 22..24;
const DATA_LENGTH_FIELD: Field = 24..26;
const BLOCK_OPTION_FIELD: SmallField = 26;
const BLOCK_SUBOPTION_FIELD: SmallField = 27;
const BLOCK_LENGTH_FIELD: Field = 28..30;
const BLOCK_QUALIFIER_FIELD: Field = 30..32;
const SIGNAL_VALUE_FIELD: Field = 32..34;

pub const IDENTIFY_REQUEST_LENGTH: usize = BLOCK_OPTION_FIELD + DCP_BLOCK_HEADER_LENGTH;
pub const FLASH_LED_REQUEST_LENGTH: usize = SIGNAL_VALUE_FIELD.end;

fn encode_request_headers(
    buffer: &mut [u8],
    destination: EthernetAddress,
    source: EthernetAddress,
    frame_id: DcpFrameId,
    service_id: ServiceId,
    x_id: u32,
    response_delay: u16,
    data_length: u16,
) {
    buffer[DESTINATION_FIELD].copy_from_slice(destination.as_bytes());
    buffer[SOURCE_FIELD].copy_from_slice(source.as_bytes());
    NetworkEndian::write_u16(&mut buffer[ETHERTYPE_FIELD], EthType::Profinet as u16);
    NetworkEndian::write_u16(&mut buffer[FRAME_ID_FIELD], frame_id as u16);
    buffer[SERVICE_ID_FIELD] = service_id as u8;
    buffer[SERVICE_TYPE_FIELD] = ServiceType::Request as u8;
    NetworkEndian::write_u32(&mut buffer[X_ID_FIELD], x_id);
    NetworkEndian::write_u16(&mut buffer[RESPONSE_DELAY_FIELD], response_delay);
    NetworkEndian::write_u16(&mut buffer[DATA_LENGTH_FIELD], data_length);
}

/// Builds an Identify multicast request into `buffer` and returns the frame
/// length. The buffer must hold at least [`IDENTIFY_REQUEST_LENGTH`] bytes.
pub fn build_identify_request(buffer: &mut [u8], source: EthernetAddress) -> usize {
    encode_request_headers(
        buffer,
        DCP_MULTICAST_ADDRESS,
        source,
        DcpFrameId::IdentifyRequest,
        ServiceId::Identify,
        DISCOVERY_X_ID,
        IDENTIFY_RESPONSE_DELAY,
        DCP_BLOCK_HEADER_LENGTH as u16,
    );

    // A single All-selector block with no payload requests every property.
    buffer[BLOCK_OPTION_FIELD] = BlockOption::All as u8;
    buffer[BLOCK_SUBOPTION_FIELD] = AllSuboption::All as u8;
    NetworkEndian::write_u16(&mut buffer[BLOCK_LENGTH_FIELD], 0);

    IDENTIFY_REQUEST_LENGTH
}

/// Builds a unicast Control/Signal request telling `destination` to flash
/// its identification LED once. The buffer must hold at least
/// [`FLASH_LED_REQUEST_LENGTH`] bytes.
pub fn build_flash_led_request(
    buffer: &mut [u8],
    source: EthernetAddress,
    destination: EthernetAddress,
) -> usize {
    encode_request_headers(
        buffer,
        destination,
        source,
        DcpFrameId::GetSet,
        ServiceId::Set,
        FLASH_LED_X_ID,
        0,
        (DCP_BLOCK_HEADER_LENGTH + 4) as u16,
    );

    buffer[BLOCK_OPTION_FIELD] = BlockOption::Control as u8;
    buffer[BLOCK_SUBOPTION_FIELD] = ControlSuboption::Signal as u8;
    NetworkEndian::write_u16(&mut buffer[BLOCK_LENGTH_FIELD], 4);
    NetworkEndian::write_u16(&mut buffer[BLOCK_QUALIFIER_FIELD], 0);
    NetworkEndian::write_u16(&mut buffer[SIGNAL_VALUE_FIELD], SIGNAL_FLASH_ONCE);

    FLASH_LED_REQUEST_LENGTH
}

/// Identify response of a Siemens S7-1200, VLAN-tagged and padded.
#[cfg(test)]
pub(crate) const CAPTURED_IDENTIFY_RESPONSE: [u8; 112] = [
    0x52, 0x54, 0x00, 0x8a, 0x3b, 0xa5, 0x8c, 0xf3, 0x19, 0x45, 0x01, 0x63, 0x81, 0x00,
    0x00, 0x00, 0x88, 0x92, 0xfe, 0xff, 0x05, 0x01, 0x00, 0x00, 0x01, 0x66, 0x00, 0x00,
    0x00, 0x52, 0x02, 0x05, 0x00, 0x04, 0x00, 0x00, 0x02, 0x07, 0x02, 0x01, 0x00, 0x09,
    0x00, 0x00, 0x53, 0x37, 0x2d, 0x31, 0x32, 0x30, 0x30, 0x00, 0x02, 0x02, 0x00, 0x0c,
    0x00, 0x00, 0x70, 0x6c, 0x63, 0x78, 0x62, 0x31, 0x64, 0x30, 0x65, 0x64, 0x02, 0x03,
    0x00, 0x06, 0x00, 0x00, 0x00, 0x2a, 0x01, 0x0d, 0x02, 0x04, 0x00, 0x04, 0x00, 0x00,
    0x02, 0x00, 0x02, 0x07, 0x00, 0x04, 0x00, 0x00, 0x00, 0x64, 0x01, 0x02, 0x00, 0x0e,
    0x00, 0x01, 0xc0, 0xa8, 0x00, 0x01, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00,
];
