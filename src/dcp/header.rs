use byteorder::{ByteOrder, NetworkEndian};
use num_enum::TryFromPrimitive;

use super::error::{ParseDcpError, TruncatedAt};

#[derive(Debug, PartialEq, Eq, Clone, Copy, TryFromPrimitive)]
#[repr(u8)]
pub enum ServiceId {
    Get = 3,
    Set = 4,
    Identify = 5,
    Hello = 6,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, TryFromPrimitive)]
#[repr(u8)]
pub enum ServiceType {
    Request = 0,
    Success = 1,
    NotSupported = 5,
}

mod header_field {
    use crate::field::*;

    pub const SERVICE_ID: SmallField = 0;
    pub const SERVICE_TYPE: SmallField = 1;
    pub const X_ID: Field = 2..6;
    pub const RESPONSE_DELAY: Field = 6..8;
    pub const DATA_LENGTH: Field = 8..10;
    pub const PAYLOAD: Rest = 10..;
}

pub const DCP_HEADER_LENGTH: usize = header_field::PAYLOAD.start;

pub struct DcpHeaderFrame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> DcpHeaderFrame<T> {
    pub const fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    pub fn new_checked(buffer: T) -> Result<Self, ParseDcpError> {
        let frame = Self::new_unchecked(buffer);
        frame.check_len()?;
        Ok(frame)
    }

    /// Requires the full fixed header plus at least the declared data length.
    pub fn check_len(&self) -> Result<(), ParseDcpError> {
        let len = self.buffer.as_ref().len();

        if len < DCP_HEADER_LENGTH {
            return Err(ParseDcpError::Truncated(TruncatedAt::DcpHeader));
        }
        if self.data_length() as usize > len - DCP_HEADER_LENGTH {
            return Err(ParseDcpError::DeclaredLengthExceedsBuffer);
        }

        Ok(())
    }

    pub fn service_id(&self) -> u8 {
        let data = self.buffer.as_ref();
        data[header_field::SERVICE_ID]
    }

    pub fn service_type(&self) -> u8 {
        let data = self.buffer.as_ref();
        data[header_field::SERVICE_TYPE]
    }

    pub fn x_id(&self) -> u32 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u32(&data[header_field::X_ID])
    }

    pub fn response_delay(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[header_field::RESPONSE_DELAY])
    }

    pub fn data_length(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[header_field::DATA_LENGTH])
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> DcpHeaderFrame<&'a T> {
    /// Exactly `data_length` bytes of block sequence. Trailing bytes in the
    /// receive buffer (Ethernet padding) are not part of the view.
    pub fn payload(&self) -> &'a [u8] {
        let data = self.buffer.as_ref();
        &data[DCP_HEADER_LENGTH..DCP_HEADER_LENGTH + self.data_length() as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcpHeader {
    pub service_id: u8,
    pub service_type: u8,
    pub x_id: u32,
    pub response_delay: u16,
    pub data_length: u16,
}

impl DcpHeader {
    pub fn parse<T: AsRef<[u8]>>(frame: &DcpHeaderFrame<T>) -> Self {
        Self {
            service_id: frame.service_id(),
            service_type: frame.service_type(),
            x_id: frame.x_id(),
            response_delay: frame.response_delay(),
            data_length: frame.data_length(),
        }
    }
}
