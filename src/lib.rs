//! PROFINET DCP discovery and identification tools.
//!
//! The [`dcp`] module is the wire codec: it builds Identify and
//! Control/Signal request frames and decodes Identify responses into a
//! [`DeviceDescriptor`]. The [`transport`], [`discovery`] and [`flashled`]
//! modules drive the codec over a raw link-layer socket.

pub mod dcp;
pub mod discovery;
pub mod ethernet;
pub mod flashled;
pub mod transport;

mod field {
    pub type SmallField = usize;
    pub type Field = ::core::ops::Range<usize>;
    pub type Rest = ::core::ops::RangeFrom<usize>;
}

pub use dcp::*;
pub use discovery::{discover, DiscoveredDevice};
pub use flashled::flash_led;
pub use transport::{RawSocket, Transport, MAX_FRAME_LENGTH};
