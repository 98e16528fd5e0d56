//! Raw Ethernet frame I/O for the discovery and flash-LED drivers.

use std::io;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use smoltcp::wire::EthernetAddress;

/// Large enough for a VLAN-tagged maximum-size Ethernet frame.
pub const MAX_FRAME_LENGTH: usize = 1522;

/// Frame-level send/receive, so the driver loops can run against an
/// in-memory double in tests.
pub trait Transport {
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Receives one frame into `buffer`, or `None` if nothing arrived
    /// within the poll interval.
    fn recv(&mut self, buffer: &mut [u8]) -> Result<Option<usize>>;
}

/// Raw socket bound to one Ethernet interface.
pub struct RawSocket {
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
}

impl RawSocket {
    /// Opens a raw channel on `interface_name` and returns it along with
    /// the interface MAC address. Needs CAP_NET_RAW or root.
    pub fn open(interface_name: &str, promiscuous: bool) -> Result<(Self, EthernetAddress)> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface: &NetworkInterface| iface.name == interface_name)
            .ok_or_else(|| anyhow!("no such interface: {}", interface_name))?;

        let mac = interface
            .mac
            .ok_or_else(|| anyhow!("interface {} has no MAC address", interface_name))?;
        let local_addr = EthernetAddress(mac.octets());

        let config = datalink::Config {
            read_timeout: Some(Duration::from_millis(10)),
            promiscuous,
            ..Default::default()
        };

        let channel = datalink::channel(&interface, config)
            .with_context(|| format!("failed to open raw socket on {}", interface_name))?;
        let (tx, rx) = match channel {
            Channel::Ethernet(tx, rx) => (tx, rx),
            _ => bail!("unsupported channel type on {}", interface_name),
        };

        log::debug!("opened {} with address {}", interface_name, local_addr);

        Ok((Self { tx, rx }, local_addr))
    }
}

/// In-memory transport double used by the driver tests.
#[cfg(test)]
pub(crate) struct MockTransport {
    pub sent: Vec<Vec<u8>>,
    pub incoming: std::collections::VecDeque<Vec<u8>>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new(incoming: Vec<Vec<u8>>) -> Self {
        Self {
            sent: Vec::new(),
            incoming: incoming.into(),
        }
    }
}

#[cfg(test)]
impl Transport for MockTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn recv(&mut self, buffer: &mut [u8]) -> Result<Option<usize>> {
        match self.incoming.pop_front() {
            Some(frame) => {
                buffer[..frame.len()].copy_from_slice(&frame);
                Ok(Some(frame.len()))
            }
            None => Ok(None),
        }
    }
}

impl Transport for RawSocket {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        match self.tx.send_to(frame, None) {
            Some(result) => result.context("send failed"),
            None => bail!("send failed: no destination channel"),
        }
    }

    fn recv(&mut self, buffer: &mut [u8]) -> Result<Option<usize>> {
        match self.rx.next() {
            Ok(frame) => {
                let length = frame.len().min(buffer.len());
                buffer[..length].copy_from_slice(&frame[..length]);
                Ok(Some(length))
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e).context("receive failed"),
        }
    }
}
