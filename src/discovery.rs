//! Identify-based device discovery.

use std::time::{Duration, Instant};

use anyhow::Result;
use smoltcp::wire::EthernetAddress;

use crate::dcp::{
    build_identify_request, parse_dcp_frame, parse_identify_blocks, DcpFrameId, DeviceDescriptor,
};
use crate::transport::{Transport, MAX_FRAME_LENGTH};

/// One device that answered the Identify multicast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub sender: EthernetAddress,
    pub descriptor: DeviceDescriptor,
}

/// Sends one Identify multicast and collects responses until `timeout`
/// elapses. Frames that fail validation are logged and skipped.
pub fn discover(
    transport: &mut dyn Transport,
    local_addr: EthernetAddress,
    timeout: Duration,
) -> Result<Vec<DiscoveredDevice>> {
    let mut request = [0u8; MAX_FRAME_LENGTH];
    let length = build_identify_request(&mut request, local_addr);

    log::info!("sending identify request, waiting {:?} for responses", timeout);
    transport.send(&request[..length])?;

    let deadline = Instant::now() + timeout;
    let mut devices = Vec::new();
    let mut buffer = [0u8; MAX_FRAME_LENGTH];

    while Instant::now() < deadline {
        let Some(received) = transport.recv(&mut buffer)? else {
            continue;
        };

        let frame = match parse_dcp_frame(
            &buffer[..received],
            Some(local_addr),
            Some(DcpFrameId::IdentifyResponse),
        ) {
            Ok(frame) => frame,
            Err(reason) => {
                log::debug!("discarding frame: {:?}", reason);
                continue;
            }
        };

        let descriptor = parse_identify_blocks(frame.payload);
        log::info!("device {} answered as {}", frame.source, descriptor.station_name);

        devices.push(DiscoveredDevice {
            sender: frame.source,
            descriptor,
        });
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcp::{StationName, IDENTIFY_REQUEST_LENGTH};
    use crate::transport::MockTransport;

    use crate::dcp::CAPTURED_IDENTIFY_RESPONSE;

    const LOCAL: EthernetAddress = EthernetAddress([0x52, 0x54, 0x00, 0x8a, 0x3b, 0xa5]);
    const DEVICE: EthernetAddress = EthernetAddress([0x8c, 0xf3, 0x19, 0x45, 0x01, 0x63]);

    #[test]
    fn test_discover_filters_and_decodes() {
        // An identify request from another station shares our ethertype but
        // carries the wrong frame-id; the short frame is plain noise.
        let mut own_request = [0u8; MAX_FRAME_LENGTH];
        let own_length = build_identify_request(&mut own_request, DEVICE);

        let mut transport = MockTransport::new(vec![
            vec![0u8; 8],
            own_request[..own_length].to_vec(),
            CAPTURED_IDENTIFY_RESPONSE.to_vec(),
        ]);

        let devices = discover(&mut transport, LOCAL, Duration::from_millis(50)).unwrap();

        assert_eq!(transport.sent.len(), 1);
        assert_eq!(transport.sent[0].len(), IDENTIFY_REQUEST_LENGTH);

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].sender, DEVICE);
        assert_eq!(
            devices[0].descriptor.station_name,
            StationName::from_str("plcxb1d0ed")
        );
        assert_eq!(devices[0].descriptor.vendor_id, 0x002a);
    }

    #[test]
    fn test_discover_no_responses() {
        let mut transport = MockTransport::new(Vec::new());

        let devices = discover(&mut transport, LOCAL, Duration::from_millis(10)).unwrap();
        assert!(devices.is_empty());
    }
}
