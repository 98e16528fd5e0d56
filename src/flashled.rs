//! Flashing the identification LED of a known device.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use smoltcp::wire::EthernetAddress;

use crate::dcp::build_flash_led_request;
use crate::transport::{Transport, MAX_FRAME_LENGTH};

/// Sends `count` Control/Signal requests to `target`, pausing `wait`
/// between repeats. Responses are not waited for; the device signals by
/// blinking its LED.
pub fn flash_led(
    transport: &mut dyn Transport,
    local_addr: EthernetAddress,
    target: EthernetAddress,
    count: u32,
    wait: Duration,
) -> Result<()> {
    let mut request = [0u8; MAX_FRAME_LENGTH];
    let length = build_flash_led_request(&mut request, local_addr, target);

    for round in 0..count {
        if round > 0 {
            thread::sleep(wait);
        }
        log::info!("flashing LED of {} ({}/{})", target, round + 1, count);
        transport.send(&request[..length])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcp::FLASH_LED_REQUEST_LENGTH;
    use crate::transport::MockTransport;

    const LOCAL: EthernetAddress = EthernetAddress([0x52, 0x54, 0x00, 0x8a, 0x3b, 0xa5]);
    const TARGET: EthernetAddress = EthernetAddress([0x8c, 0xf3, 0x19, 0x45, 0x01, 0x63]);

    #[test]
    fn test_flash_led_sends_count_requests() {
        let mut transport = MockTransport::new(Vec::new());

        flash_led(&mut transport, LOCAL, TARGET, 3, Duration::ZERO).unwrap();

        assert_eq!(transport.sent.len(), 3);
        for frame in &transport.sent {
            assert_eq!(frame.len(), FLASH_LED_REQUEST_LENGTH);
            assert_eq!(&frame[..6], TARGET.as_bytes());
            assert_eq!(&frame[32..34], &[0x01, 0x00]);
        }
    }
}
