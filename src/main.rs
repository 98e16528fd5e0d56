use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use smoltcp::wire::EthernetAddress;

use pn_tools::{discover, flash_led, DiscoveredDevice, RawSocket};

#[derive(Parser)]
#[command(name = "pn-tools", version, about = "PROFINET DCP discovery and maintenance tool")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover DCP-capable devices on an interface
    Discovery {
        /// Network interface to send on
        #[arg(short, long)]
        interface: String,

        /// How long to wait for responses, in milliseconds
        #[arg(short, long, default_value_t = 5000)]
        timeout: u64,

        /// Print a column header row
        #[arg(short = 'o', long)]
        headers: bool,

        /// Put the interface into promiscuous mode
        #[arg(short, long)]
        promiscuous: bool,
    },
    /// Flash the identification LED of one device
    Flashled {
        /// Network interface to send on
        #[arg(short, long)]
        interface: String,

        /// MAC address of the target device
        #[arg(short, long, value_parser = parse_mac)]
        target: EthernetAddress,

        /// Number of flash requests to send
        #[arg(short, long, default_value_t = 1)]
        count: u32,

        /// Pause between repeated requests, in milliseconds
        #[arg(short, long, default_value_t = 3000)]
        wait: u64,
    },
}

fn parse_mac(s: &str) -> Result<EthernetAddress, String> {
    let mut octets = [0u8; 6];
    let mut parts = s.split(&[':', '-']);

    for octet in octets.iter_mut() {
        let part = parts.next().ok_or("expected 6 octets")?;
        *octet = u8::from_str_radix(part, 16).map_err(|e| e.to_string())?;
    }
    if parts.next().is_some() {
        return Err("expected 6 octets".into());
    }

    Ok(EthernetAddress(octets))
}

const HEADER_ROW: &str =
    "Station Name\tVendor Value\tDevice Role\tVendorID\tDeviceID\tIP Address\tSubnet Mask\tGateway\tIP status";

fn print_device(device: &DiscoveredDevice) {
    let d = &device.descriptor;
    println!(
        "{}\t{}\t{}\t{:04x}\t{:04x}\t{}\t{}\t{}\t{}",
        d.station_name,
        d.vendor_value,
        d.device_role,
        d.vendor_id,
        d.device_id,
        d.ip_address,
        d.subnet_mask,
        d.gateway,
        d.ip_block_info,
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Discovery {
            interface,
            timeout,
            headers,
            promiscuous,
        } => {
            let (mut socket, local_addr) = RawSocket::open(&interface, promiscuous)?;
            let devices = discover(&mut socket, local_addr, Duration::from_millis(timeout))?;

            if headers {
                println!("{}", HEADER_ROW);
            }
            for device in &devices {
                print_device(device);
            }
        }
        Command::Flashled {
            interface,
            target,
            count,
            wait,
        } => {
            let (mut socket, local_addr) = RawSocket::open(&interface, false)?;
            flash_led(
                &mut socket,
                local_addr,
                target,
                count,
                Duration::from_millis(wait),
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_and_target_are_flags() {
        let cli = Cli::try_parse_from([
            "pn-tools",
            "flashled",
            "-i",
            "eth0",
            "-t",
            "8c:f3:19:45:01:63",
            "--count",
            "2",
        ])
        .unwrap();

        match cli.command {
            Command::Flashled {
                interface,
                target,
                count,
                wait,
            } => {
                assert_eq!(interface, "eth0");
                assert_eq!(target, EthernetAddress([0x8c, 0xf3, 0x19, 0x45, 0x01, 0x63]));
                assert_eq!(count, 2);
                assert_eq!(wait, 3000);
            }
            _ => panic!("wrong subcommand"),
        }

        let cli = Cli::try_parse_from([
            "pn-tools",
            "discovery",
            "--interface",
            "eth1",
            "-t",
            "2500",
            "-o",
        ])
        .unwrap();

        match cli.command {
            Command::Discovery {
                interface,
                timeout,
                headers,
                promiscuous,
            } => {
                assert_eq!(interface, "eth1");
                assert_eq!(timeout, 2500);
                assert!(headers);
                assert!(!promiscuous);
            }
            _ => panic!("wrong subcommand"),
        }

        // Positional form is rejected.
        assert!(Cli::try_parse_from(["pn-tools", "discovery", "eth0"]).is_err());
    }

    #[test]
    fn test_parse_mac() {
        assert_eq!(
            parse_mac("8c:f3:19:45:01:63"),
            Ok(EthernetAddress([0x8c, 0xf3, 0x19, 0x45, 0x01, 0x63]))
        );
        assert_eq!(
            parse_mac("8C-F3-19-45-01-63"),
            Ok(EthernetAddress([0x8c, 0xf3, 0x19, 0x45, 0x01, 0x63]))
        );

        assert!(parse_mac("8c:f3:19:45:01").is_err());
        assert!(parse_mac("8c:f3:19:45:01:63:00").is_err());
        assert!(parse_mac("zz:f3:19:45:01:63").is_err());
    }
}
