// Local IPv4 detection
//
// Two strategies, in order:
//   1. Parse the OS interface listing (`ip addr`, `ifconfig`, `ipconfig`)
//      for a private 192.168.x.x address.
//   2. "Connect" a UDP socket toward a public address and read back the
//      local endpoint the routing table picked. Nothing is sent.

use regex::Regex;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::process::Command;

/// Address used only to make the kernel choose an outbound source address.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

const IP_ADDR_ARGS: &[&str] = &["addr"];
const NO_ARGS: &[&str] = &[];

/// Output format of the platform's interface listing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStyle {
    /// `ip addr` (Linux) and `ifconfig` (macOS/BSD): `inet 192.168.1.5/24` or `inet 192.168.1.5 netmask ...`
    Inet,
    /// `ipconfig` (Windows): `IPv4 Address. . . . . : 192.168.1.5`
    Ipconfig,
}

/// Best-effort local IPv4 address for subnet scanning.
pub async fn detect_local_ip() -> Option<Ipv4Addr> {
    if let Some(ip) = from_interface_listing().await {
        return Some(ip);
    }
    tracing::debug!("No private address in interface listing, trying default route");
    default_route_ip().await
}

fn listing_command() -> Option<(&'static str, &'static [&'static str], ListingStyle)> {
    if cfg!(target_os = "linux") {
        Some(("ip", IP_ADDR_ARGS, ListingStyle::Inet))
    } else if cfg!(target_os = "windows") {
        Some(("ipconfig", NO_ARGS, ListingStyle::Ipconfig))
    } else if cfg!(target_os = "macos") {
        Some(("ifconfig", NO_ARGS, ListingStyle::Inet))
    } else {
        None
    }
}

/// Strategy 1: OS interface listing.
pub async fn from_interface_listing() -> Option<Ipv4Addr> {
    let (program, args, style) = listing_command()?;
    let output = match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            tracing::debug!(program, status = %output.status, "Interface listing failed");
            return None;
        }
        Err(e) => {
            tracing::debug!(program, error = %e, "Failed to run interface listing");
            return None;
        }
    };
    parse_interface_listing(&String::from_utf8_lossy(&output.stdout), style)
}

/// First 192.168.x.x address found in an interface listing.
pub fn parse_interface_listing(output: &str, style: ListingStyle) -> Option<Ipv4Addr> {
    let pattern = match style {
        ListingStyle::Inet => r"inet\s+(192\.168\.\d{1,3}\.\d{1,3})",
        ListingStyle::Ipconfig => r"IPv4 Address[ .]*:\s+(192\.168\.\d{1,3}\.\d{1,3})",
    };
    let re = Regex::new(pattern).ok()?;
    let found = re
        .captures_iter(output)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .next();
    found
}

/// Strategy 2: source address the kernel would use for outbound traffic.
pub async fn default_route_ip() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await.ok()?;
    if let Err(e) = socket.connect(ROUTE_PROBE_ADDR).await {
        tracing::debug!(error = %e, "No default route");
        return None;
    }
    match socket.local_addr().ok()? {
        SocketAddr::V4(addr) if !addr.ip().is_unspecified() => Some(*addr.ip()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IP_ADDR: &str = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN group default qlen 1000
    inet 127.0.0.1/8 scope host lo
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP group default qlen 1000
    inet 10.8.0.4/16 brd 10.8.255.255 scope global eth0
3: wlan0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue state UP group default qlen 1000
    inet 192.168.1.37/24 brd 192.168.1.255 scope global dynamic wlan0
";

    const IPCONFIG: &str = "\
Ethernet adapter Ethernet:

   Connection-specific DNS Suffix  . : lan
   IPv4 Address. . . . . . . . . . . : 192.168.0.23
   Subnet Mask . . . . . . . . . . . : 255.255.255.0
";

    const IFCONFIG: &str = "\
en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tinet6 fe80::1c2b:aaaa:bbbb:cccc%en0 prefixlen 64 secured scopeid 0x6
\tinet 192.168.50.8 netmask 0xffffff00 broadcast 192.168.50.255
";

    #[test]
    fn test_parse_ip_addr_skips_non_private_ranges() {
        assert_eq!(
            parse_interface_listing(IP_ADDR, ListingStyle::Inet),
            Some(Ipv4Addr::new(192, 168, 1, 37))
        );
    }

    #[test]
    fn test_parse_ipconfig() {
        assert_eq!(
            parse_interface_listing(IPCONFIG, ListingStyle::Ipconfig),
            Some(Ipv4Addr::new(192, 168, 0, 23))
        );
    }

    #[test]
    fn test_parse_ifconfig() {
        assert_eq!(
            parse_interface_listing(IFCONFIG, ListingStyle::Inet),
            Some(Ipv4Addr::new(192, 168, 50, 8))
        );
    }

    #[test]
    fn test_parse_no_match() {
        assert_eq!(
            parse_interface_listing("inet 10.0.0.1/8", ListingStyle::Inet),
            None
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_detection_runs_on_single_threaded_runtime() {
        let ticker = tokio::spawn(async {
            for _ in 0..3 {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        });
        let detected = tokio::time::timeout(std::time::Duration::from_secs(10), detect_local_ip())
            .await
            .expect("detection finished");
        if let Some(ip) = detected {
            assert!(!ip.is_unspecified());
        }
        ticker.await.unwrap();
    }

    #[test]
    fn test_parse_rejects_out_of_range_octets() {
        assert_eq!(
            parse_interface_listing("inet 192.168.300.1/24", ListingStyle::Inet),
            None
        );
    }
}
