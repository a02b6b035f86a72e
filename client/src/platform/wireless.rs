//! Linux WiFi status via /proc, /sys, `ip` and `nmcli`

use monitor::{Encryption, NetworkInfo, PlatformError, WifiStatus};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;
use tracing::debug;

pub struct LinuxWifi {
    interface: String,
    proc_wireless: PathBuf,
    sys_net: PathBuf,
}

impl LinuxWifi {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            proc_wireless: PathBuf::from("/proc/net/wireless"),
            sys_net: PathBuf::from("/sys/class/net"),
        }
    }

    fn read_level(&self) -> Option<i32> {
        let contents = std::fs::read_to_string(&self.proc_wireless).ok()?;
        parse_proc_wireless(&contents, &self.interface)
    }

    fn link_up(&self) -> bool {
        let path = self.sys_net.join(&self.interface).join("operstate");
        match std::fs::read_to_string(&path) {
            Ok(state) => state.trim() == "up",
            Err(e) => {
                debug!("Failed to read {:?}: {}", path, e);
                false
            }
        }
    }
}

impl WifiStatus for LinuxWifi {
    fn rssi(&self) -> i32 {
        self.read_level().unwrap_or(0)
    }

    fn is_connected(&self) -> bool {
        self.link_up() && self.read_level().is_some()
    }

    fn local_ip(&self) -> Option<IpAddr> {
        let output = Command::new("ip")
            .args(["-4", "-o", "addr", "show", "dev", self.interface.as_str()])
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        parse_ip_addr(&String::from_utf8_lossy(&output.stdout))
    }

    fn scan(&mut self) -> Result<Vec<NetworkInfo>, PlatformError> {
        let output = Command::new("nmcli")
            .args(["-t", "-f", "SSID,SIGNAL,CHAN,SECURITY", "dev", "wifi", "list", "ifname", self.interface.as_str()])
            .output()
            .map_err(|e| PlatformError::Scan(format!("Failed to execute 'nmcli': {}", e)))?;

        if !output.status.success() {
            return Err(PlatformError::Scan(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(parse_nmcli_scan(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Signal level (dBm) of `interface` from /proc/net/wireless
///
/// ```text
/// Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
///  face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
///  wlan0: 0000   54.  -56.  -256        0      0      0      0    114        0
/// ```
fn parse_proc_wireless(contents: &str, interface: &str) -> Option<i32> {
    let prefix = format!("{}:", interface);

    for line in contents.lines() {
        let line = line.trim_start();
        if let Some(rest) = line.strip_prefix(&prefix) {
            let level = rest.split_whitespace().nth(2)?;
            let level: i32 = level.trim_end_matches('.').parse().ok()?;
            // Some drivers report the level as an unsigned byte
            return Some(if level > 0 { level - 256 } else { level });
        }
    }

    None
}

/// First IPv4 address from `ip -4 -o addr show` output
fn parse_ip_addr(output: &str) -> Option<IpAddr> {
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if let Some(idx) = parts.iter().position(|&p| p == "inet") {
            if let Some(cidr) = parts.get(idx + 1) {
                let addr = cidr.split('/').next().unwrap_or(cidr);
                if let Ok(ip) = IpAddr::from_str(addr) {
                    return Some(ip);
                }
            }
        }
    }
    None
}

/// Parse `nmcli -t -f SSID,SIGNAL,CHAN,SECURITY dev wifi list`
fn parse_nmcli_scan(output: &str) -> Vec<NetworkInfo> {
    let mut networks = Vec::new();

    for line in output.lines() {
        let fields = split_terse(line);
        if fields.len() < 4 {
            continue;
        }

        let Ok(quality) = fields[1].parse::<i32>() else {
            debug!("Skipping nmcli line with bad signal: {}", line);
            continue;
        };
        let channel = fields[2].parse::<u32>().unwrap_or(0);
        let security = fields[3].trim();
        let encryption = if security.is_empty() || security == "--" {
            Encryption::Open
        } else {
            Encryption::Secured
        };

        networks.push(NetworkInfo {
            ssid: fields[0].clone(),
            rssi: quality_to_dbm(quality),
            channel,
            encryption,
        });
    }

    networks
}

/// Inverse of the 0-100 signal score mapping
fn quality_to_dbm(quality: i32) -> i32 {
    quality.clamp(0, 100) / 2 - 100
}

/// Split an nmcli terse line on ':' honoring `\:` and `\\` escapes
fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
