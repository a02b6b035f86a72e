//! Platform collaborators: WiFi radio status and the network client
//!
//! The monitor never talks to hardware or sockets directly. Boards and hosts
//! provide these traits; the monitor only times and interprets the results.

use crate::error::PlatformError;
use serde::Serialize;
use std::fmt;
use std::io::{Cursor, Read};
use std::net::IpAddr;
use std::time::Duration;

/// Encryption category of a scanned access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encryption {
    Open,
    Secured,
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encryption::Open => f.write_str("Open"),
            Encryption::Secured => f.write_str("Secured"),
        }
    }
}

/// One access point seen during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub ssid: String,
    /// Signal strength in dBm
    pub rssi: i32,
    pub channel: u32,
    pub encryption: Encryption,
}

/// WiFi status and scan provider
pub trait WifiStatus {
    /// Current signal strength in dBm (0 when not associated)
    fn rssi(&self) -> i32;

    /// Whether the station is associated and has link
    fn is_connected(&self) -> bool;

    /// Address assigned to the station, if any
    fn local_ip(&self) -> Option<IpAddr>;

    /// Scan for nearby access points
    fn scan(&mut self) -> Result<Vec<NetworkInfo>, PlatformError>;
}

/// A received HTTP response with a streaming body
pub struct HttpResponse {
    pub status: u16,
    /// `Location` header, if present
    pub location: Option<String>,
    /// Declared `Content-Length`, if known
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

impl HttpResponse {
    /// Response without a body
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            location: None,
            content_length: None,
            body: Box::new(std::io::empty()),
        }
    }

    /// Response with an in-memory body and matching content length
    pub fn with_body(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            location: None,
            content_length: Some(body.len() as u64),
            body: Box::new(Cursor::new(body)),
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::empty(status)
        }
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("location", &self.location)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Network client used for connect probes and HTTP requests
///
/// `get` and `post` return `PlatformError::Session` when the request could not
/// even be set up (bad URL, client construction failure). Any other error means
/// the request was attempted and failed on the wire.
pub trait NetClient {
    /// Open and immediately close a TCP connection
    fn tcp_connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), PlatformError>;

    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, PlatformError>;

    fn post(&mut self, url: &str, body: &[u8], timeout: Duration) -> Result<HttpResponse, PlatformError>;
}

// Lets callers lend a client they own to the monitor
impl<T: NetClient + ?Sized> NetClient for &mut T {
    fn tcp_connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), PlatformError> {
        (**self).tcp_connect(host, port, timeout)
    }

    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, PlatformError> {
        (**self).get(url, timeout)
    }

    fn post(&mut self, url: &str, body: &[u8], timeout: Duration) -> Result<HttpResponse, PlatformError> {
        (**self).post(url, body, timeout)
    }
}

impl<T: NetClient + ?Sized> NetClient for Box<T> {
    fn tcp_connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), PlatformError> {
        (**self).tcp_connect(host, port, timeout)
    }

    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, PlatformError> {
        (**self).get(url, timeout)
    }

    fn post(&mut self, url: &str, body: &[u8], timeout: Duration) -> Result<HttpResponse, PlatformError> {
        (**self).post(url, body, timeout)
    }
}

impl<T: WifiStatus + ?Sized> WifiStatus for &mut T {
    fn rssi(&self) -> i32 {
        (**self).rssi()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn local_ip(&self) -> Option<IpAddr> {
        (**self).local_ip()
    }

    fn scan(&mut self) -> Result<Vec<NetworkInfo>, PlatformError> {
        (**self).scan()
    }
}
