//! Host network client: std TCP connects and a blocking reqwest client

use anyhow::{Context, Result};
use monitor::{HttpResponse, NetClient, PlatformError};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::Url;
use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

pub struct HostNetClient {
    http: Client,
}

impl HostNetClient {
    pub fn new() -> Result<Self> {
        // Redirects stay visible to the monitor
        let http = Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!("linkwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }

    fn send(&self, request: RequestBuilder, timeout: Duration) -> Result<HttpResponse, PlatformError> {
        let response = request
            .timeout(timeout)
            .send()
            .map_err(|e| classify(e, timeout))?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(HttpResponse {
            status: response.status().as_u16(),
            location,
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

fn parse_url(url: &str) -> Result<Url, PlatformError> {
    Url::parse(url).map_err(|e| PlatformError::Session(format!("invalid URL {}: {}", url, e)))
}

fn classify(e: reqwest::Error, timeout: Duration) -> PlatformError {
    if e.is_timeout() {
        PlatformError::Timeout(timeout.as_millis() as u64)
    } else if e.is_connect() {
        PlatformError::Connect(e.to_string())
    } else if e.is_builder() {
        PlatformError::Session(e.to_string())
    } else {
        PlatformError::Transport(e.to_string())
    }
}

impl NetClient for HostNetClient {
    fn tcp_connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), PlatformError> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| PlatformError::Connect(format!("Failed to resolve {}: {}", host, e)))?;

        let mut last_error = PlatformError::Connect(format!("No addresses found for {}", host));
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(_stream) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    debug!("Connect {} timed out", addr);
                    last_error = PlatformError::Timeout(timeout.as_millis() as u64);
                }
                Err(e) => {
                    debug!("Connect {} failed: {}", addr, e);
                    last_error = PlatformError::Connect(format!("{}: {}", addr, e));
                }
            }
        }

        Err(last_error)
    }

    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, PlatformError> {
        let url = parse_url(url)?;
        self.send(self.http.get(url), timeout)
    }

    fn post(&mut self, url: &str, body: &[u8], timeout: Duration) -> Result<HttpResponse, PlatformError> {
        let url = parse_url(url)?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body.to_vec());
        self.send(request, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_invalid_url_is_session_error() {
        let mut client = HostNetClient::new().unwrap();
        let result = client.get("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(PlatformError::Session(_))));
    }

    #[test]
    fn test_tcp_connect_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut client = HostNetClient::new().unwrap();
        assert!(client.tcp_connect("127.0.0.1", port, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_tcp_connect_closed_port_fails() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut client = HostNetClient::new().unwrap();
        assert!(client.tcp_connect("127.0.0.1", port, Duration::from_secs(1)).is_err());
    }
}
