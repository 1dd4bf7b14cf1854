use std::net::{IpAddr, SocketAddr};

use crate::error::AddressParseError;

/// Port token netstat prints for an unbound (any) port.
const WILDCARD_PORT: &str = "*";

/// Parse a netstat address column (`HOST:PORT`) into a socket address.
///
/// IPv6 hosts are printed without brackets, so a token with more than one
/// colon is split at the *last* colon: `::1:8080` is host `::1`, port 8080.
/// A `*` port maps to 0.
pub fn parse_address(token: &str) -> Result<SocketAddr, AddressParseError> {
    let (host, port) = split_host_port(token)?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let ip: IpAddr = host
        .parse()
        .map_err(|_| AddressParseError::InvalidIp(token.to_string()))?;

    let port: u16 = if port == WILDCARD_PORT {
        0
    } else {
        port.parse()
            .map_err(|_| AddressParseError::InvalidPort(token.to_string()))?
    };

    Ok(SocketAddr::new(ip, port))
}

fn split_host_port(token: &str) -> Result<(&str, &str), AddressParseError> {
    let split = if token.matches(':').count() > 1 {
        token.rsplit_once(':')
    } else {
        token.split_once(':')
    };
    split.ok_or_else(|| AddressParseError::MissingPort(token.to_string()))
}
