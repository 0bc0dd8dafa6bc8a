//! "Appropriate network" policy for check-ins.
//!
//! The client address is taken from proxy headers first, then from the
//! socket peer, and must start with the configured IPv4 octet prefix
//! (e.g. `192.168`).

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::fmt;
use thiserror::Error;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Client IP headers in order of precedence
const CLIENT_IP_HEADERS: [&str; 3] = ["x-real-ip", "x-forwarded-for", "cf-connecting-ip"];

/// Leading IPv4 octets an address must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPrefix(Vec<u8>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected 1-4 dotted IPv4 octets")]
pub struct InvalidPrefix;

impl FromStr for NetworkPrefix {
    type Err = InvalidPrefix;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets = s
            .trim()
            .trim_end_matches('.')
            .split('.')
            .map(|part| part.trim().parse::<u8>().map_err(|_| InvalidPrefix))
            .collect::<Result<Vec<_>, _>>()?;
        if octets.is_empty() || octets.len() > 4 {
            return Err(InvalidPrefix);
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u8::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl NetworkPrefix {
    /// True if `ip` is an IPv4 (or IPv4-mapped IPv6) address inside the prefix
    pub fn contains(&self, ip: IpAddr) -> bool {
        let v4 = match ip {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => v4,
                None => return false,
            },
        };
        v4.octets().starts_with(&self.0)
    }
}

/// Check-in network policy
#[derive(Debug, Clone, Default)]
pub struct NetworkPolicy {
    prefix: Option<NetworkPrefix>,
}

impl NetworkPolicy {
    pub fn new(prefix: Option<NetworkPrefix>) -> Self {
        if prefix.is_none() {
            tracing::warn!("No allowed network configured; check-ins accepted from any address");
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> Option<&NetworkPrefix> {
        self.prefix.as_ref()
    }

    pub fn permits(&self, client: Option<IpAddr>) -> bool {
        match (&self.prefix, client) {
            (None, _) => true,
            (Some(prefix), Some(ip)) => prefix.contains(ip),
            (Some(_), None) => false,
        }
    }
}

/// Resolve the client address: real-IP header, forwarded-for, CDN header,
/// then the raw connection address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    CLIENT_IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .find_map(parse_header_ip)
        .or_else(|| peer.map(|addr| addr.ip()))
}

fn parse_header_ip(value: &str) -> Option<IpAddr> {
    let first = value.split(',').next()?.trim();
    first
        .parse::<IpAddr>()
        .ok()
        .or_else(|| first.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Extractor for the resolved client address (None if nothing usable)
pub struct ClientIp(pub Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(client_ip(&parts.headers, peer)))
    }
}
