//! SSRF address guard.
//!
//! Every fetch target is vetted here before a connection is opened. Literal
//! IPs are checked directly; hostnames are resolved and **every** returned
//! address must pass, so a name that resolves to one public and one private
//! address is rejected outright. The vetted addresses are handed back to
//! the caller so the HTTP client can be pinned to exactly those addresses.

use async_trait::async_trait;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use crate::error::{FetchErrorKind, Result, WebError};

/// A CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpBlock {
    network: IpAddr,
    prefix: u8,
}

impl IpBlock {
    /// IPv4 block. `prefix` is clamped to 32.
    pub const fn v4(octets: [u8; 4], prefix: u8) -> Self {
        Self {
            network: IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])),
            prefix: if prefix > 32 { 32 } else { prefix },
        }
    }

    /// IPv6 block. `prefix` is clamped to 128.
    pub const fn v6(network: Ipv6Addr, prefix: u8) -> Self {
        Self {
            network: IpAddr::V6(network),
            prefix: if prefix > 128 { 128 } else { prefix },
        }
    }

    /// Whether `ip` falls inside this block. Families never cross-match.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                prefix_eq(u32::from(net).into(), u32::from(ip).into(), 32, self.prefix)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                prefix_eq(u128::from(net), u128::from(ip), 128, self.prefix)
            }
            _ => false,
        }
    }
}

impl fmt::Display for IpBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

fn prefix_eq(a: u128, b: u128, bits: u32, prefix: u8) -> bool {
    if prefix == 0 {
        return true;
    }
    let shift = bits - u32::from(prefix);
    (a >> shift) == (b >> shift)
}

/// Loopback, RFC 1918, link-local, IPv6 loopback and unique-local ranges.
pub const BLOCKED_RANGES: [IpBlock; 7] = [
    IpBlock::v4([127, 0, 0, 0], 8),
    IpBlock::v4([10, 0, 0, 0], 8),
    IpBlock::v4([172, 16, 0, 0], 12),
    IpBlock::v4([192, 168, 0, 0], 16),
    IpBlock::v4([169, 254, 0, 0], 16),
    IpBlock::v6(Ipv6Addr::LOCALHOST, 128),
    IpBlock::v6(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
];

/// Hostname resolution seam.
///
/// The default [`SystemResolver`] asks the host environment; tests supply a
/// fixed table.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `host` to all of its addresses, both families.
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system via [`tokio::net::lookup_host`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        Ok(ips)
    }
}

/// Vets fetch targets against a block-list before connecting.
#[derive(Clone)]
pub struct AddressGuard {
    blocked: Vec<IpBlock>,
    resolver: Arc<dyn Resolver>,
}

impl Default for AddressGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AddressGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressGuard")
            .field("blocked", &self.blocked)
            .finish_non_exhaustive()
    }
}

impl AddressGuard {
    /// Guard with [`BLOCKED_RANGES`] and the system resolver.
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(SystemResolver))
    }

    /// Guard with [`BLOCKED_RANGES`] and a custom resolver.
    pub fn with_resolver(resolver: Arc<dyn Resolver>) -> Self {
        Self::with_blocklist(BLOCKED_RANGES.to_vec(), resolver)
    }

    /// Guard with an explicit block-list.
    pub fn with_blocklist(blocked: Vec<IpBlock>, resolver: Arc<dyn Resolver>) -> Self {
        Self { blocked, resolver }
    }

    /// Returns the first block containing `ip`, if any.
    ///
    /// IPv4-mapped IPv6 addresses are checked in their IPv4 form.
    pub fn blocked_range(&self, ip: IpAddr) -> Option<IpBlock> {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
            v4 => v4,
        };
        self.blocked.iter().copied().find(|block| block.contains(ip))
    }

    /// Fails with [`WebError::BlockedAddress`] if `ip` is blocked.
    pub fn check_ip(&self, ip: IpAddr) -> Result<()> {
        match self.blocked_range(ip) {
            Some(block) => Err(WebError::BlockedAddress(format!("{ip} is in {block}"))),
            None => Ok(()),
        }
    }

    /// Vet a hostname or literal IP and return the addresses that passed.
    ///
    /// IPv6 literals may be bracketed as they appear in URLs. For a hostname
    /// the lookup fails if **any** resolved address is blocked.
    pub async fn vet(&self, host: &str) -> Result<Vec<IpAddr>> {
        let literal = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = literal.parse::<IpAddr>() {
            self.check_ip(ip)?;
            return Ok(vec![ip]);
        }

        let addrs = self.resolver.resolve(host).await.map_err(|e| {
            WebError::fetch(FetchErrorKind::Dns, format!("failed to resolve {host}: {e}"))
        })?;
        if addrs.is_empty() {
            return Err(WebError::fetch(
                FetchErrorKind::Dns,
                format!("{host} resolved to no addresses"),
            ));
        }

        for ip in &addrs {
            if let Some(block) = self.blocked_range(*ip) {
                tracing::warn!(host, %ip, %block, "blocked resolved address");
                return Err(WebError::BlockedAddress(format!(
                    "{host} resolves to {ip} ({block})"
                )));
            }
        }
        Ok(addrs)
    }
}

/// Socket addresses for pinning a vetted host into an HTTP client.
///
/// Port 0 lets the client use the URL's port or the scheme default.
pub(crate) fn pinned_socket_addrs(ips: &[IpAddr]) -> Vec<SocketAddr> {
    ips.iter().map(|ip| SocketAddr::new(*ip, 0)).collect()
}
