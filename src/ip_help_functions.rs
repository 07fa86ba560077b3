//! This module contains some help functions regarding the IP address
//!
//! Functions
//! - [ip2identity]: Generates the identity of the node based on the IP-address.

use std::net::IpAddr;


/// Prefix of every identity derived from an IP address
pub const IDENTITY_PREFIX: &str = "peer-";

/// Builds your identity based on `ip`
///
/// ## Example
/// ```
/// use elevfleet::ip_help_functions::ip2identity;
/// use std::net::IpAddr;
/// use std::str::FromStr;
///
/// let ip = IpAddr::from_str("10.100.23.24").unwrap();
/// assert_eq!(ip2identity(ip), "peer-10.100.23.24");
/// ```
pub fn ip2identity(ip: IpAddr) -> String {
    format!("{}{}", IDENTITY_PREFIX, ip)
}
