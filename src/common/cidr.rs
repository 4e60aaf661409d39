use std::net::{Ipv4Addr, Ipv6Addr};

/// Split an optional `/prefix` suffix off a network literal.
///
/// The prefix must be plain ASCII digits no larger than `max`. Returns `None`
/// for an empty or malformed prefix.
pub fn split_prefix(raw: &str, max: u8) -> Option<(&str, Option<u8>)> {
    let Some((addr, prefix)) = raw.rsplit_once('/') else {
        return Some((raw, None));
    };
    if prefix.is_empty() || prefix.len() > 3 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let len: u8 = prefix.parse().ok()?;
    if len > max {
        return None;
    }
    Some((addr, Some(len)))
}

/// Parse `addr[/prefix]` with prefix 0..=32.
pub fn parse_ip4_network(raw: &str) -> Option<(Ipv4Addr, Option<u8>)> {
    let (addr, prefix) = split_prefix(raw, 32)?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    Some((addr, prefix))
}

/// Parse `addr[/prefix]` with prefix 0..=128.
pub fn parse_ip6_network(raw: &str) -> Option<(Ipv6Addr, Option<u8>)> {
    let (addr, prefix) = split_prefix(raw, 128)?;
    let addr: Ipv6Addr = addr.parse().ok()?;
    Some((addr, prefix))
}

/// Render a network in canonical form; the prefix is kept only if it was given.
pub fn format_network(addr: impl std::fmt::Display, prefix: Option<u8>) -> String {
    match prefix {
        Some(len) => format!("{addr}/{len}"),
        None => addr.to_string(),
    }
}
