//! Parsing existing SPF records.
//!
//! Used to inspect a published record and to load it back into a
//! [`RecordRequest`] for editing.

use tracing::warn;

use super::mechanism::{Directive, DualCidr, Mechanism, Qualifier};
use super::types::{MechanismInput, MechanismKind, RecordRequest};
use crate::common::cidr;

/// Longest character-string a TXT record may carry (RFC 1035 Section 3.3).
pub const TXT_CHUNK_LEN: usize = 255;

/// Error type for SPF record parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpfParseError {
    #[error("invalid SPF version: expected 'v=spf1'")]
    InvalidVersion,
    #[error("unknown mechanism: {0}")]
    UnknownMechanism(String),
    #[error("invalid mechanism argument: {0}")]
    InvalidArgument(String),
    #[error("duplicate modifier: {0}")]
    DuplicateModifier(String),
    #[error("missing required argument for {0}")]
    MissingArgument(String),
    #[error("invalid CIDR prefix: {0}")]
    InvalidCidr(String),
}

/// Parsed SPF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfRecord {
    pub directives: Vec<Directive>,
    pub redirect: Option<String>,
    pub explanation: Option<String>,
}

impl SpfRecord {
    /// Parse an SPF TXT record. The version tag is matched case-insensitively.
    pub fn parse(txt: &str) -> Result<Self, SpfParseError> {
        let trimmed = txt.trim();
        let mut terms = trimmed.split_whitespace();
        match terms.next() {
            Some(v) if v.eq_ignore_ascii_case("v=spf1") => {}
            _ => return Err(SpfParseError::InvalidVersion),
        }

        let mut directives = Vec::new();
        let mut redirect: Option<String> = None;
        let mut explanation: Option<String> = None;

        for term in terms {
            // Check if this is a modifier (name=value)
            if let Some((name, value)) = try_parse_modifier(term) {
                match name.to_ascii_lowercase().as_str() {
                    "redirect" => {
                        if redirect.is_some() {
                            return Err(SpfParseError::DuplicateModifier("redirect".into()));
                        }
                        redirect = Some(required("redirect", Some(value))?.to_string());
                    }
                    "exp" => {
                        if explanation.is_some() {
                            return Err(SpfParseError::DuplicateModifier("exp".into()));
                        }
                        explanation = Some(value.to_string());
                    }
                    // Unknown modifiers are ignored (RFC 7208 Section 6)
                    _ => {}
                }
                continue;
            }

            let (qualifier, rest) = Qualifier::parse_prefix(term);
            let mechanism = parse_mechanism(rest)?;
            directives.push(Directive { qualifier, mechanism });
        }

        Ok(SpfRecord {
            directives,
            redirect,
            explanation,
        })
    }

    /// DNS-querying terms in the record (RFC 7208 Section 4.6.4).
    pub fn lookup_count(&self) -> usize {
        let mechanisms: usize = self
            .directives
            .iter()
            .map(|d| d.mechanism.lookup_cost())
            .sum();
        mechanisms + usize::from(self.redirect.is_some())
    }

    /// Qualifier of the `all` directive, if the record has one.
    pub fn all_qualifier(&self) -> Option<Qualifier> {
        self.directives
            .iter()
            .find(|d| d.mechanism == Mechanism::All)
            .map(|d| d.qualifier)
    }

    /// Load the record into a request for `domain`.
    ///
    /// Bare `a`/`mx` become `domain`. Directives the generator cannot express
    /// (`ptr`, `a`/`mx` with a CIDR suffix, and any non-`all` directive with an
    /// explicit non-pass qualifier) are skipped with a warning. A record without `all` gets the
    /// Neutral terminal, which is what evaluation falls back to anyway.
    pub fn to_request(&self, domain: &str) -> RecordRequest {
        let mut request = RecordRequest::new(domain)
            .with_qualifier(self.all_qualifier().unwrap_or(Qualifier::Neutral));
        let mut grouped: Vec<(MechanismKind, Vec<String>)> = Vec::new();

        for directive in &self.directives {
            if directive.mechanism == Mechanism::All {
                continue;
            }
            if directive.qualifier != Qualifier::Pass {
                warn!(term = %directive, "qualified mechanism cannot be represented; skipped");
                continue;
            }
            let (kind, value) = match &directive.mechanism {
                Mechanism::Include(d) => (MechanismKind::Include, d.clone()),
                Mechanism::Ip4(net) => (MechanismKind::Ip4, net.clone()),
                Mechanism::Ip6(net) => (MechanismKind::Ip6, net.clone()),
                Mechanism::A { domain: d, cidr } if cidr.is_host() => {
                    (MechanismKind::A, d.clone().unwrap_or_else(|| domain.to_string()))
                }
                Mechanism::Mx { domain: d, cidr } if cidr.is_host() => {
                    (MechanismKind::Mx, d.clone().unwrap_or_else(|| domain.to_string()))
                }
                Mechanism::Exists(d) => (MechanismKind::Exists, d.clone()),
                Mechanism::A { .. } | Mechanism::Mx { .. } | Mechanism::Ptr(_) | Mechanism::All => {
                    warn!(term = %directive, "mechanism not supported by the generator; skipped");
                    continue;
                }
            };
            match grouped.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, values)) => values.push(value),
                None => grouped.push((kind, vec![value])),
            }
        }

        for (kind, values) in grouped {
            request.set_mechanism(MechanismInput::new(kind, values));
        }
        if let Some(target) = &self.redirect {
            request = request.with_redirect(target.clone());
        }
        request
    }
}

/// Split a record into TXT character-strings of at most 255 octets.
pub fn txt_chunks(record: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in record.chars() {
        if current.len() + c.len_utf8() > TXT_CHUNK_LEN {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Try to parse a term as a modifier (name=value).
/// A modifier name starts with a letter and holds only alphanumerics, `-`, `_`, `.`.
fn try_parse_modifier(term: &str) -> Option<(&str, &str)> {
    let (name, value) = term.split_once('=')?;
    let mut chars = name.chars();
    if !chars.next()?.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        return None;
    }
    Some((name, value))
}

/// Split "mechanism:argument" or "mechanism/cidr".
fn split_mechanism_arg(s: &str) -> (&str, Option<&str>) {
    if let Some(colon_pos) = s.find(':') {
        (&s[..colon_pos], Some(&s[colon_pos + 1..]))
    } else if let Some(slash_pos) = s.find('/') {
        // a/24 or mx//64; keep the slash in the argument
        (&s[..slash_pos], Some(&s[slash_pos..]))
    } else {
        (s, None)
    }
}

fn required<'a>(name: &str, arg: Option<&'a str>) -> Result<&'a str, SpfParseError> {
    arg.filter(|a| !a.is_empty())
        .ok_or_else(|| SpfParseError::MissingArgument(name.to_string()))
}

/// Parse a mechanism without its qualifier prefix.
fn parse_mechanism(term: &str) -> Result<Mechanism, SpfParseError> {
    let (name, arg) = split_mechanism_arg(term);
    let name_lower = name.to_ascii_lowercase();

    match name_lower.as_str() {
        "all" => {
            if arg.is_some() {
                return Err(SpfParseError::InvalidArgument(
                    "all mechanism takes no arguments".into(),
                ));
            }
            Ok(Mechanism::All)
        }
        "include" => Ok(Mechanism::Include(required("include", arg)?.to_string())),
        "exists" => Ok(Mechanism::Exists(required("exists", arg)?.to_string())),
        "a" => {
            let (domain, cidr) = domain_with_cidr(arg)?;
            Ok(Mechanism::A { domain, cidr })
        }
        "mx" => {
            let (domain, cidr) = domain_with_cidr(arg)?;
            Ok(Mechanism::Mx { domain, cidr })
        }
        "ptr" => Ok(Mechanism::Ptr(optional_spec(arg))),
        "ip4" => {
            let raw = required("ip4", arg)?;
            check_prefix(raw, 32)?;
            let (addr, prefix) = cidr::parse_ip4_network(raw)
                .ok_or_else(|| SpfParseError::InvalidArgument(format!("invalid IPv4: {raw}")))?;
            Ok(Mechanism::Ip4(cidr::format_network(addr, prefix)))
        }
        "ip6" => {
            let raw = required("ip6", arg)?;
            check_prefix(raw, 128)?;
            let (addr, prefix) = cidr::parse_ip6_network(raw)
                .ok_or_else(|| SpfParseError::InvalidArgument(format!("invalid IPv6: {raw}")))?;
            Ok(Mechanism::Ip6(cidr::format_network(addr, prefix)))
        }
        _ => Err(SpfParseError::UnknownMechanism(name_lower)),
    }
}

fn optional_spec(arg: Option<&str>) -> Option<String> {
    arg.filter(|a| !a.is_empty()).map(str::to_string)
}

/// Split `[domain][/cidr4][//cidr6]` into the domain-spec and its prefixes.
/// The `//cidr6` part always comes last.
fn domain_with_cidr(arg: Option<&str>) -> Result<(Option<String>, DualCidr), SpfParseError> {
    let mut cidr = DualCidr::default();
    let mut rest = arg.unwrap_or("");

    if let Some(pos) = rest.find("//") {
        cidr.v6 = cidr_len(&rest[pos + 2..], 128)?;
        rest = &rest[..pos];
    }
    if let Some(pos) = rest.rfind('/') {
        cidr.v4 = cidr_len(&rest[pos + 1..], 32)?;
        rest = &rest[..pos];
    }
    Ok((optional_spec(Some(rest)), cidr))
}

fn cidr_len(raw: &str, max: u8) -> Result<u8, SpfParseError> {
    let valid = !raw.is_empty() && raw.len() <= 3 && raw.bytes().all(|b| b.is_ascii_digit());
    raw.parse::<u8>()
        .ok()
        .filter(|len| valid && *len <= max)
        .ok_or_else(|| SpfParseError::InvalidCidr(raw.to_string()))
}

fn check_prefix(raw: &str, max: u8) -> Result<(), SpfParseError> {
    if raw.contains('/') && cidr::split_prefix(raw, max).is_none() {
        return Err(SpfParseError::InvalidCidr(raw.to_string()));
    }
    Ok(())
}
