//! SPF mechanism and directive types (RFC 7208 Section 5).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Qualifier prefix on a directive.
///
/// A bare directive in record text means Pass; a generated record's terminal
/// `all` defaults to SoftFail, which is what `Default` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    Pass,     // +
    Fail,     // -
    #[default]
    SoftFail, // ~
    Neutral,  // ?
}

impl Qualifier {
    /// Parse a single-char qualifier prefix. Returns (Qualifier, remaining str).
    /// If no qualifier prefix, defaults to Pass.
    pub fn parse_prefix(s: &str) -> (Qualifier, &str) {
        match s.as_bytes().first() {
            Some(b'+') => (Qualifier::Pass, &s[1..]),
            Some(b'-') => (Qualifier::Fail, &s[1..]),
            Some(b'~') => (Qualifier::SoftFail, &s[1..]),
            Some(b'?') => (Qualifier::Neutral, &s[1..]),
            _ => (Qualifier::Pass, s),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Pass => write!(f, "+"),
            Qualifier::Fail => write!(f, "-"),
            Qualifier::SoftFail => write!(f, "~"),
            Qualifier::Neutral => write!(f, "?"),
        }
    }
}

impl FromStr for Qualifier {
    type Err = String;

    /// Accepts names (`softfail`), symbols (`~`) or whole terminals (`~all`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_suffix("all").unwrap_or(&lower);
        match name {
            "pass" | "+" => Ok(Qualifier::Pass),
            "fail" | "-" => Ok(Qualifier::Fail),
            "softfail" | "soft-fail" | "~" => Ok(Qualifier::SoftFail),
            "neutral" | "?" => Ok(Qualifier::Neutral),
            _ => Err(format!(
                "unknown qualifier '{s}' (expected fail, softfail, neutral or pass)"
            )),
        }
    }
}

/// Prefix lengths applied to the addresses an `a` or `mx` lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualCidr {
    pub v4: u8,
    pub v6: u8,
}

impl DualCidr {
    /// Full-length prefixes, written as no suffix at all.
    pub fn is_host(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for DualCidr {
    fn default() -> Self {
        Self { v4: 32, v6: 128 }
    }
}

impl fmt::Display for DualCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.v4 != 32 {
            write!(f, "/{}", self.v4)?;
        }
        if self.v6 != 128 {
            write!(f, "//{}", self.v6)?;
        }
        Ok(())
    }
}

/// A normalized mechanism token. Values are already validated and canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mechanism {
    /// `all`
    All,
    /// `include:<domain-spec>`
    Include(String),
    /// `a[:<domain-spec>][/cidr4][//cidr6]`; `None` means the record's own domain.
    A {
        domain: Option<String>,
        cidr: DualCidr,
    },
    /// `mx[:<domain-spec>][/cidr4][//cidr6]`; `None` means the record's own domain.
    Mx {
        domain: Option<String>,
        cidr: DualCidr,
    },
    /// `ptr[:<domain-spec>]`. Only produced when parsing existing records.
    Ptr(Option<String>),
    /// `ip4:<ip4-network>[/cidr]`
    Ip4(String),
    /// `ip6:<ip6-network>[/cidr]`
    Ip6(String),
    /// `exists:<domain-spec>`
    Exists(String),
}

impl Mechanism {
    /// `a` without a CIDR suffix.
    pub fn a(domain: Option<String>) -> Self {
        Mechanism::A { domain, cidr: DualCidr::default() }
    }

    /// `mx` without a CIDR suffix.
    pub fn mx(domain: Option<String>) -> Self {
        Mechanism::Mx { domain, cidr: DualCidr::default() }
    }

    /// DNS lookups this mechanism costs at evaluation time (RFC 7208 Section 4.6.4).
    pub fn lookup_cost(&self) -> usize {
        match self {
            Mechanism::Include(_)
            | Mechanism::A { .. }
            | Mechanism::Mx { .. }
            | Mechanism::Ptr(_)
            | Mechanism::Exists(_) => 1,
            Mechanism::All | Mechanism::Ip4(_) | Mechanism::Ip6(_) => 0,
        }
    }
}

/// A directive = qualifier + mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub qualifier: Qualifier,
    pub mechanism: Mechanism,
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mechanism::All => write!(f, "all"),
            Mechanism::Include(d) => write!(f, "include:{d}"),
            Mechanism::A { domain, cidr } => {
                write!(f, "a")?;
                if let Some(d) = domain {
                    write!(f, ":{d}")?;
                }
                write!(f, "{cidr}")
            }
            Mechanism::Mx { domain, cidr } => {
                write!(f, "mx")?;
                if let Some(d) = domain {
                    write!(f, ":{d}")?;
                }
                write!(f, "{cidr}")
            }
            Mechanism::Ptr(d) => {
                write!(f, "ptr")?;
                if let Some(d) = d {
                    write!(f, ":{d}")?;
                }
                Ok(())
            }
            Mechanism::Ip4(net) => write!(f, "ip4:{net}"),
            Mechanism::Ip6(net) => write!(f, "ip6:{net}"),
            Mechanism::Exists(d) => write!(f, "exists:{d}"),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only print qualifier if not Pass (the default)
        if self.qualifier != Qualifier::Pass {
            write!(f, "{}", self.qualifier)?;
        }
        write!(f, "{}", self.mechanism)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Qualifier ----

    #[test]
    fn qualifier_parse_explicit() {
        assert_eq!(Qualifier::parse_prefix("+all"), (Qualifier::Pass, "all"));
        assert_eq!(Qualifier::parse_prefix("-all"), (Qualifier::Fail, "all"));
        assert_eq!(
            Qualifier::parse_prefix("~all"),
            (Qualifier::SoftFail, "all")
        );
        assert_eq!(
            Qualifier::parse_prefix("?all"),
            (Qualifier::Neutral, "all")
        );
    }

    #[test]
    fn qualifier_parse_default() {
        assert_eq!(Qualifier::parse_prefix("all"), (Qualifier::Pass, "all"));
        assert_eq!(
            Qualifier::parse_prefix("include:x"),
            (Qualifier::Pass, "include:x")
        );
    }

    #[test]
    fn qualifier_from_str() {
        assert_eq!("softfail".parse::<Qualifier>().unwrap(), Qualifier::SoftFail);
        assert_eq!("-all".parse::<Qualifier>().unwrap(), Qualifier::Fail);
        assert_eq!("?".parse::<Qualifier>().unwrap(), Qualifier::Neutral);
        assert_eq!("PASS".parse::<Qualifier>().unwrap(), Qualifier::Pass);
        assert!("reject".parse::<Qualifier>().is_err());
    }

    #[test]
    fn qualifier_default_softfail() {
        assert_eq!(Qualifier::default(), Qualifier::SoftFail);
    }

    // ---- Display ----

    #[test]
    fn display_mechanisms() {
        assert_eq!(Mechanism::Include("_spf.google.com".into()).to_string(), "include:_spf.google.com");
        assert_eq!(Mechanism::a(None).to_string(), "a");
        assert_eq!(Mechanism::mx(Some("easydmarc.com".into())).to_string(), "mx:easydmarc.com");
        assert_eq!(Mechanism::Ip4("10.0.0.0/20".into()).to_string(), "ip4:10.0.0.0/20");
        assert_eq!(Mechanism::Ip6("2001:db8::1".into()).to_string(), "ip6:2001:db8::1");
        assert_eq!(Mechanism::Exists("%i._spf.example.com".into()).to_string(), "exists:%i._spf.example.com");
    }

    #[test]
    fn display_dual_cidr() {
        let a = |domain: Option<&str>, v4, v6| Mechanism::A {
            domain: domain.map(str::to_string),
            cidr: DualCidr { v4, v6 },
        };
        assert_eq!(a(None, 24, 128).to_string(), "a/24");
        assert_eq!(a(None, 32, 64).to_string(), "a//64");
        assert_eq!(a(Some("mail.example.com"), 24, 64).to_string(), "a:mail.example.com/24//64");
        assert_eq!(
            Mechanism::Mx { domain: Some("host".into()), cidr: DualCidr { v4: 32, v6: 64 } }.to_string(),
            "mx:host//64"
        );
        assert!(DualCidr::default().is_host());
    }

    #[test]
    fn display_directive_qualifiers() {
        let all = |qualifier| Directive { qualifier, mechanism: Mechanism::All };
        assert_eq!(all(Qualifier::Pass).to_string(), "all");
        assert_eq!(all(Qualifier::SoftFail).to_string(), "~all");
        assert_eq!(all(Qualifier::Fail).to_string(), "-all");
    }

    #[test]
    fn lookup_costs() {
        assert_eq!(Mechanism::Include("x.com".into()).lookup_cost(), 1);
        assert_eq!(Mechanism::a(None).lookup_cost(), 1);
        assert_eq!(Mechanism::Ip4("1.2.3.4".into()).lookup_cost(), 0);
        assert_eq!(Mechanism::All.lookup_cost(), 0);
    }
}
