//! Per-mechanism value validators.
//!
//! Every validator is a pure function from one raw value to its normalized
//! form (without the `kind:` prefix) or an [`ErrorKind`]. They are looked up
//! by [`MechanismKind`] through [`VALIDATORS`].

use tracing::debug;

use super::macros::{self, MacroStyle};
use super::types::{ErrorKind, MechanismKind, ValidationResult};
use crate::common::{cidr, domain};

/// Settings that affect how a valid value is normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationContext {
    pub macro_style: MacroStyle,
}

pub type Validator = fn(&str, &ValidationContext) -> Result<String, ErrorKind>;

/// Validator table. `All` takes no value and has no entry.
pub static VALIDATORS: [(MechanismKind, Validator); 7] = [
    (MechanismKind::Include, validate_domain),
    (MechanismKind::Ip4, validate_ip4),
    (MechanismKind::Ip6, validate_ip6),
    (MechanismKind::A, validate_domain),
    (MechanismKind::Mx, validate_domain),
    (MechanismKind::Exists, validate_exists),
    (MechanismKind::Redirect, validate_domain),
];

pub fn validator_for(kind: MechanismKind) -> Option<Validator> {
    VALIDATORS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, v)| *v)
}

/// Validate one raw value with default normalization settings.
pub fn validate(kind: MechanismKind, raw: &str) -> ValidationResult {
    validate_with(kind, raw, &ValidationContext::default())
}

/// Validate one raw value. A value given for `All` is reported as `InvalidDomain`.
pub fn validate_with(kind: MechanismKind, raw: &str, ctx: &ValidationContext) -> ValidationResult {
    let result = match validator_for(kind) {
        Some(validator) => validator(raw.trim(), ctx),
        None => Err(ErrorKind::InvalidDomain),
    };
    if let Err(error) = &result {
        debug!(mechanism = %kind, value = raw, %error, "rejected value");
    }
    result.into()
}

fn validate_ip4(raw: &str, _ctx: &ValidationContext) -> Result<String, ErrorKind> {
    let (addr, prefix) = cidr::parse_ip4_network(raw).ok_or(ErrorKind::InvalidIPv4)?;
    Ok(cidr::format_network(addr, prefix))
}

fn validate_ip6(raw: &str, _ctx: &ValidationContext) -> Result<String, ErrorKind> {
    let (addr, prefix) = cidr::parse_ip6_network(raw).ok_or(ErrorKind::InvalidIPv6)?;
    Ok(cidr::format_network(addr, prefix))
}

fn validate_domain(raw: &str, _ctx: &ValidationContext) -> Result<String, ErrorKind> {
    if !domain::is_valid_domain(raw) {
        return Err(ErrorKind::InvalidDomain);
    }
    Ok(domain::normalize(raw))
}

/// Domain-spec with macros. Literal text keeps its case; only macro
/// spelling is rewritten according to the context's [`MacroStyle`].
fn validate_exists(raw: &str, ctx: &ValidationContext) -> Result<String, ErrorKind> {
    let pieces = macros::parse(raw).map_err(|_| ErrorKind::InvalidMacro)?;
    let shape = macros::placeholder(&pieces);
    let well_formed = if macros::has_macros(&pieces) {
        domain::check_labels(&shape)
    } else {
        domain::is_valid_domain(&shape)
    };
    if !well_formed {
        return Err(ErrorKind::InvalidDomain);
    }
    Ok(macros::render(&pieces, ctx.macro_style))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(kind: MechanismKind, raw: &str) -> String {
        match validate(kind, raw) {
            ValidationResult::Valid(v) => v,
            ValidationResult::Invalid(e) => panic!("{raw} rejected: {e}"),
        }
    }

    fn invalid(kind: MechanismKind, raw: &str) -> ErrorKind {
        match validate(kind, raw) {
            ValidationResult::Valid(v) => panic!("{raw} accepted as {v}"),
            ValidationResult::Invalid(e) => e,
        }
    }

    #[test]
    fn table_covers_every_input_kind() {
        for kind in MechanismKind::BUILD_ORDER {
            assert!(validator_for(kind).is_some(), "{kind}");
        }
        assert!(validator_for(MechanismKind::Redirect).is_some());
        assert!(validator_for(MechanismKind::All).is_none());
    }

    // ---- ip4 ----

    #[test]
    fn ip4_accepts_address_and_network() {
        assert_eq!(valid(MechanismKind::Ip4, "192.168.1.1"), "192.168.1.1");
        assert_eq!(valid(MechanismKind::Ip4, "10.0.0.1/20"), "10.0.0.1/20");
        assert_eq!(valid(MechanismKind::Ip4, " 10.10.10.10 "), "10.10.10.10");
    }

    #[test]
    fn ip4_rejects_bad_values() {
        assert_eq!(invalid(MechanismKind::Ip4, "300.1.1.1"), ErrorKind::InvalidIPv4);
        assert_eq!(invalid(MechanismKind::Ip4, "1.2.3"), ErrorKind::InvalidIPv4);
        assert_eq!(invalid(MechanismKind::Ip4, "1.2.3.4/33"), ErrorKind::InvalidIPv4);
        assert_eq!(invalid(MechanismKind::Ip4, "2001:db8::1"), ErrorKind::InvalidIPv4);
        assert_eq!(invalid(MechanismKind::Ip4, ""), ErrorKind::InvalidIPv4);
    }

    // ---- ip6 ----

    #[test]
    fn ip6_accepts_and_canonicalizes() {
        assert_eq!(valid(MechanismKind::Ip6, "2001:db8::1"), "2001:db8::1");
        assert_eq!(valid(MechanismKind::Ip6, "2001:DB8:0:0:0:0:0:1"), "2001:db8::1");
        assert_eq!(valid(MechanismKind::Ip6, "2404:6800:4000::/36"), "2404:6800:4000::/36");
        assert_eq!(valid(MechanismKind::Ip6, "2001:db8:0:1:1:1:1:1"), "2001:db8:0:1:1:1:1:1");
    }

    #[test]
    fn ip6_rejects_bad_values() {
        assert_eq!(invalid(MechanismKind::Ip6, "12345::678"), ErrorKind::InvalidIPv6);
        assert_eq!(invalid(MechanismKind::Ip6, "2001::db8::1"), ErrorKind::InvalidIPv6);
        assert_eq!(invalid(MechanismKind::Ip6, "::1/129"), ErrorKind::InvalidIPv6);
        assert_eq!(invalid(MechanismKind::Ip6, "192.168.1.1"), ErrorKind::InvalidIPv6);
    }

    // ---- domains ----

    #[test]
    fn domain_kinds_share_rules() {
        for kind in [
            MechanismKind::Include,
            MechanismKind::A,
            MechanismKind::Mx,
            MechanismKind::Redirect,
        ] {
            assert_eq!(valid(kind, "_spf.Google.com."), "_spf.google.com");
            assert_eq!(invalid(kind, "-bad.example.com"), ErrorKind::InvalidDomain);
            assert_eq!(invalid(kind, "bad..example.com"), ErrorKind::InvalidDomain);
            assert_eq!(invalid(kind, "localhost"), ErrorKind::InvalidDomain);
        }
    }

    // ---- exists ----

    #[test]
    fn exists_collapses_simple_macros() {
        assert_eq!(
            valid(MechanismKind::Exists, "%{i}._spf.mta.salesforce.com"),
            "%i._spf.mta.salesforce.com"
        );
    }

    #[test]
    fn exists_braced_style() {
        let ctx = ValidationContext { macro_style: MacroStyle::Braced };
        assert_eq!(
            validate_with(MechanismKind::Exists, "%i._spf.example.com", &ctx),
            ValidationResult::Valid("%{i}._spf.example.com".into())
        );
    }

    #[test]
    fn exists_plain_domain() {
        assert_eq!(valid(MechanismKind::Exists, "Check.Example.com"), "Check.Example.com");
    }

    #[test]
    fn exists_trailing_macro() {
        assert_eq!(valid(MechanismKind::Exists, "%{ir}.%{v}._spf.%{d2}"), "%{ir}.%v._spf.%{d2}");
    }

    #[test]
    fn exists_rejects_bad_macros() {
        assert_eq!(invalid(MechanismKind::Exists, "%{x}.example.com"), ErrorKind::InvalidMacro);
        assert_eq!(invalid(MechanismKind::Exists, "%{i._spf.example.com"), ErrorKind::InvalidMacro);
        assert_eq!(invalid(MechanismKind::Exists, "i}.example.com"), ErrorKind::InvalidMacro);
        assert_eq!(invalid(MechanismKind::Exists, "%{c}.example.com"), ErrorKind::InvalidMacro);
    }

    #[test]
    fn exists_rejects_bad_literals() {
        assert_eq!(invalid(MechanismKind::Exists, "%{i}..example.com"), ErrorKind::InvalidDomain);
        assert_eq!(invalid(MechanismKind::Exists, "%{i}.exa mple.com"), ErrorKind::InvalidDomain);
        assert_eq!(invalid(MechanismKind::Exists, "localhost"), ErrorKind::InvalidDomain);
    }

    #[test]
    fn all_takes_no_value() {
        assert_eq!(invalid(MechanismKind::All, "anything"), ErrorKind::InvalidDomain);
    }
}
