//! Turns validated values into mechanism tokens.

use tracing::debug;

use super::mechanism::Mechanism;
use super::types::MechanismKind;
use crate::common::domain;

/// Build the tokens for one mechanism kind from its validated values.
///
/// Typed order is kept and exact duplicates are dropped (first one wins).
/// `a`/`mx` values naming `own_domain` collapse to the bare mechanism.
/// `Redirect` and `All` yield no tokens here.
pub fn normalize(kind: MechanismKind, values: &[String], own_domain: &str) -> Vec<Mechanism> {
    let mut tokens: Vec<Mechanism> = Vec::with_capacity(values.len());
    for value in values {
        let Some(token) = to_mechanism(kind, value.trim(), own_domain) else {
            continue;
        };
        if tokens.contains(&token) {
            debug!(mechanism = %kind, %token, "dropping duplicate value");
            continue;
        }
        tokens.push(token);
    }
    tokens
}

fn to_mechanism(kind: MechanismKind, value: &str, own_domain: &str) -> Option<Mechanism> {
    let target = |value: &str| {
        if domain::domains_equal(value, own_domain) {
            None
        } else {
            Some(value.to_string())
        }
    };
    match kind {
        MechanismKind::Include => Some(Mechanism::Include(value.to_string())),
        MechanismKind::Ip4 => Some(Mechanism::Ip4(value.to_string())),
        MechanismKind::Ip6 => Some(Mechanism::Ip6(value.to_string())),
        MechanismKind::A => Some(Mechanism::a(target(value))),
        MechanismKind::Mx => Some(Mechanism::mx(target(value))),
        MechanismKind::Exists => Some(Mechanism::Exists(value.to_string())),
        MechanismKind::Redirect | MechanismKind::All => None,
    }
}

/// Pick the redirect target. Only the first value is used; the rest are dropped.
pub fn redirect_target<'a>(tokens: &[&'a str]) -> Option<&'a str> {
    if tokens.len() > 1 {
        debug!(dropped = tokens.len() - 1, "redirect takes a single target; extra values ignored");
    }
    tokens.first().copied()
}
