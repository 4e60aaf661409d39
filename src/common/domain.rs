/// Maximum length of a domain name in presentation form (RFC 1035 Section 2.3.4).
pub const MAX_DOMAIN_LEN: usize = 253;

/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

/// Normalize a domain: lowercase + strip trailing dot.
pub fn normalize(domain: &str) -> String {
    let d = domain.to_ascii_lowercase();
    d.strip_suffix('.').unwrap_or(&d).to_string()
}

/// Compare two domains after normalization.
pub fn domains_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Check a single label: `[A-Za-z0-9-]`, optional leading `_`,
/// no leading or trailing hyphen, 1..=63 octets.
pub fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    let body = label.strip_prefix('_').unwrap_or(label);
    if body.is_empty() || body.starts_with('-') || body.ends_with('-') {
        return false;
    }
    body.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Check every dot-separated label of `name`. Accepts one trailing dot.
/// Does not enforce a label count or a top label shape.
pub fn check_labels(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() || name.len() > MAX_DOMAIN_LEN {
        return false;
    }
    name.split('.').all(is_valid_label)
}

/// Full host-name check used for include, a, mx and redirect targets.
///
/// On top of [`check_labels`] this requires at least two labels and a top
/// label that is not purely numeric, so dotted quads are never taken for
/// domains.
pub fn is_valid_domain(name: &str) -> bool {
    if !check_labels(name) {
        return false;
    }
    let name = name.strip_suffix('.').unwrap_or(name);
    let mut labels = name.rsplit('.');
    let top = match labels.next() {
        Some(top) => top,
        None => return false,
    };
    if labels.next().is_none() {
        return false;
    }
    !top.starts_with('_') && !top.bytes().all(|b| b.is_ascii_digit())
}
