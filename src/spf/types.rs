use std::fmt;

use serde::{Deserialize, Serialize};

use super::mechanism::Qualifier;

/// Mechanism kinds a record can be built from.
///
/// `All` is the implicit terminal mechanism; it is never supplied as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MechanismKind {
    Include,
    Ip4,
    Ip6,
    A,
    Mx,
    Exists,
    Redirect,
    All,
}

impl MechanismKind {
    /// Output order of mechanism groups in a built record.
    pub const BUILD_ORDER: [MechanismKind; 6] = [
        MechanismKind::Include,
        MechanismKind::Ip4,
        MechanismKind::Ip6,
        MechanismKind::A,
        MechanismKind::Mx,
        MechanismKind::Exists,
    ];

    /// Name used in record text (`ip4`, `include`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            MechanismKind::Include => "include",
            MechanismKind::Ip4 => "ip4",
            MechanismKind::Ip6 => "ip6",
            MechanismKind::A => "a",
            MechanismKind::Mx => "mx",
            MechanismKind::Exists => "exists",
            MechanismKind::Redirect => "redirect",
            MechanismKind::All => "all",
        }
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User input for one mechanism kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismInput {
    pub kind: MechanismKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Raw text as typed. Each entry may hold several whitespace-separated values.
    #[serde(default)]
    pub raw_values: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl MechanismInput {
    pub fn new<I, S>(kind: MechanismKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            enabled: true,
            raw_values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Individual values after splitting on whitespace; blanks are dropped.
    pub fn tokens(&self) -> Vec<&str> {
        self.raw_values
            .iter()
            .flat_map(|v| v.split_whitespace())
            .collect()
    }
}

/// A complete submission. Built fresh per build and never mutated by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordRequest {
    /// The domain the record is published for.
    pub domain: String,
    /// At most one entry per kind; see [`RecordRequest::set_mechanism`].
    #[serde(default)]
    pub mechanisms: Vec<MechanismInput>,
    /// When set, only `redirect=` is emitted. Other inputs are kept.
    #[serde(default)]
    pub redirect_enabled: bool,
    #[serde(default)]
    pub qualifier: Qualifier,
}

impl RecordRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Enable `kind` with the given values, replacing any previous input for it.
    pub fn with_mechanism<I, S>(mut self, kind: MechanismKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_mechanism(MechanismInput::new(kind, values));
        self
    }

    /// Set the redirect target and switch redirect mode on.
    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.set_mechanism(MechanismInput::new(MechanismKind::Redirect, [target]));
        self.redirect_enabled = true;
        self
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Insert or replace the input for `input.kind`.
    pub fn set_mechanism(&mut self, input: MechanismInput) {
        match self.mechanisms.iter_mut().find(|m| m.kind == input.kind) {
            Some(existing) => *existing = input,
            None => self.mechanisms.push(input),
        }
    }

    /// Toggle redirect mode. Mechanism inputs are left untouched.
    pub fn set_redirect_enabled(&mut self, enabled: bool) {
        self.redirect_enabled = enabled;
    }

    /// Input for `kind`. With duplicate entries the last one wins.
    pub fn mechanism(&self, kind: MechanismKind) -> Option<&MechanismInput> {
        self.mechanisms.iter().rev().find(|m| m.kind == kind)
    }
}

/// Reason a field or request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum ErrorKind {
    #[error("domain is required")]
    MissingDomain,
    #[error("invalid IP address (expected IPv4 with optional /0-32 prefix)")]
    InvalidIPv4,
    #[error("invalid IP address (expected IPv6 with optional /0-128 prefix)")]
    InvalidIPv6,
    #[error("invalid domain name")]
    InvalidDomain,
    #[error("invalid SPF macro")]
    InvalidMacro,
    #[error("redirect target is required")]
    MissingRedirect,
    #[error("mechanism is enabled but has no values")]
    EmptyMechanism,
}

/// Outcome of validating a single raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Normalized value, without the mechanism prefix.
    Valid(String),
    Invalid(ErrorKind),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }
}

impl From<Result<String, ErrorKind>> for ValidationResult {
    fn from(r: Result<String, ErrorKind>) -> Self {
        match r {
            Ok(v) => ValidationResult::Valid(v),
            Err(e) => ValidationResult::Invalid(e),
        }
    }
}

/// A rejected field. `mechanism` is `None` for request-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub mechanism: Option<MechanismKind>,
    pub error: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    pub fn request(error: ErrorKind) -> Self {
        Self { mechanism: None, error, value: None }
    }

    pub fn field(mechanism: MechanismKind, error: ErrorKind) -> Self {
        Self { mechanism: Some(mechanism), error, value: None }
    }

    pub fn for_value(mechanism: MechanismKind, error: ErrorKind, value: &str) -> Self {
        Self {
            mechanism: Some(mechanism),
            error,
            value: Some(value.to_string()),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = self.mechanism {
            write!(f, "{kind}: ")?;
        }
        write!(f, "{}", self.error)?;
        if let Some(v) = &self.value {
            write!(f, ": {v}")?;
        }
        Ok(())
    }
}

/// Result of a build: the record text, or every collected error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildResult {
    Record(String),
    Errors(Vec<FieldError>),
}

impl BuildResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, BuildResult::Record(_))
    }

    pub fn record(&self) -> Option<&str> {
        match self {
            BuildResult::Record(r) => Some(r),
            BuildResult::Errors(_) => None,
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            BuildResult::Record(_) => &[],
            BuildResult::Errors(e) => e,
        }
    }

    /// True if some error is reported against `kind` with `error`.
    pub fn has_error(&self, kind: MechanismKind, error: ErrorKind) -> bool {
        self.errors()
            .iter()
            .any(|e| e.mechanism == Some(kind) && e.error == error)
    }

    pub fn into_result(self) -> Result<String, Vec<FieldError>> {
        match self {
            BuildResult::Record(r) => Ok(r),
            BuildResult::Errors(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_on_whitespace() {
        let input = MechanismInput::new(
            MechanismKind::Ip4,
            ["10.0.0.1/20 192.168.0.10", "\n172.16.0.1\n", "   "],
        );
        assert_eq!(input.tokens(), vec!["10.0.0.1/20", "192.168.0.10", "172.16.0.1"]);
    }

    #[test]
    fn set_mechanism_replaces_same_kind() {
        let mut req = RecordRequest::new("example.com")
            .with_mechanism(MechanismKind::Include, ["a.example.net"]);
        req.set_mechanism(MechanismInput::new(MechanismKind::Include, ["b.example.net"]));
        assert_eq!(req.mechanisms.len(), 1);
        assert_eq!(
            req.mechanism(MechanismKind::Include).unwrap().raw_values,
            vec!["b.example.net".to_string()]
        );
    }

    #[test]
    fn redirect_toggle_keeps_inputs() {
        let mut req = RecordRequest::new("example.com")
            .with_mechanism(MechanismKind::Include, ["_spf.google.com"]);
        req.set_redirect_enabled(true);
        req.set_redirect_enabled(false);
        assert!(req.mechanism(MechanismKind::Include).is_some());
        assert!(!req.redirect_enabled);
    }

    #[test]
    fn default_qualifier_is_softfail() {
        assert_eq!(RecordRequest::new("example.com").qualifier, Qualifier::SoftFail);
    }

    #[test]
    fn field_error_display() {
        let e = FieldError::for_value(MechanismKind::Ip4, ErrorKind::InvalidIPv4, "300.1.1.1");
        let text = e.to_string();
        assert!(text.starts_with("ip4: invalid IP address"));
        assert!(text.ends_with(": 300.1.1.1"));
        assert_eq!(FieldError::request(ErrorKind::MissingDomain).to_string(), "domain is required");
    }

    #[test]
    fn request_from_json() {
        let req: RecordRequest = serde_json::from_str(
            r#"{
                "domain": "mycompany.test",
                "mechanisms": [
                    {"kind": "ip4", "raw_values": ["192.168.1.1"]},
                    {"kind": "mx", "enabled": false, "raw_values": []}
                ],
                "qualifier": "fail"
            }"#,
        )
        .unwrap();
        assert_eq!(req.qualifier, Qualifier::Fail);
        assert!(req.mechanism(MechanismKind::Ip4).unwrap().enabled);
        assert!(!req.mechanism(MechanismKind::Mx).unwrap().enabled);
        assert!(!req.redirect_enabled);
    }
}
