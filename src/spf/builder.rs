//! Record assembly.
//!
//! Building runs in two phases: [`RecordBuilder::plan`] validates every
//! enabled input and either collects all errors or produces a [`BuildPlan`];
//! [`BuildPlan::render`] then writes the record text.

use std::fmt;

use tracing::{debug, warn};

use super::mechanism::{Mechanism, Qualifier};
use super::normalizer;
use super::types::{BuildResult, ErrorKind, FieldError, MechanismKind, RecordRequest, ValidationResult};
use super::validators::{self, ValidationContext};
use crate::config::BuilderConfig;

/// SPF version tag every record starts with.
pub const VERSION: &str = "v=spf1";

/// What a valid request renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildPlan {
    /// `v=spf1 redirect=<domain>` and nothing else.
    Redirect(String),
    /// Ordered mechanism tokens followed by `<qualifier>all`.
    MechanismList {
        mechanisms: Vec<Mechanism>,
        qualifier: Qualifier,
    },
}

impl BuildPlan {
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// DNS lookups the rendered record costs at evaluation time.
    pub fn lookup_count(&self) -> usize {
        match self {
            BuildPlan::Redirect(_) => 1,
            BuildPlan::MechanismList { mechanisms, .. } => {
                mechanisms.iter().map(Mechanism::lookup_cost).sum()
            }
        }
    }
}

impl fmt::Display for BuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{VERSION}")?;
        match self {
            BuildPlan::Redirect(target) => write!(f, " redirect={target}"),
            BuildPlan::MechanismList { mechanisms, qualifier } => {
                for mechanism in mechanisms {
                    write!(f, " {mechanism}")?;
                }
                // The terminal always carries its qualifier, `+all` included.
                write!(f, " {qualifier}all")
            }
        }
    }
}

/// Builds records from requests. Holds no per-request state.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    config: BuilderConfig,
}

impl RecordBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// A fresh request for `domain` using the configured default qualifier.
    pub fn new_request(&self, domain: impl Into<String>) -> RecordRequest {
        RecordRequest::new(domain).with_qualifier(self.config.default_qualifier)
    }

    /// Build the record text, or every error found in the request.
    pub fn build(&self, request: &RecordRequest) -> BuildResult {
        match self.plan(request) {
            Ok(plan) => {
                let lookups = plan.lookup_count();
                if lookups > self.config.max_dns_lookups {
                    warn!(
                        domain = %request.domain,
                        lookups,
                        limit = self.config.max_dns_lookups,
                        "record exceeds the DNS lookup limit and will fail evaluation with permerror"
                    );
                }
                let record = plan.render();
                debug!(domain = %request.domain, %record, "built SPF record");
                BuildResult::Record(record)
            }
            Err(errors) => {
                debug!(domain = %request.domain, errors = errors.len(), "SPF record rejected");
                BuildResult::Errors(errors)
            }
        }
    }

    /// Validate the whole request. All field errors are returned together;
    /// only a missing domain stops validation early.
    pub fn plan(&self, request: &RecordRequest) -> Result<BuildPlan, Vec<FieldError>> {
        let own_domain = request.domain.trim();
        if own_domain.is_empty() {
            return Err(vec![FieldError::request(ErrorKind::MissingDomain)]);
        }

        let ctx = ValidationContext {
            macro_style: self.config.macro_style,
        };
        let mut errors = Vec::new();
        let mut mechanisms = Vec::new();

        for kind in MechanismKind::BUILD_ORDER {
            let Some(input) = request.mechanism(kind).filter(|m| m.enabled) else {
                continue;
            };
            let tokens = input.tokens();
            if tokens.is_empty() {
                errors.push(FieldError::field(kind, ErrorKind::EmptyMechanism));
                continue;
            }

            let mut values = Vec::with_capacity(tokens.len());
            for token in tokens {
                match validators::validate_with(kind, token, &ctx) {
                    ValidationResult::Valid(v) => values.push(v),
                    ValidationResult::Invalid(error) => {
                        errors.push(FieldError::for_value(kind, error, token));
                    }
                }
            }
            mechanisms.extend(normalizer::normalize(kind, &values, own_domain));
        }

        // `all` is always generated; any value supplied for it is rejected.
        if let Some(input) = request.mechanism(MechanismKind::All).filter(|m| m.enabled) {
            for token in input.tokens() {
                if let ValidationResult::Invalid(error) =
                    validators::validate_with(MechanismKind::All, token, &ctx)
                {
                    errors.push(FieldError::for_value(MechanismKind::All, error, token));
                }
            }
        }

        let redirect = if request.redirect_enabled {
            self.redirect_target(request, &ctx, &mut errors)
        } else {
            None
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(match redirect {
            Some(target) => {
                if !mechanisms.is_empty() {
                    debug!(suppressed = mechanisms.len(), "redirect enabled; other mechanisms left out");
                }
                BuildPlan::Redirect(target)
            }
            None => BuildPlan::MechanismList {
                mechanisms,
                qualifier: request.qualifier,
            },
        })
    }

    /// The redirect target is read from the redirect input whether or not
    /// that input is flagged enabled; the request-level switch decides.
    fn redirect_target(
        &self,
        request: &RecordRequest,
        ctx: &ValidationContext,
        errors: &mut Vec<FieldError>,
    ) -> Option<String> {
        let tokens = request
            .mechanism(MechanismKind::Redirect)
            .map(|m| m.tokens())
            .unwrap_or_default();
        let Some(raw) = normalizer::redirect_target(&tokens) else {
            errors.push(FieldError::field(MechanismKind::Redirect, ErrorKind::MissingRedirect));
            return None;
        };
        match validators::validate_with(MechanismKind::Redirect, raw, ctx) {
            ValidationResult::Valid(target) => Some(target),
            ValidationResult::Invalid(error) => {
                errors.push(FieldError::for_value(MechanismKind::Redirect, error, raw));
                None
            }
        }
    }
}

/// Build with the default configuration.
pub fn build(request: &RecordRequest) -> BuildResult {
    RecordBuilder::default().build(request)
}
