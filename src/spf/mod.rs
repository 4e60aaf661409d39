//! SPF record generation (RFC 7208).
//!
//! Values go through three stages: [`validate`] checks one raw value against
//! its mechanism's grammar, [`normalize`] turns validated values into
//! mechanism tokens, and [`RecordBuilder`] assembles the record.

mod builder;
mod macros;
mod mechanism;
mod normalizer;
mod record;
mod types;
mod validators;

pub use builder::{build, BuildPlan, RecordBuilder, VERSION};
pub use macros::{MacroError, MacroStyle};
pub use mechanism::{Directive, DualCidr, Mechanism, Qualifier};
pub use normalizer::normalize;
pub use record::{txt_chunks, SpfParseError, SpfRecord, TXT_CHUNK_LEN};
pub use types::{
    BuildResult, ErrorKind, FieldError, MechanismInput, MechanismKind, RecordRequest,
    ValidationResult,
};
pub use validators::{validate, validate_with, validator_for, ValidationContext, Validator};
