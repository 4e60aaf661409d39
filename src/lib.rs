//! SPF record generator.
//!
//! Validates authorized-sender mechanisms for a domain and builds a single
//! RFC 7208 TXT record string. No DNS lookups are performed: publishing the
//! record is the caller's responsibility.
//!
//! ```
//! use spf_builder::{build, MechanismKind, RecordRequest};
//!
//! let request = RecordRequest::new("mycompany.test")
//!     .with_mechanism(MechanismKind::Ip4, ["192.168.1.1"]);
//! assert_eq!(build(&request).record(), Some("v=spf1 ip4:192.168.1.1 ~all"));
//! ```

pub mod common;
pub mod config;
pub mod spf;

pub use config::{BuilderConfig, ConfigError};
pub use spf::{
    build, BuildResult, ErrorKind, FieldError, MechanismInput, MechanismKind, Qualifier,
    RecordBuilder, RecordRequest,
};
