//! Common infrastructure shared by the validators, the normalizer and the record parser.

pub mod cidr;
pub mod domain;
