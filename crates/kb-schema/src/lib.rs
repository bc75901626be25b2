//! # kb-schema — Document Loading & Conformance Checking
//!
//! Leaf crate of the knowledge base validation workspace. It knows how to
//! turn a file on disk into a `serde_json::Value` and how to decide whether
//! that value conforms to a JSON Schema. It knows nothing about which
//! artifacts exist or how results are reported.
//!
//! ## Loading (`load`)
//!
//! [`load_document`] reads a JSON or YAML file and parses it. Failures are
//! tagged: [`LoadError::NotFound`] when the file is absent,
//! [`LoadError::Parse`] with the parser's line/column when it is malformed.
//!
//! ## Conformance (`validate`)
//!
//! [`ConformanceCheck`] is the narrow seam between the orchestrator and the
//! schema validation algorithm. [`JsonSchemaCheck`] is the production
//! implementation over the `jsonschema` crate; tests substitute fakes.
//! Results come back as a [`Conformance`] value, never as a panic or an
//! error that callers must remember to catch.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kb-*` crates.
//! - No network access: cross-schema `$ref`s resolve from a local schema
//!   directory or not at all.
//! - No `.unwrap()` outside tests.

pub mod load;
pub mod validate;

pub use load::{load_document, DocumentFormat, LoadError};
pub use validate::{
    Conformance, ConformanceCheck, InstancePath, JsonSchemaCheck, ValidationViolations, Violation,
};
