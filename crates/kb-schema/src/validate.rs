//! # Schema Conformance
//!
//! The boundary between the orchestrator and the JSON Schema validation
//! algorithm. Callers hand over an already-parsed schema and instance and
//! get back a [`Conformance`] value with three cases:
//!
//! - the instance conforms,
//! - the instance violates the schema, with structured [`Violation`]s
//!   locating each problem inside the instance,
//! - the validator itself failed (invalid schema, unresolvable `$ref`).
//!
//! The third case is kept distinct from the second so that a broken schema
//! is never reported as a broken document.
//!
//! ## Schema Resolution
//!
//! Cross-schema `$ref`s are resolved by file name against an optional local
//! schema directory: a reference to `https://example.org/schemas/common.schema.json`
//! or a bare `common.schema.json` both load `<schema_dir>/common.schema.json`.
//! Nothing is fetched over the network. A reference that cannot be resolved
//! locally makes the schema fail to compile.

use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;

use crate::load::load_document;

/// The narrow interface the orchestrator validates through.
pub trait ConformanceCheck {
    /// Check `instance` against `schema`.
    fn check(&self, schema: &Value, instance: &Value) -> Conformance;
}

/// Result of a conformance check.
#[derive(Debug, Clone, PartialEq)]
pub enum Conformance {
    /// The instance satisfies the schema.
    Conforms,
    /// The instance violates the schema.
    Violated(ValidationViolations),
    /// The check could not be carried out.
    Unexpected(String),
}

/// Location of a value inside a document, as a list of object keys and
/// array indices from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath(Vec<String>);

impl InstancePath {
    /// The document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse an RFC 6901 JSON Pointer (`/decisions/0/status`).
    ///
    /// The empty pointer is the root. `~1` and `~0` escapes are decoded.
    pub fn from_json_pointer(pointer: &str) -> Self {
        if pointer.is_empty() {
            return Self::root();
        }
        Self::from_segments(
            pointer
                .strip_prefix('/')
                .unwrap_or(pointer)
                .split('/')
                .map(|token| token.replace("~1", "/").replace("~0", "~")),
        )
    }

    /// Returns the path segments in order from the root.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments; 0 at the document root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for InstancePath {
    /// Segments joined with ` -> `; the root renders as an empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Where in the instance the violation occurred.
    pub instance_path: InstancePath,
    /// JSON Pointer to the schema keyword that rejected the instance.
    pub schema_path: String,
    /// Validator's description of the violation.
    pub message: String,
}

/// Non-empty, ordered collection of violations from one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Wrap `violations`, or `None` if there are none.
    pub fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// The violation closest to the document root; the earliest reported
    /// one wins among equally shallow violations.
    pub fn primary(&self) -> &Violation {
        // Non-empty by construction.
        let mut primary = &self.violations[0];
        for violation in &self.violations[1..] {
            if violation.instance_path.depth() < primary.instance_path.depth() {
                primary = violation;
            }
        }
        primary
    }

    /// Returns the number of violations.
    pub fn count(&self) -> usize {
        self.violations.len()
    }
}

/// Resolves `$ref` URIs to files in a local schema directory.
///
/// Without a directory every external reference is refused, which keeps
/// the validator from reaching out to the network.
struct LocalSchemaRetriever {
    schema_dir: Option<PathBuf>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let Some(schema_dir) = &self.schema_dir else {
            return Err(format!("cannot resolve $ref '{uri_str}': no local schema directory").into());
        };

        let without_fragment = uri_str.split('#').next().unwrap_or(uri_str);
        let filename = without_fragment
            .rsplit('/')
            .next()
            .unwrap_or(without_fragment);
        if filename.is_empty() {
            return Err(format!("cannot resolve $ref '{uri_str}': no file name").into());
        }

        Ok(load_document(&schema_dir.join(filename))?)
    }
}

/// [`ConformanceCheck`] backed by the `jsonschema` crate.
///
/// The draft is taken from the schema's `$schema` keyword. `format` is an
/// annotation only: a string that does not match its declared format still
/// conforms, whatever the draft.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaCheck {
    schema_dir: Option<PathBuf>,
}

impl JsonSchemaCheck {
    /// A checker that resolves no external `$ref`s.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve external `$ref`s against files in `dir`.
    pub fn with_schema_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.schema_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.should_validate_formats(false);
        opts.with_retriever(LocalSchemaRetriever {
            schema_dir: self.schema_dir.clone(),
        });
        opts
    }

    fn compile(&self, schema: &Value) -> Result<Validator, String> {
        self.build_options()
            .build(schema)
            .map_err(|e| format!("invalid schema: {e}"))
    }
}

impl ConformanceCheck for JsonSchemaCheck {
    fn check(&self, schema: &Value, instance: &Value) -> Conformance {
        let validator = match self.compile(schema) {
            Ok(validator) => validator,
            Err(reason) => return Conformance::Unexpected(reason),
        };

        let violations: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: InstancePath::from_json_pointer(&e.instance_path.to_string()),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        match ValidationViolations::from_vec(violations) {
            Some(violations) => Conformance::Violated(violations),
            None => Conformance::Conforms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decisions_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["decisions"],
            "properties": {
                "decisions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["id", "status"],
                        "properties": {
                            "id": {"type": "string"},
                            "status": {"enum": ["proposed", "accepted", "rejected"]}
                        }
                    }
                }
            }
        })
    }

    fn violation(path: &[&str], message: &str) -> Violation {
        Violation {
            instance_path: InstancePath::from_segments(path.iter().copied()),
            schema_path: String::new(),
            message: message.to_string(),
        }
    }

    #[test]
    fn pointer_parses_into_segments() {
        let path = InstancePath::from_json_pointer("/decisions/0/status");
        assert_eq!(path.segments(), ["decisions", "0", "status"]);
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "decisions -> 0 -> status");
    }

    #[test]
    fn empty_pointer_is_root() {
        let path = InstancePath::from_json_pointer("");
        assert_eq!(path.depth(), 0);
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn pointer_escapes_are_decoded() {
        let path = InstancePath::from_json_pointer("/a~1b/c~0d/~01");
        assert_eq!(path.segments(), ["a/b", "c~d", "~1"]);
    }

    #[test]
    fn violations_from_empty_vec_is_none() {
        assert!(ValidationViolations::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn primary_is_shallowest_violation() {
        let violations = ValidationViolations::from_vec(vec![
            violation(&["decisions", "0", "status"], "nested"),
            violation(&[], "root"),
            violation(&["decisions"], "shallow"),
        ])
        .unwrap();
        assert_eq!(violations.primary().message, "root");
        assert_eq!(violations.count(), 3);
    }

    #[test]
    fn primary_keeps_first_among_equally_shallow() {
        let violations = ValidationViolations::from_vec(vec![
            violation(&["a", "b"], "deep"),
            violation(&["a"], "first"),
            violation(&["b"], "second"),
        ])
        .unwrap();
        assert_eq!(violations.primary().message, "first");
    }

    #[test]
    fn conforming_instance() {
        let data = json!({"decisions": [{"id": "D-1", "status": "accepted"}]});
        let result = JsonSchemaCheck::new().check(&decisions_schema(), &data);
        assert_eq!(result, Conformance::Conforms);
    }

    #[test]
    fn violation_locates_nested_field() {
        let data = json!({"decisions": [{"id": "D-1", "status": "maybe"}]});
        match JsonSchemaCheck::new().check(&decisions_schema(), &data) {
            Conformance::Violated(violations) => {
                assert_eq!(violations.count(), 1);
                let primary = violations.primary();
                assert_eq!(primary.instance_path.to_string(), "decisions -> 0 -> status");
                assert!(primary.message.contains("maybe"), "message: {}", primary.message);
                assert!(primary.schema_path.ends_with("enum"), "schema path: {}", primary.schema_path);
            }
            other => panic!("expected Violated, got: {other:?}"),
        }
    }

    #[test]
    fn missing_required_property_is_at_root() {
        match JsonSchemaCheck::new().check(&decisions_schema(), &json!({})) {
            Conformance::Violated(violations) => {
                let primary = violations.primary();
                assert_eq!(primary.instance_path.depth(), 0);
                assert!(primary.message.contains("decisions"));
            }
            other => panic!("expected Violated, got: {other:?}"),
        }
    }

    #[test]
    fn root_violation_outranks_nested_one() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["version"],
            "properties": {
                "decisions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"status": {"enum": ["accepted"]}}
                    }
                }
            }
        });
        let data = json!({"decisions": [{"status": "zzz"}]});
        match JsonSchemaCheck::new().check(&schema, &data) {
            Conformance::Violated(violations) => {
                assert_eq!(violations.count(), 2);
                let primary = violations.primary();
                assert_eq!(primary.instance_path.to_string(), "");
                assert!(primary.message.contains("version"), "message: {}", primary.message);
            }
            other => panic!("expected Violated, got: {other:?}"),
        }
    }

    #[test]
    fn every_violation_is_collected() {
        let data = json!({"decisions": [{"status": "maybe"}, {"id": 7, "status": "accepted"}]});
        match JsonSchemaCheck::new().check(&decisions_schema(), &data) {
            Conformance::Violated(violations) => assert_eq!(violations.count(), 3),
            other => panic!("expected Violated, got: {other:?}"),
        }
    }

    #[test]
    fn format_is_not_asserted() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "properties": {"created": {"type": "string", "format": "date-time"}}
        });
        let result = JsonSchemaCheck::new().check(&schema, &json!({"created": "not-a-date"}));
        assert_eq!(result, Conformance::Conforms);

        let result = JsonSchemaCheck::new().check(&schema, &json!({"created": 7}));
        assert!(matches!(result, Conformance::Violated(_)), "got: {result:?}");
    }

    #[test]
    fn invalid_schema_is_unexpected() {
        let schema = json!({"type": "not-a-type"});
        match JsonSchemaCheck::new().check(&schema, &json!({})) {
            Conformance::Unexpected(reason) => assert!(reason.starts_with("invalid schema")),
            other => panic!("expected Unexpected, got: {other:?}"),
        }
    }

    #[test]
    fn external_ref_without_schema_dir_is_unexpected() {
        let schema = json!({"$ref": "https://example.org/schemas/common.schema.json"});
        let result = JsonSchemaCheck::new().check(&schema, &json!("x"));
        assert!(matches!(result, Conformance::Unexpected(_)), "got: {result:?}");
    }

    #[test]
    fn external_ref_resolves_from_schema_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("status.schema.json"),
            r#"{"enum": ["proposed", "accepted", "rejected"]}"#,
        )
        .unwrap();
        let schema = json!({
            "$id": "https://example.org/schemas/decision.schema.json",
            "type": "object",
            "properties": {"status": {"$ref": "status.schema.json"}}
        });
        let check = JsonSchemaCheck::new().with_schema_dir(dir.path());

        assert_eq!(check.check(&schema, &json!({"status": "accepted"})), Conformance::Conforms);
        match check.check(&schema, &json!({"status": "maybe"})) {
            Conformance::Violated(violations) => {
                assert_eq!(violations.primary().instance_path.segments(), ["status"]);
            }
            other => panic!("expected Violated, got: {other:?}"),
        }
    }

    #[test]
    fn draft_follows_dollar_schema() {
        // `prefixItems` only exists in 2020-12; under draft 7 it is ignored.
        let data = json!([1]);
        let draft7 = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "prefixItems": [{"type": "string"}]
        });
        let draft2020 = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "prefixItems": [{"type": "string"}]
        });
        let check = JsonSchemaCheck::new();
        assert_eq!(check.check(&draft7, &data), Conformance::Conforms);
        assert!(matches!(check.check(&draft2020, &data), Conformance::Violated(_)));
    }
}
