//! # Knowledge Base Artifacts
//!
//! The fixed list of documents that make up the knowledge base. Each entry
//! has a display name and a key; the key names both files by convention:
//!
//! ```text
//! <root>/<key>.json
//! <root>/schemas/<key>.schema.json
//! ```

use std::path::{Path, PathBuf};

/// Default knowledge base root, relative to the working directory.
pub const DEFAULT_ROOT: &str = "knowledge_base";

/// Subdirectory of the root holding the schemas.
pub const SCHEMA_SUBDIR: &str = "schemas";

/// `(display name, key)` for every knowledge base document, in report order.
pub const KNOWLEDGE_BASE_ARTIFACTS: &[(&str, &str)] = &[
    ("System Configuration", "system_config"),
    ("User Requirements", "user_requirements"),
    ("Design Decisions", "design_decisions"),
];

/// A data document paired with the schema it must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Label shown in reports.
    pub name: String,
    /// Short identifier, also the file stem.
    pub key: String,
    /// Location of the data document.
    pub data_path: PathBuf,
    /// Location of the schema.
    pub schema_path: PathBuf,
}

impl ArtifactSpec {
    /// Create a spec with explicit locations.
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        data_path: impl Into<PathBuf>,
        schema_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            data_path: data_path.into(),
            schema_path: schema_path.into(),
        }
    }

    /// Create a spec whose files follow the `<key>.json` /
    /// `schemas/<key>.schema.json` convention under `root`.
    pub fn conventional(root: &Path, name: &str, key: &str) -> Self {
        Self::new(
            name,
            key,
            root.join(format!("{key}.json")),
            root.join(SCHEMA_SUBDIR).join(format!("{key}.schema.json")),
        )
    }

    /// True if `filter` is this artifact's key, or its display name
    /// ignoring case.
    pub fn matches(&self, filter: &str) -> bool {
        self.key == filter || self.name.eq_ignore_ascii_case(filter)
    }
}

/// The knowledge base artifact list rooted at `root`.
pub fn knowledge_base_artifacts(root: &Path) -> Vec<ArtifactSpec> {
    KNOWLEDGE_BASE_ARTIFACTS
        .iter()
        .map(|(name, key)| ArtifactSpec::conventional(root, name, key))
        .collect()
}

/// Narrow `specs` to the entries matching `filter`, keeping order.
///
/// `None` keeps everything. A filter that matches nothing yields an empty
/// list.
pub fn select(specs: Vec<ArtifactSpec>, filter: Option<&str>) -> Vec<ArtifactSpec> {
    match filter {
        None => specs,
        Some(filter) => specs.into_iter().filter(|s| s.matches(filter)).collect(),
    }
}
