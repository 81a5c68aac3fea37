//! # Protocol Versions and Well-Known Keys
//!
//! The protocol has two schema generations with different composition
//! rules. `0.8` ships one monolithic message schema whose open
//! `component`/`styles` slots are closed with the catalog's definitions;
//! `0.9` splits messages, common types and catalog into separate documents
//! linked by relative `$ref`s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Base URL used when a schema declares no `$id`.
pub const BASE_SCHEMA_URL: &str = "https://a2ui.org/";

/// JSON Schema draft every composed validator is pinned to.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

pub const CATALOG_ID_KEY: &str = "catalogId";
pub const CATALOG_COMPONENTS_KEY: &str = "components";
pub const CATALOG_FUNCTIONS_KEY: &str = "functions";
pub const CATALOG_STYLES_KEY: &str = "styles";
pub const DEFS_KEY: &str = "$defs";
pub const REF_KEY: &str = "$ref";

/// A supported protocol schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Monolithic message schema.
    #[serde(rename = "0.8")]
    V0_8,
    /// Registry-based message, common-types and catalog documents.
    #[serde(rename = "0.9")]
    V0_9,
}

/// Specification-relative locations of the documents for one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFiles {
    pub server_to_client: &'static str,
    pub catalog: &'static str,
    pub common_types: Option<&'static str>,
}

impl ProtocolVersion {
    /// All supported versions, oldest first.
    pub const ALL: [ProtocolVersion; 2] = [ProtocolVersion::V0_8, ProtocolVersion::V0_9];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0_8 => "0.8",
            Self::V0_9 => "0.9",
        }
    }

    /// Whether the message schema is composed by in-place injection rather
    /// than through a resolution registry.
    pub fn is_monolithic(&self) -> bool {
        matches!(self, Self::V0_8)
    }

    /// Relative paths of this version's documents under a repository root.
    pub fn spec_files(&self) -> SpecFiles {
        match self {
            Self::V0_8 => SpecFiles {
                server_to_client: "specification/v0_8/json/server_to_client.json",
                catalog: "specification/v0_8/json/standard_catalog_definition.json",
                common_types: None,
            },
            Self::V0_9 => SpecFiles {
                server_to_client: "specification/v0_9/json/server_to_client.json",
                catalog: "specification/v0_9/json/basic_catalog.json",
                common_types: Some("specification/v0_9/json/common_types.json"),
            },
        }
    }

    /// The catalog id assigned to the basic catalog when its document does
    /// not declare one: the base URL plus the catalog path with the `json/`
    /// directory dropped.
    pub fn default_basic_catalog_id(&self) -> String {
        let path = self.spec_files().catalog.replace("/json/", "/");
        format!("{BASE_SCHEMA_URL}{path}")
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a version string that names no supported generation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown A2UI specification version: {given}. Supported: [\"0.8\", \"0.9\"]")]
pub struct UnknownVersion {
    pub given: String,
}

impl FromStr for ProtocolVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('v') {
            "0.8" | "0_8" => Ok(Self::V0_8),
            "0.9" | "0_9" => Ok(Self::V0_9),
            _ => Err(UnknownVersion {
                given: s.to_string(),
            }),
        }
    }
}
