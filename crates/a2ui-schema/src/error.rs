//! # Error Types — Structured Error Hierarchy
//!
//! One enum per concern. Every validation error names the offending
//! component id, field or path so that a caller can turn it into a specific
//! correction instruction.
//!
//! ## Design
//!
//! - Payload validation failures ([`ValidationError`]) terminate the call
//!   that raised them; nothing here retries.
//! - Catalog resolution failures are *not* represented as returned errors:
//!   the composer logs them and continues best-effort.
//! - Bundle failures ([`BundleError`]) abort the whole bundle run with no
//!   partial output.

use std::fmt;
use std::path::PathBuf;

use a2ui_core::{PointerError, UnknownVersion};
use thiserror::Error;

/// A payload failed composed JSON Schema validation.
///
/// `context` carries the per-branch failures when the failing keyword was
/// a combinator (`oneOf`/`anyOf`), e.g. one entry per component type the
/// discriminator could have selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON Pointer to the violating value in the payload.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// Sub-schema failures attached to a combinator error.
    pub context: Vec<SchemaViolation>,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {}", self.message)?;
        if !self.instance_path.is_empty() {
            write!(f, " (at {})", self.instance_path)?;
        }
        if !self.context.is_empty() {
            write!(f, "\nContext failures:")?;
            for sub in &self.context {
                write!(f, "\n  - {}", sub.message)?;
                if !sub.instance_path.is_empty() {
                    write!(f, " (at {})", sub.instance_path)?;
                }
            }
        }
        Ok(())
    }
}

/// Component ids or references inside one message are inconsistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Duplicate component ID: {id}")]
    DuplicateId { id: String },

    #[error("Missing root component: No component has id='{root}'")]
    MissingRoot { root: String },

    #[error("Component '{component}' references non-existent component '{target}' in field '{field}'")]
    DanglingReference {
        component: String,
        target: String,
        field: String,
    },
}

/// The component graph of one message is not a tree rooted at the root id.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Self-reference detected: Component '{component}' references itself in field '{field}'")]
    SelfReference { component: String, field: String },

    #[error("Circular reference detected involving component '{component}'")]
    Cycle { component: String },

    /// The lexicographically smallest unreachable id is reported.
    #[error("Component '{component}' is not reachable from '{root}'")]
    Orphan { component: String, root: String },
}

/// A nesting ceiling was exceeded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecursionLimitError {
    /// Depth of the component graph walked from the root.
    #[error("Global recursion limit exceeded: logical depth > {limit}")]
    ComponentDepth { limit: usize },

    /// Container nesting anywhere in the message.
    #[error("Global recursion limit exceeded: Depth > {limit}")]
    StructuralDepth { limit: usize },

    /// Function calls nested through their `args`.
    #[error("Recursion limit exceeded: functionCall depth > {limit}")]
    FunctionCallDepth { limit: usize },
}

/// Any reason a payload is rejected by the conformance validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Schema(SchemaViolation),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    RecursionLimit(#[from] RecursionLimitError),

    #[error("Invalid JSON Pointer syntax: '{path}'")]
    PathSyntax { path: String },
}

/// A catalog value is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog '{name}' missing catalogId")]
    MissingCatalogId { name: String },

    #[error("failed to compile validator for catalog '{catalog}': {reason}")]
    ValidatorBuild { catalog: String, reason: String },
}

/// A bundle run could not complete. No output is written.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not resolve '{reference}' in {}: {source}", path.display())]
    UnresolvedPointer {
        reference: String,
        path: PathBuf,
        #[source]
        source: PointerError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The repair-and-retry step gave up.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to parse JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Catalog loading or selection failed.
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    UnknownVersion(#[from] UnknownVersion),

    #[error("Failed to load schema at {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("no specification root found above {}", start.display())]
    SpecRootNotFound { start: PathBuf },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Inline catalog 'inlineCatalogs' is provided in client UI capabilities. However, the agent does not accept inline catalogs.")]
    InlineCatalogsNotAccepted,

    #[error("Both 'inlineCatalogs' and 'supportedCatalogIds' are provided in client UI capabilities. Only one is allowed.")]
    ConflictingCapabilities,

    #[error("No supported catalog found on the agent side. Agent supported catalogs are: {available:?}")]
    NoSupportedCatalog { available: Vec<String> },
}
