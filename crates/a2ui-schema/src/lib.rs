//! # a2ui-schema — Catalog Composition and Payload Conformance
//!
//! Everything that operates on A2UI catalogs and the payloads generated
//! against them:
//!
//! - [`compose`]: merge a custom catalog with a base catalog, prune a
//!   catalog to an allowlist of components.
//! - [`bundle`]: inline the remote `$ref`s of a schema file into `$defs`.
//! - [`validate`]: compile a per-catalog validator combining JSON Schema
//!   with component-graph checks ([`graph`], [`limits`], [`refs`]).
//! - [`fixer`]: one trailing-comma repair pass in front of the validator.
//! - [`manager`]: load specification documents and select a catalog from
//!   client capabilities.
//!
//! ## Crate Policy
//!
//! - Every operation is synchronous and keeps no state between calls.
//! - Composition failures are logged, never returned. Bundle and
//!   validation failures are returned, never logged and swallowed.
//! - No network access: all references are served from memory or local
//!   files.

pub mod bundle;
pub mod catalog;
pub mod compose;
pub mod error;
pub mod fixer;
pub mod graph;
pub mod limits;
pub mod manager;
pub mod refs;
pub mod validate;

pub use bundle::{default_output_path, BundleContext, SchemaBundler};
pub use catalog::{Catalog, CatalogConfig, BASIC_CATALOG_NAME, INLINE_CATALOG_NAME};
pub use compose::{prune_catalog_schema, resolve_catalog_schema};
pub use error::{
    BundleError, CatalogError, IntegrityError, ManagerError, PayloadError, RecursionLimitError,
    SchemaViolation, TopologyError, ValidationError,
};
pub use fixer::{parse_messages, PayloadFixer};
pub use manager::{
    find_spec_root, SchemaManager, SchemaManagerConfig, SchemaModifiers, SpecDocuments,
    INLINE_CATALOGS_KEY, SUPPORTED_CATALOG_IDS_KEY,
};
pub use refs::{classify_property, ComponentReference, RefKind, ReferenceFieldMap, ReferenceFields};
pub use validate::ConformanceValidator;
