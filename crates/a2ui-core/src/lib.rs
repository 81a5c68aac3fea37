//! # a2ui-core — Foundational Types for A2UI Catalog Tooling
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! other crate builds on: the protocol version enum and its file layout, the
//! JSON Pointer grammar, and the in-memory reference resolver used to follow
//! cross-document `$ref`s.
//!
//! ## Key Design Principles
//!
//! 1. **One resolver primitive.** Catalog composition and schema bundling
//!    both navigate `uri#/pointer` references. They share
//!    [`resolve_pointer`] and [`DocumentRegistry`] rather than each parsing
//!    fragments on their own.
//!
//! 2. **Version-driven behavior.** [`ProtocolVersion`] is a closed enum;
//!    adding a protocol generation forces every `match` to handle it.
//!
//! 3. **Pure lookups.** Nothing in this crate performs I/O or keeps
//!    mutable state between calls.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `a2ui-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod pointer;
pub mod registry;
pub mod version;

pub use error::{PointerError, ResolutionError};
pub use pointer::{is_valid_json_pointer, resolve_pointer, split_reference};
pub use registry::{sibling_uri, DocumentRegistry};
pub use version::{
    ProtocolVersion, SpecFiles, BASE_SCHEMA_URL, CATALOG_COMPONENTS_KEY, CATALOG_FUNCTIONS_KEY,
    CATALOG_ID_KEY, CATALOG_STYLES_KEY, DEFS_KEY, DRAFT_2020_12, REF_KEY, UnknownVersion,
};
