//! # Error Types — Reference Resolution
//!
//! Errors raised while navigating JSON Pointers or looking up documents in a
//! [`DocumentRegistry`](crate::DocumentRegistry). Callers decide whether a
//! failure is fatal: the catalog composer logs and continues, the schema
//! bundler aborts.

use thiserror::Error;

/// A JSON Pointer could not be followed inside a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// A segment named an object key that does not exist.
    #[error("could not resolve pointer '{pointer}': no key '{segment}'")]
    MissingKey {
        /// The full pointer being resolved.
        pointer: String,
        /// The unescaped segment that failed.
        segment: String,
    },

    /// A segment indexed past the end of an array, or was not an index.
    #[error("could not resolve pointer '{pointer}': invalid array index '{segment}'")]
    BadIndex {
        /// The full pointer being resolved.
        pointer: String,
        /// The segment that failed.
        segment: String,
    },

    /// A segment tried to descend into a scalar.
    #[error("could not resolve pointer '{pointer}': cannot descend into a scalar at '{segment}'")]
    NotAContainer {
        /// The full pointer being resolved.
        pointer: String,
        /// The segment that failed.
        segment: String,
    },
}

/// A `$ref` URI could not be resolved against a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The document part of the URI is not registered.
    #[error("unresolvable reference '{uri}': no document registered at '{document}'")]
    UnknownDocument {
        /// The reference as written.
        uri: String,
        /// The absolute document URI that was looked up.
        document: String,
    },

    /// The URI could not be parsed or joined with its base.
    #[error("invalid reference URI '{uri}': {reason}")]
    InvalidUri {
        /// The reference as written.
        uri: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The document exists but the fragment does not address anything.
    #[error("unresolvable reference '{uri}': {source}")]
    Pointer {
        /// The reference as written.
        uri: String,
        /// The underlying pointer failure.
        #[source]
        source: PointerError,
    },
}
