//! # Reference Resolver
//!
//! A small in-memory registry of loaded JSON documents keyed by URI. A
//! reference is resolved by joining its document part against an optional
//! base URI, looking the document up, then following the fragment as a
//! JSON Pointer.
//!
//! The registry never fetches anything. A document that was not registered
//! is a [`ResolutionError::UnknownDocument`].

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use crate::error::ResolutionError;
use crate::pointer::{resolve_pointer, split_reference};

/// URI-keyed store of JSON documents used to follow `$ref`s.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    documents: HashMap<String, Value>,
}

impl DocumentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_document(mut self, uri: &str, document: Value) -> Self {
        self.insert(uri, document);
        self
    }

    /// Register `document` under `uri`. Any fragment on `uri` is ignored;
    /// a later registration under the same URI replaces the earlier one.
    pub fn insert(&mut self, uri: &str, document: Value) {
        self.documents.insert(normalize_key(uri), document);
    }

    /// Look up a registered document by URI (fragment ignored).
    pub fn get(&self, uri: &str) -> Option<&Value> {
        self.documents.get(&normalize_key(uri))
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Resolve `reference` (absolute, or relative to `base`) to the subtree
    /// it addresses.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::UnknownDocument`] when the document part is not
    /// registered, [`ResolutionError::InvalidUri`] when it cannot be joined
    /// with `base`, [`ResolutionError::Pointer`] when the fragment does not
    /// address anything.
    pub fn resolve(&self, reference: &str, base: Option<&str>) -> Result<&Value, ResolutionError> {
        let (document_part, fragment) = split_reference(reference);
        let document_uri = absolutize(reference, document_part, base)?;

        let document = self
            .get(&document_uri)
            .ok_or_else(|| ResolutionError::UnknownDocument {
                uri: reference.to_string(),
                document: document_uri.clone(),
            })?;

        resolve_pointer(document, fragment).map_err(|source| ResolutionError::Pointer {
            uri: reference.to_string(),
            source,
        })
    }
}

/// Resolve `filename` as a sibling of the document at `base`.
///
/// `https://a2ui.org/specification/v0_9/server_to_client.json` + `catalog.json`
/// → `https://a2ui.org/specification/v0_9/catalog.json`.
pub fn sibling_uri(base: &str, filename: &str) -> String {
    if let Ok(joined) = Url::parse(base).and_then(|url| url.join(filename)) {
        return joined.to_string();
    }
    match base.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{filename}"),
        None => filename.to_string(),
    }
}

fn absolutize(
    reference: &str,
    document_part: &str,
    base: Option<&str>,
) -> Result<String, ResolutionError> {
    if document_part.is_empty() {
        return Ok(base.map(normalize_key).unwrap_or_default());
    }
    if let Ok(url) = Url::parse(document_part) {
        return Ok(strip_fragment(url));
    }
    match base.map(Url::parse) {
        Some(Ok(base_url)) => base_url
            .join(document_part)
            .map(strip_fragment)
            .map_err(|e| ResolutionError::InvalidUri {
                uri: reference.to_string(),
                reason: e.to_string(),
            }),
        // Relative reference with no usable base: look it up by bare name.
        _ => Ok(document_part.to_string()),
    }
}

fn strip_fragment(mut url: Url) -> String {
    url.set_fragment(None);
    url.to_string()
}

fn normalize_key(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) => strip_fragment(url),
        Err(_) => split_reference(uri).0.to_string(),
    }
}
