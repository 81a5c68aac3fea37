//! # Catalog Selection
//!
//! Loads the specification documents for one protocol version, registers
//! the basic catalog and any custom catalogs by catalog id, and picks the
//! catalog matching a client's declared UI capabilities.
//!
//! ## Selection Rules
//!
//! 1. No capabilities (or not an object): the basic catalog.
//! 2. `inlineCatalogs` while inline catalogs are not accepted: error.
//! 3. Both `inlineCatalogs` and `supportedCatalogIds`: error.
//! 4. `inlineCatalogs`: the first one, resolved against the basic catalog.
//! 5. `supportedCatalogIds`: the first id this agent knows. An empty list
//!    means the basic catalog; no known id is an error.
//!
//! ## Schema Modifiers
//!
//! [`SchemaModifiers`] run over every document as it is loaded: the
//! message schema, common types, the basic catalog, each custom catalog as
//! read from disk and each custom catalog again after resolution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use a2ui_core::{ProtocolVersion, CATALOG_ID_KEY, DRAFT_2020_12};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::catalog::{Catalog, CatalogConfig, BASIC_CATALOG_NAME, INLINE_CATALOG_NAME};
use crate::compose::resolve_catalog_schema;
use crate::error::ManagerError;

pub const INLINE_CATALOGS_KEY: &str = "inlineCatalogs";
pub const SUPPORTED_CATALOG_IDS_KEY: &str = "supportedCatalogIds";

/// Directory whose presence marks a specification root.
const SPECIFICATION_DIR: &str = "specification";

/// Agent-side catalog configuration, usually read from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaManagerConfig {
    pub version: ProtocolVersion,
    /// Directory containing `specification/`. Discovered from the working
    /// directory upwards when unset.
    #[serde(default)]
    pub spec_root: Option<PathBuf>,
    #[serde(default)]
    pub basic_examples_path: Option<PathBuf>,
    #[serde(default)]
    pub custom_catalogs: Vec<CatalogConfig>,
    #[serde(default)]
    pub exclude_basic_catalog: bool,
    #[serde(default)]
    pub accepts_inline_catalogs: bool,
}

impl SchemaManagerConfig {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            spec_root: None,
            basic_examples_path: None,
            custom_catalogs: Vec::new(),
            exclude_basic_catalog: false,
            accepts_inline_catalogs: false,
        }
    }

    /// Read a YAML config. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ManagerError> {
        let text = std::fs::read_to_string(path).map_err(|e| ManagerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut config: Self = serde_yaml::from_str(&text).map_err(|e| ManagerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(dir) = path.parent() {
            config.rebase(dir);
        }
        Ok(config)
    }

    fn rebase(&mut self, dir: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        self.spec_root.iter_mut().for_each(rebase);
        self.basic_examples_path.iter_mut().for_each(rebase);
        for custom in &mut self.custom_catalogs {
            rebase(&mut custom.catalog_path);
            custom.examples_path.iter_mut().for_each(rebase);
        }
    }
}

/// Walk up from `start` to the first directory containing `specification/`.
pub fn find_spec_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(SPECIFICATION_DIR).is_dir())
        .map(Path::to_path_buf)
}

type SchemaModifier = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// An ordered chain of document transformations applied on load.
#[derive(Clone, Default)]
pub struct SchemaModifiers {
    chain: Vec<SchemaModifier>,
}

impl SchemaModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `modifier` to the chain. Modifiers run in insertion order.
    pub fn with_schema_modifier(
        mut self,
        modifier: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.chain.push(Arc::new(modifier));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn apply(&self, schema: Value) -> Value {
        self.chain.iter().fold(schema, |schema, modifier| modifier(schema))
    }
}

impl fmt::Debug for SchemaModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaModifiers")
            .field("len", &self.chain.len())
            .finish()
    }
}

/// The three specification documents of one protocol version.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocuments {
    pub server_to_client: Value,
    /// `Null` for versions without a separate common-types document.
    pub common_types: Value,
    pub basic_catalog: Value,
}

impl SpecDocuments {
    pub fn load(version: ProtocolVersion, spec_root: &Path) -> Result<Self, ManagerError> {
        let files = version.spec_files();
        let common_types = match files.common_types {
            Some(path) => load_json(&spec_root.join(path))?,
            None => Value::Null,
        };
        Ok(Self {
            server_to_client: load_json(&spec_root.join(files.server_to_client))?,
            common_types,
            basic_catalog: load_json(&spec_root.join(files.catalog))?,
        })
    }
}

fn load_json(path: &Path) -> Result<Value, ManagerError> {
    let text = std::fs::read_to_string(path).map_err(|e| ManagerError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| ManagerError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone)]
struct RegisteredCatalog {
    id: String,
    catalog: Catalog,
    examples_path: Option<PathBuf>,
}

/// Registered catalogs for one protocol version.
#[derive(Debug, Clone)]
pub struct SchemaManager {
    version: ProtocolVersion,
    accepts_inline_catalogs: bool,
    basic_catalog: Catalog,
    /// Registration order is kept for error messages.
    catalogs: Vec<RegisteredCatalog>,
}

impl SchemaManager {
    /// Load the specification documents from disk, then build the manager.
    pub fn load(config: &SchemaManagerConfig) -> Result<Self, ManagerError> {
        Self::load_with_modifiers(config, &SchemaModifiers::default())
    }

    /// [`load`](Self::load), running `modifiers` over every document.
    pub fn load_with_modifiers(
        config: &SchemaManagerConfig,
        modifiers: &SchemaModifiers,
    ) -> Result<Self, ManagerError> {
        let spec_root = match &config.spec_root {
            Some(root) => root.clone(),
            None => {
                let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                find_spec_root(&start).ok_or(ManagerError::SpecRootNotFound { start })?
            }
        };
        let documents = SpecDocuments::load(config.version, &spec_root)?;
        Self::from_documents_with_modifiers(config, documents, modifiers)
    }

    /// Build the manager from already-loaded specification documents.
    /// Custom catalogs named in `config` are still read from disk.
    pub fn from_documents(
        config: &SchemaManagerConfig,
        documents: SpecDocuments,
    ) -> Result<Self, ManagerError> {
        Self::from_documents_with_modifiers(config, documents, &SchemaModifiers::default())
    }

    pub fn from_documents_with_modifiers(
        config: &SchemaManagerConfig,
        documents: SpecDocuments,
        modifiers: &SchemaModifiers,
    ) -> Result<Self, ManagerError> {
        let version = config.version;
        let server_to_client = modifiers.apply(documents.server_to_client);
        let common_types = match documents.common_types {
            Value::Null => Value::Null,
            common_types => modifiers.apply(common_types),
        };
        let mut basic_schema = match modifiers.apply(documents.basic_catalog) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if !basic_schema.contains_key(CATALOG_ID_KEY) {
            basic_schema.insert(
                CATALOG_ID_KEY.to_string(),
                Value::String(version.default_basic_catalog_id()),
            );
        }
        if !basic_schema.contains_key("$schema") {
            basic_schema.insert("$schema".to_string(), Value::String(DRAFT_2020_12.to_string()));
        }

        let basic_catalog = Catalog::new(
            version,
            BASIC_CATALOG_NAME,
            server_to_client,
            common_types,
            Value::Object(basic_schema),
        );

        let mut manager = Self {
            version,
            accepts_inline_catalogs: config.accepts_inline_catalogs,
            basic_catalog: basic_catalog.clone(),
            catalogs: Vec::new(),
        };

        if !config.exclude_basic_catalog {
            manager.register(basic_catalog.clone(), config.basic_examples_path.clone())?;
        }

        for custom in &config.custom_catalogs {
            let custom_schema = modifiers.apply(load_json(&custom.catalog_path)?);
            let resolved = modifiers.apply(resolve_catalog_schema(
                basic_catalog.catalog_schema(),
                &custom_schema,
            ));
            let catalog = basic_catalog.with_catalog_schema(custom.name.clone(), resolved);
            manager.register(catalog, custom.examples_path.clone())?;
        }

        tracing::info!(
            version = %version,
            catalogs = manager.catalogs.len(),
            modifiers = modifiers.chain.len(),
            "schema manager ready"
        );
        Ok(manager)
    }

    /// A later registration under an existing id replaces the earlier one
    /// in place.
    fn register(
        &mut self,
        catalog: Catalog,
        examples_path: Option<PathBuf>,
    ) -> Result<(), ManagerError> {
        let id = catalog.catalog_id()?.to_string();
        let entry = RegisteredCatalog {
            id: id.clone(),
            catalog,
            examples_path,
        };
        match self.catalogs.iter_mut().find(|c| c.id == id) {
            Some(existing) => *existing = entry,
            None => self.catalogs.push(entry),
        }
        Ok(())
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn accepts_inline_catalogs(&self) -> bool {
        self.accepts_inline_catalogs
    }

    pub fn basic_catalog(&self) -> &Catalog {
        &self.basic_catalog
    }

    /// Catalog ids this agent supports, in registration order.
    pub fn supported_catalog_ids(&self) -> Vec<&str> {
        self.catalogs.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn catalog(&self, catalog_id: &str) -> Option<&Catalog> {
        self.catalogs
            .iter()
            .find(|c| c.id == catalog_id)
            .map(|c| &c.catalog)
    }

    /// Pick the catalog for a client's UI capabilities.
    pub fn select_catalog(&self, capabilities: Option<&Value>) -> Result<Catalog, ManagerError> {
        let Some(Value::Object(capabilities)) = capabilities else {
            return Ok(self.basic_catalog.clone());
        };

        let inline: &[Value] = capabilities
            .get(INLINE_CATALOGS_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let supported: Vec<&str> = capabilities
            .get(SUPPORTED_CATALOG_IDS_KEY)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();

        if !self.accepts_inline_catalogs && !inline.is_empty() {
            return Err(ManagerError::InlineCatalogsNotAccepted);
        }
        if !inline.is_empty() && !supported.is_empty() {
            return Err(ManagerError::ConflictingCapabilities);
        }

        if let Some(first) = inline.first() {
            let resolved = resolve_catalog_schema(self.basic_catalog.catalog_schema(), first);
            return Ok(self
                .basic_catalog
                .with_catalog_schema(INLINE_CATALOG_NAME, resolved));
        }

        if supported.is_empty() {
            return Ok(self.basic_catalog.clone());
        }

        supported
            .iter()
            .find_map(|id| self.catalog(id))
            .cloned()
            .ok_or_else(|| ManagerError::NoSupportedCatalog {
                available: self.catalogs.iter().map(|c| c.id.clone()).collect(),
            })
    }

    /// [`select_catalog`](Self::select_catalog), then prune to `allowed`.
    pub fn selected_catalog<S: AsRef<str>>(
        &self,
        capabilities: Option<&Value>,
        allowed: &[S],
    ) -> Result<Catalog, ManagerError> {
        Ok(self
            .select_catalog(capabilities)?
            .with_pruned_components(allowed))
    }

    /// Examples registered for `catalog`'s id; empty when none are.
    pub fn load_examples(&self, catalog: &Catalog, validate: bool) -> String {
        let Ok(id) = catalog.catalog_id() else {
            return String::new();
        };
        match self.catalogs.iter().find(|c| c.id == id) {
            Some(registered) => {
                catalog.load_examples(registered.examples_path.as_deref(), validate)
            }
            None => String::new(),
        }
    }
}
