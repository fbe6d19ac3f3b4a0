//! Lookup of content types by reader name and of asset formats.
//!
//! A registry is filled by an explicit registration step and then only read. The
//! process wide instance is installed once with [`install`] and fetched with
//! [`global`], which falls back to [`TypeRegistry::with_defaults`].

use std::sync::OnceLock;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::content::primitive::PrimitiveContentType;
use crate::content::{reachable, xna, ContentTypeRef};
use crate::format::{AssetFormatRef, FormatList};
use crate::qualifier::TypeQualifier;

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

/// Content types keyed by reader name, plus the asset formats built on them
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: IndexMap<TypeQualifier, ContentTypeRef>,
    formats: FormatList,
}

impl TypeRegistry {
    /// An empty registry
    pub fn new() -> TypeRegistry {
        TypeRegistry::default()
    }

    /// Primitives, XNA value types and every built-in FEZ asset
    pub fn with_defaults() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for handler in PrimitiveContentType::all().iter().chain(&xna::all()) {
            registry.register(handler);
        }

        #[cfg(feature = "serde")]
        for format in crate::assets::formats() {
            registry.register_format(format);
        }
        #[cfg(not(feature = "serde"))]
        for handler in crate::assets::content_types() {
            registry.register(&handler);
        }

        registry
    }

    /// Register `handler` and every handler it delegates to
    ///
    /// The first handler registered under a reader name is kept.
    pub fn register(&mut self, handler: &ContentTypeRef) {
        for handler in reachable(handler) {
            let name = handler.name().clone();
            if self.types.contains_key(&name) {
                debug!(%name, "content type already registered");
                continue;
            }
            self.types.insert(name, handler);
        }
    }

    /// Register an asset format and its content types
    pub fn register_format(&mut self, format: AssetFormatRef) {
        if self.formats.find_by_qualifier(format.primary().name()).is_some() {
            warn!(format = format.name(), "another format already handles this primary type");
        }
        self.register(format.primary());
        for handler in format.content_types() {
            self.register(&handler);
        }
        self.formats.add(format);
    }

    /// Handler for a reader name
    pub fn by_qualifier(&self, qualifier: &TypeQualifier) -> Option<&ContentTypeRef> {
        self.types.get(qualifier)
    }

    /// Handler for a serialized reader name
    pub fn by_name(&self, name: &str) -> Option<&ContentTypeRef> {
        TypeQualifier::parse(name)
            .ok()
            .and_then(|q| self.by_qualifier(&q))
    }

    pub fn formats(&self) -> &FormatList {
        &self.formats
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered handlers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ContentTypeRef> {
        self.types.values()
    }
}

/// Install the process wide registry
///
/// Only the first call has an effect; later ones log a warning and return the
/// registry already in place.
pub fn install(registry: TypeRegistry) -> &'static TypeRegistry {
    let mut pending = Some(registry);
    let installed = GLOBAL.get_or_init(|| pending.take().unwrap_or_default());
    if pending.is_some() {
        warn!("a type registry is already installed");
    }
    installed
}

/// The process wide registry, the defaults if none was installed
pub fn global() -> &'static TypeRegistry {
    GLOBAL.get_or_init(TypeRegistry::with_defaults)
}
