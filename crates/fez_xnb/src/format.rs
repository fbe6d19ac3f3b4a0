//! Asset formats: converters between a container's object tree and an external file.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::content::{reachable, ContentTypeRef};
use crate::error::Result;
use crate::qualifier::TypeQualifier;
use crate::value::TypedObject;

/// Shared handle to an asset format
pub type AssetFormatRef = Arc<dyn AssetFormat>;

/// Converts one kind of asset to and from its external representation
pub trait AssetFormat: Debug + Send + Sync {
    /// Human readable name, e.g. `TrackedSong`
    fn name(&self) -> &str;

    /// External file extension including the leading dot, e.g. `.fezsong.json`
    fn extension(&self) -> &str;

    /// Handler of the container's primary object
    fn primary(&self) -> &ContentTypeRef;

    /// Handlers written to the type table, primary first
    fn content_types(&self) -> Vec<ContentTypeRef> {
        reachable(self.primary())
    }

    /// Encode an object tree as the external file
    fn to_external(&self, object: &TypedObject) -> Result<Vec<u8>>;

    /// Decode the external file into an object tree
    fn from_external(&self, data: &[u8]) -> Result<TypedObject>;
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// Ordered list of formats, searched first match wins
#[derive(Debug, Default, Clone)]
pub struct FormatList {
    formats: Vec<AssetFormatRef>,
}

impl FormatList {
    pub fn new() -> FormatList {
        FormatList::default()
    }

    pub fn add(&mut self, format: AssetFormatRef) {
        self.formats.push(format);
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetFormatRef> {
        self.formats.iter()
    }

    /// Format whose extension equals `extension`, ignoring case and the leading dot
    pub fn find_by_extension(&self, extension: &str) -> Option<&AssetFormatRef> {
        let wanted = normalize(extension);
        self.formats
            .iter()
            .find(|f| normalize(f.extension()) == wanted)
    }

    /// Format whose primary handler reads `qualifier`
    pub fn find_by_qualifier(&self, qualifier: &TypeQualifier) -> Option<&AssetFormatRef> {
        self.formats.iter().find(|f| f.primary().name() == qualifier)
    }

    /// Format whose extension ends the file name of `path`
    ///
    /// Extensions may span several dots, so the longest matching one wins.
    pub fn find_for_path(&self, path: &Path) -> Option<&AssetFormatRef> {
        let file_name = path.file_name()?.to_str()?.to_ascii_lowercase();
        self.formats
            .iter()
            .filter(|f| {
                let extension = normalize(f.extension());
                file_name
                    .strip_suffix(&extension)
                    .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
            })
            .max_by_key(|f| f.extension().len())
    }
}

impl<'a> IntoIterator for &'a FormatList {
    type Item = &'a AssetFormatRef;
    type IntoIter = std::slice::Iter<'a, AssetFormatRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.formats.iter()
    }
}

#[cfg(feature = "serde")]
pub use self::json::JsonFormat;

#[cfg(feature = "serde")]
mod json {
    use bon::Builder;
    use tracing::instrument;

    use super::AssetFormat;
    use crate::content::{reachable, ContentTypeRef};
    use crate::error::{Error, Result};
    use crate::value::TypedObject;

    /// Projects an object tree to pretty printed JSON through its handlers
    #[derive(Debug, Builder)]
    pub struct JsonFormat {
        #[builder(into)]
        name: String,

        #[builder(into)]
        extension: String,

        primary: ContentTypeRef,

        /// Type table to write, defaults to every handler reachable from `primary`
        content_types: Option<Vec<ContentTypeRef>>,
    }

    impl AssetFormat for JsonFormat {
        fn name(&self) -> &str {
            &self.name
        }

        fn extension(&self) -> &str {
            &self.extension
        }

        fn primary(&self) -> &ContentTypeRef {
            &self.primary
        }

        fn content_types(&self) -> Vec<ContentTypeRef> {
            self.content_types
                .clone()
                .unwrap_or_else(|| reachable(&self.primary))
        }

        #[instrument(skip_all, fields(format = %self.name))]
        fn to_external(&self, object: &TypedObject) -> Result<Vec<u8>> {
            if object.content_type.name() != self.primary.name() {
                return Err(Error::TypeMismatch {
                    expected: self.primary.name().to_string(),
                    found: object.content_type.name().to_string(),
                });
            }
            let json = self.primary.to_json(&object.value)?;
            let mut data = serde_json::to_vec_pretty(&json)?;
            data.push(b'\n');
            Ok(data)
        }

        #[instrument(skip_all, fields(format = %self.name))]
        fn from_external(&self, data: &[u8]) -> Result<TypedObject> {
            let json: serde_json::Value = serde_json::from_slice(data)?;
            let value = self.primary.from_json(&json)?;
            Ok(TypedObject::new(self.primary.clone(), value))
        }
    }
}
