//! Core block abstractions.
//!
//! A [`Block`] describes how one kind of value is edited in a form, validated,
//! converted to and from its JSON storage form, and rendered. Blocks compose:
//! a list block owns a child block and delegates every per-item concern to it
//! through this trait without knowing the child's concrete kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;

pub use error::{
    BlockError, BlockResult, ConfigIssue, ErrorKey, FormError, ListValidationError,
    ValidationError,
};

/// Prefix a new-item template is rendered under.
///
/// Client code substitutes the real slot prefix when a row is added. It
/// contains no digits so it can never be mistaken for a slot index.
pub const NEW_ITEM_PREFIX: &str = "__PREFIX__";

static DEFINITION_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Allocate a process-unique identifier for a block definition
pub fn next_definition_prefix() -> String {
    let id = DEFINITION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("blockdef-{}", id)
}

/// Flat form submission, one value per field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(HashMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A file uploaded alongside a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Uploaded files keyed by field name
#[derive(Debug, Clone, Default)]
pub struct FormFiles(HashMap<String, UploadedFile>);

impl FormFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&UploadedFile> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, file: UploadedFile) {
        self.0.insert(key.into(), file);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders named templates on behalf of blocks.
///
/// Blocks never load templates themselves; whoever drives the form supplies
/// the renderer.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &tera::Context) -> BlockResult<String>;
}

/// Declarative description of the client-side controller for a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInitializer {
    /// Name of the client-side constructor, e.g. `ListBlock`
    pub controller: String,
    pub definition_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_initializer: Option<Box<ClientInitializer>>,
}

impl fmt::Display for ClientInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut opts = vec![format!("'definitionPrefix': '{}'", self.definition_prefix)];
        if let Some(child) = &self.child_initializer {
            opts.push(format!("'childInitializer': {}", child));
        }
        write!(f, "{}({{\n{}\n}})", self.controller, opts.join(",\n"))
    }
}

/// The capability contract every block kind fulfils.
///
/// Implementations hold only immutable configuration, so one block can
/// serve any number of concurrent requests.
pub trait Block: Send + Sync {
    /// Native in-memory value edited by this block
    type Value: Clone + fmt::Debug + PartialEq + Send + Sync;

    /// Identifier used to key client-side artifacts for this definition
    fn definition_prefix(&self) -> &str;

    fn label(&self) -> Option<&str> {
        None
    }

    fn help_text(&self) -> Option<&str> {
        None
    }

    /// Value a fresh editor starts with
    fn get_default(&self) -> Self::Value;

    /// Convert stored JSON into the native value
    fn to_native(&self, raw: &Value) -> BlockResult<Self::Value>;

    /// Convert the native value into its JSON storage form
    fn to_raw(&self, value: &Self::Value) -> Value;

    /// Validate and normalise a value
    fn clean(&self, value: &Self::Value) -> Result<Self::Value, ValidationError>;

    /// Extract a value from flat form data whose fields start with `prefix`
    fn value_from_form(
        &self,
        data: &FormData,
        files: &FormFiles,
        prefix: &str,
    ) -> BlockResult<Self::Value>;

    /// Whether the submission carries no field for this block at all
    fn value_omitted_from_data(&self, data: &FormData, _files: &FormFiles, prefix: &str) -> bool {
        !data.contains_key(prefix)
    }

    /// Minimal HTML rendering used when no template is configured
    fn render_basic(&self, value: &Self::Value) -> String;

    fn render(&self, value: &Self::Value) -> String {
        self.render_basic(value)
    }

    /// Render the editing form for `value` under `prefix`.
    ///
    /// `errors` is whatever `clean` returned for this value, if anything.
    fn render_form(
        &self,
        value: &Self::Value,
        prefix: &str,
        errors: &[ValidationError],
        renderer: &dyn TemplateRenderer,
    ) -> BlockResult<String>;

    /// Text fed to a search index
    fn get_searchable_content(&self, _value: &Self::Value) -> Vec<String> {
        Vec::new()
    }

    /// Report configuration problems; never fails
    fn check(&self) -> Vec<ConfigIssue> {
        Vec::new()
    }

    fn bind(
        &self,
        value: Self::Value,
        prefix: impl Into<String>,
        errors: Vec<ValidationError>,
    ) -> BoundBlock<'_, Self>
    where
        Self: Sized,
    {
        BoundBlock {
            block: self,
            value,
            prefix: prefix.into(),
            errors,
        }
    }

    fn js_initializer(&self) -> Option<ClientInitializer> {
        None
    }

    /// Markup this definition needs once per page, independent of any value
    fn html_declarations(&self, _renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        Ok(String::new())
    }

    /// Declarations of this block and every block nested inside it
    fn all_html_declarations(&self, renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        self.html_declarations(renderer)
    }
}

/// A block paired with a value, prefix and errors, ready to be rendered
#[derive(Debug)]
pub struct BoundBlock<'a, B: Block> {
    pub block: &'a B,
    pub value: B::Value,
    pub prefix: String,
    pub errors: Vec<ValidationError>,
}

impl<B: Block> BoundBlock<'_, B> {
    pub fn render_form(&self, renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        self.block
            .render_form(&self.value, &self.prefix, &self.errors, renderer)
    }

    pub fn render(&self) -> String {
        self.block.render(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_prefix_is_not_an_index() {
        assert!(NEW_ITEM_PREFIX.parse::<i64>().is_err());
        assert!(!NEW_ITEM_PREFIX.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_definition_prefixes_are_unique() {
        let a = next_definition_prefix();
        let b = next_definition_prefix();
        assert_ne!(a, b);
        assert!(a.starts_with("blockdef-"));
    }

    #[test]
    fn test_client_initializer_display() {
        let init = ClientInitializer {
            controller: "ListBlock".to_string(),
            definition_prefix: "blockdef-7".to_string(),
            child_initializer: Some(Box::new(ClientInitializer {
                controller: "ListBlock".to_string(),
                definition_prefix: "blockdef-6".to_string(),
                child_initializer: None,
            })),
        };

        assert_eq!(
            init.to_string(),
            "ListBlock({\n'definitionPrefix': 'blockdef-7',\n'childInitializer': ListBlock({\n'definitionPrefix': 'blockdef-6'\n})\n})"
        );
    }

    #[test]
    fn test_form_data_from_pairs() {
        let data: FormData = [("items-count", "2"), ("items-0-order", "1")].into_iter().collect();
        assert_eq!(data.get("items-count"), Some("2"));
        assert!(data.contains_key("items-0-order"));
        assert!(!data.contains_key("items-1-order"));
    }
}
