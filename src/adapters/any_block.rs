//! Block kinds chosen at runtime.
//!
//! Block trees built from configuration can't name their value types at
//! compile time, so [`AnyBlock`] wraps each supported kind and [`AnyValue`]
//! carries the matching value.

use serde::Serialize;
use serde_json::Value;

use crate::adapters::field_block::{CharBlock, IntegerBlock};
use crate::adapters::list_block::ListBlock;
use crate::domain::{
    Block, BlockError, BlockResult, ClientInitializer, ConfigIssue, FormData, FormFiles,
    TemplateRenderer, ValidationError,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnyValue {
    Text(String),
    Integer(Option<i64>),
    List(Vec<AnyValue>),
}

impl AnyValue {
    fn kind(&self) -> &'static str {
        match self {
            AnyValue::Text(_) => "text",
            AnyValue::Integer(_) => "integer",
            AnyValue::List(_) => "list",
        }
    }

    /// JSON form of the value regardless of which block produced it
    pub fn to_json(&self) -> Value {
        match self {
            AnyValue::Text(s) => Value::String(s.clone()),
            AnyValue::Integer(n) => n.map(Value::from).unwrap_or(Value::Null),
            AnyValue::List(items) => Value::Array(items.iter().map(AnyValue::to_json).collect()),
        }
    }
}

#[derive(Debug)]
pub enum AnyBlock {
    Char(CharBlock),
    Integer(IntegerBlock),
    List(Box<ListBlock<AnyBlock>>),
}

impl AnyBlock {
    fn kind(&self) -> &'static str {
        match self {
            AnyBlock::Char(_) => "text",
            AnyBlock::Integer(_) => "integer",
            AnyBlock::List(_) => "list",
        }
    }

    fn mismatch(&self, value: &AnyValue) -> String {
        format!(
            "{} block was given a {} value",
            self.kind(),
            value.kind()
        )
    }
}

impl From<CharBlock> for AnyBlock {
    fn from(block: CharBlock) -> Self {
        AnyBlock::Char(block)
    }
}

impl From<IntegerBlock> for AnyBlock {
    fn from(block: IntegerBlock) -> Self {
        AnyBlock::Integer(block)
    }
}

impl From<ListBlock<AnyBlock>> for AnyBlock {
    fn from(block: ListBlock<AnyBlock>) -> Self {
        AnyBlock::List(Box::new(block))
    }
}

impl Block for AnyBlock {
    type Value = AnyValue;

    fn definition_prefix(&self) -> &str {
        match self {
            AnyBlock::Char(b) => b.definition_prefix(),
            AnyBlock::Integer(b) => b.definition_prefix(),
            AnyBlock::List(b) => b.definition_prefix(),
        }
    }

    fn label(&self) -> Option<&str> {
        match self {
            AnyBlock::Char(b) => b.label(),
            AnyBlock::Integer(b) => b.label(),
            AnyBlock::List(b) => b.label(),
        }
    }

    fn help_text(&self) -> Option<&str> {
        match self {
            AnyBlock::Char(b) => b.help_text(),
            AnyBlock::Integer(b) => b.help_text(),
            AnyBlock::List(b) => b.help_text(),
        }
    }

    fn get_default(&self) -> AnyValue {
        match self {
            AnyBlock::Char(b) => AnyValue::Text(b.get_default()),
            AnyBlock::Integer(b) => AnyValue::Integer(b.get_default()),
            AnyBlock::List(b) => AnyValue::List(b.get_default()),
        }
    }

    fn to_native(&self, raw: &Value) -> BlockResult<AnyValue> {
        match self {
            AnyBlock::Char(b) => b.to_native(raw).map(AnyValue::Text),
            AnyBlock::Integer(b) => b.to_native(raw).map(AnyValue::Integer),
            AnyBlock::List(b) => b.to_native(raw).map(AnyValue::List),
        }
    }

    fn to_raw(&self, value: &AnyValue) -> Value {
        match (self, value) {
            (AnyBlock::Char(b), AnyValue::Text(v)) => b.to_raw(v),
            (AnyBlock::Integer(b), AnyValue::Integer(v)) => b.to_raw(v),
            (AnyBlock::List(b), AnyValue::List(v)) => b.to_raw(v),
            (_, other) => other.to_json(),
        }
    }

    fn clean(&self, value: &AnyValue) -> Result<AnyValue, ValidationError> {
        match (self, value) {
            (AnyBlock::Char(b), AnyValue::Text(v)) => b.clean(v).map(AnyValue::Text),
            (AnyBlock::Integer(b), AnyValue::Integer(v)) => b.clean(v).map(AnyValue::Integer),
            (AnyBlock::List(b), AnyValue::List(v)) => b.clean(v).map(AnyValue::List),
            (_, other) => Err(ValidationError::invalid(self.mismatch(other))),
        }
    }

    fn value_from_form(
        &self,
        data: &FormData,
        files: &FormFiles,
        prefix: &str,
    ) -> BlockResult<AnyValue> {
        match self {
            AnyBlock::Char(b) => b.value_from_form(data, files, prefix).map(AnyValue::Text),
            AnyBlock::Integer(b) => b.value_from_form(data, files, prefix).map(AnyValue::Integer),
            AnyBlock::List(b) => b.value_from_form(data, files, prefix).map(AnyValue::List),
        }
    }

    fn value_omitted_from_data(&self, data: &FormData, files: &FormFiles, prefix: &str) -> bool {
        match self {
            AnyBlock::Char(b) => b.value_omitted_from_data(data, files, prefix),
            AnyBlock::Integer(b) => b.value_omitted_from_data(data, files, prefix),
            AnyBlock::List(b) => b.value_omitted_from_data(data, files, prefix),
        }
    }

    fn render_basic(&self, value: &AnyValue) -> String {
        match (self, value) {
            (AnyBlock::Char(b), AnyValue::Text(v)) => b.render_basic(v),
            (AnyBlock::Integer(b), AnyValue::Integer(v)) => b.render_basic(v),
            (AnyBlock::List(b), AnyValue::List(v)) => b.render_basic(v),
            (_, other) => {
                tracing::warn!("{}", self.mismatch(other));
                String::new()
            }
        }
    }

    fn render_form(
        &self,
        value: &AnyValue,
        prefix: &str,
        errors: &[ValidationError],
        renderer: &dyn TemplateRenderer,
    ) -> BlockResult<String> {
        match (self, value) {
            (AnyBlock::Char(b), AnyValue::Text(v)) => b.render_form(v, prefix, errors, renderer),
            (AnyBlock::Integer(b), AnyValue::Integer(v)) => {
                b.render_form(v, prefix, errors, renderer)
            }
            (AnyBlock::List(b), AnyValue::List(v)) => b.render_form(v, prefix, errors, renderer),
            (_, other) => Err(BlockError::Contract(self.mismatch(other))),
        }
    }

    fn get_searchable_content(&self, value: &AnyValue) -> Vec<String> {
        match (self, value) {
            (AnyBlock::Char(b), AnyValue::Text(v)) => b.get_searchable_content(v),
            (AnyBlock::Integer(b), AnyValue::Integer(v)) => b.get_searchable_content(v),
            (AnyBlock::List(b), AnyValue::List(v)) => b.get_searchable_content(v),
            _ => Vec::new(),
        }
    }

    fn check(&self) -> Vec<ConfigIssue> {
        match self {
            AnyBlock::Char(b) => b.check(),
            AnyBlock::Integer(b) => b.check(),
            AnyBlock::List(b) => b.check(),
        }
    }

    fn js_initializer(&self) -> Option<ClientInitializer> {
        match self {
            AnyBlock::Char(b) => b.js_initializer(),
            AnyBlock::Integer(b) => b.js_initializer(),
            AnyBlock::List(b) => b.js_initializer(),
        }
    }

    fn html_declarations(&self, renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        match self {
            AnyBlock::Char(b) => b.html_declarations(renderer),
            AnyBlock::Integer(b) => b.html_declarations(renderer),
            AnyBlock::List(b) => b.html_declarations(renderer),
        }
    }

    fn all_html_declarations(&self, renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        match self {
            AnyBlock::Char(b) => b.all_html_declarations(renderer),
            AnyBlock::Integer(b) => b.all_html_declarations(renderer),
            AnyBlock::List(b) => b.all_html_declarations(renderer),
        }
    }
}
