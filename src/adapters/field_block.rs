//! Single-input field blocks.
//!
//! These are the leaf kinds a list block usually wraps: a text input and an
//! integer input, each rendered through `block_forms/field.html`.

use serde_json::Value;
use tera::Context;

use crate::domain::{
    next_definition_prefix, Block, BlockError, BlockResult, ConfigIssue, FormData, FormError,
    FormFiles, TemplateRenderer, ValidationError,
};

const FIELD_TEMPLATE: &str = "block_forms/field.html";
const REQUIRED_MESSAGE: &str = "This field is required.";

fn field_context(
    prefix: &str,
    input_type: &str,
    value: &str,
    required: bool,
    label: Option<&str>,
    help_text: Option<&str>,
    errors: &[ValidationError],
) -> Context {
    let messages: Vec<String> = errors.iter().flat_map(|e| e.messages()).collect();

    let mut context = Context::new();
    context.insert("prefix", prefix);
    context.insert("input_type", input_type);
    context.insert("value", value);
    context.insert("required", &required);
    context.insert("label", &label);
    context.insert("help_text", &help_text);
    context.insert("errors", &messages);
    context
}

/// Single-line text input
#[derive(Debug, Clone)]
pub struct CharBlock {
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    default: String,
    label: Option<String>,
    help_text: Option<String>,
    definition_prefix: String,
}

impl Default for CharBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl CharBlock {
    pub fn new() -> Self {
        Self {
            required: true,
            min_length: None,
            max_length: None,
            default: String::new(),
            label: None,
            help_text: None,
            definition_prefix: next_definition_prefix(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }
}

impl Block for CharBlock {
    type Value = String;

    fn definition_prefix(&self) -> &str {
        &self.definition_prefix
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    fn get_default(&self) -> String {
        self.default.clone()
    }

    fn to_native(&self, raw: &Value) -> BlockResult<String> {
        match raw {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(BlockError::Conversion(format!(
                "expected text, got {}",
                other
            ))),
        }
    }

    fn to_raw(&self, value: &String) -> Value {
        Value::String(value.clone())
    }

    fn clean(&self, value: &String) -> Result<String, ValidationError> {
        let cleaned = value.trim();
        if cleaned.is_empty() {
            if self.required {
                return Err(ValidationError::invalid(REQUIRED_MESSAGE));
            }
            return Ok(String::new());
        }

        let length = cleaned.chars().count();
        if let Some(max) = self.max_length {
            if length > max {
                return Err(ValidationError::invalid(format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max, length
                )));
            }
        }
        if let Some(min) = self.min_length {
            if length < min {
                return Err(ValidationError::invalid(format!(
                    "Ensure this value has at least {} characters (it has {}).",
                    min, length
                )));
            }
        }

        Ok(cleaned.to_string())
    }

    fn value_from_form(
        &self,
        data: &FormData,
        _files: &FormFiles,
        prefix: &str,
    ) -> BlockResult<String> {
        Ok(data.get(prefix).unwrap_or_default().to_string())
    }

    fn render_basic(&self, value: &String) -> String {
        tera::escape_html(value)
    }

    fn render_form(
        &self,
        value: &String,
        prefix: &str,
        errors: &[ValidationError],
        renderer: &dyn TemplateRenderer,
    ) -> BlockResult<String> {
        let context = field_context(
            prefix,
            "text",
            value,
            self.required,
            self.label.as_deref(),
            self.help_text.as_deref(),
            errors,
        );
        renderer.render(FIELD_TEMPLATE, &context)
    }

    fn get_searchable_content(&self, value: &String) -> Vec<String> {
        vec![value.clone()]
    }

    fn check(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                issues.push(ConfigIssue::ContradictoryBounds {
                    field: "length".to_string(),
                    min: min as i64,
                    max: max as i64,
                });
            }
        }
        issues
    }
}

/// Whole-number input; an empty input is `None`
#[derive(Debug, Clone)]
pub struct IntegerBlock {
    required: bool,
    min_value: Option<i64>,
    max_value: Option<i64>,
    default: Option<i64>,
    label: Option<String>,
    help_text: Option<String>,
    definition_prefix: String,
}

impl Default for IntegerBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegerBlock {
    pub fn new() -> Self {
        Self {
            required: true,
            min_value: None,
            max_value: None,
            default: None,
            label: None,
            help_text: None,
            definition_prefix: next_definition_prefix(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_value(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    pub fn max_value(mut self, max_value: i64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    pub fn default_value(mut self, default: i64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }
}

impl Block for IntegerBlock {
    type Value = Option<i64>;

    fn definition_prefix(&self) -> &str {
        &self.definition_prefix
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    fn get_default(&self) -> Option<i64> {
        self.default
    }

    fn to_native(&self, raw: &Value) -> BlockResult<Option<i64>> {
        match raw {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| BlockError::Conversion(format!("{} is not a whole number", n))),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| BlockError::Conversion(format!("{:?} is not a whole number", s))),
            other => Err(BlockError::Conversion(format!(
                "expected a whole number, got {}",
                other
            ))),
        }
    }

    fn to_raw(&self, value: &Option<i64>) -> Value {
        value.map(Value::from).unwrap_or(Value::Null)
    }

    fn clean(&self, value: &Option<i64>) -> Result<Option<i64>, ValidationError> {
        let Some(number) = *value else {
            if self.required {
                return Err(ValidationError::invalid(REQUIRED_MESSAGE));
            }
            return Ok(None);
        };

        if let Some(max) = self.max_value {
            if number > max {
                return Err(ValidationError::invalid(format!(
                    "Ensure this value is less than or equal to {}.",
                    max
                )));
            }
        }
        if let Some(min) = self.min_value {
            if number < min {
                return Err(ValidationError::invalid(format!(
                    "Ensure this value is greater than or equal to {}.",
                    min
                )));
            }
        }

        Ok(Some(number))
    }

    /// Browsers submit an empty string for a number input holding anything
    /// unparseable, so non-numeric text here comes from a broken client.
    fn value_from_form(
        &self,
        data: &FormData,
        _files: &FormFiles,
        prefix: &str,
    ) -> BlockResult<Option<i64>> {
        let raw = data.get(prefix).unwrap_or_default().trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(|_| {
            BlockError::Form(FormError::NotAnInteger {
                field: prefix.to_string(),
                value: raw.to_string(),
            })
        })
    }

    fn render_basic(&self, value: &Option<i64>) -> String {
        value.map(|n| n.to_string()).unwrap_or_default()
    }

    fn render_form(
        &self,
        value: &Option<i64>,
        prefix: &str,
        errors: &[ValidationError],
        renderer: &dyn TemplateRenderer,
    ) -> BlockResult<String> {
        let context = field_context(
            prefix,
            "number",
            &self.render_basic(value),
            self.required,
            self.label.as_deref(),
            self.help_text.as_deref(),
            errors,
        );
        renderer.render(FIELD_TEMPLATE, &context)
    }

    fn check(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                issues.push(ConfigIssue::ContradictoryBounds {
                    field: "value".to_string(),
                    min,
                    max,
                });
            }
        }
        issues
    }
}
