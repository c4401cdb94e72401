//! Ordered, resizable list of values of one child block.
//!
//! On the wire a list is a flat set of form fields:
//!
//! ```text
//! {prefix}-count            number of slots submitted
//! {prefix}-{j}-deleted      non-empty when the slot was removed client-side
//! {prefix}-{j}-order        position of the slot after client-side reordering
//! {prefix}-{j}-value...     the child block's own fields
//! ```
//!
//! Slots are identified by `j`, which is fixed when the slot is rendered;
//! the submitted `order` decides where the value lands in the list.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tera::Context;
use tracing::{debug, warn};

use crate::domain::{
    next_definition_prefix, Block, BlockError, BlockResult, ClientInitializer, ConfigIssue,
    ErrorKey, FormData, FormError, FormFiles, ListValidationError, TemplateRenderer,
    ValidationError, NEW_ITEM_PREFIX,
};

const LIST_TEMPLATE: &str = "block_forms/list.html";
const LIST_MEMBER_TEMPLATE: &str = "block_forms/list_member.html";

/// Construction options for a [`ListBlock`]
#[derive(Debug, Clone)]
pub struct ListBlockOptions<V> {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Starting value of an empty editor; `[child default]` when unset
    pub default: Option<Vec<V>>,
    pub label: Option<String>,
    pub help_text: Option<String>,
}

impl<V> Default for ListBlockOptions<V> {
    fn default() -> Self {
        Self {
            min_length: None,
            max_length: None,
            default: None,
            label: None,
            help_text: None,
        }
    }
}

/// A list of values edited, validated and stored through one child block
#[derive(Debug)]
pub struct ListBlock<B: Block> {
    child: B,
    min_length: Option<usize>,
    max_length: Option<usize>,
    default: Vec<B::Value>,
    label: Option<String>,
    help_text: Option<String>,
    definition_prefix: String,
}

/// An editor never starts with zero rows: without an explicit default the
/// list holds one child-default item.
fn resolve_default<B: Block>(explicit: Option<Vec<B::Value>>, child: &B) -> Vec<B::Value> {
    explicit.unwrap_or_else(|| vec![child.get_default()])
}

/// Keep a rendered fragment from closing the `<script>` element it is
/// embedded in: each `</script>` (or already escaped `<-/script>`) gains a dash.
fn escape_script(text: &str) -> String {
    static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
    // Literal pattern; cannot fail once the escape tests pass
    let re = SCRIPT_RE.get_or_init(|| Regex::new(r"<(-*)/script>").expect("valid regex"));
    re.replace_all(text, "<-$1/script>").into_owned()
}

fn parse_int_field<T: std::str::FromStr>(data: &FormData, field: &str) -> Result<T, FormError> {
    let raw = data
        .get(field)
        .ok_or_else(|| FormError::MissingField(field.to_string()))?;
    raw.trim().parse().map_err(|_| FormError::NotAnInteger {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

impl<B: Block> ListBlock<B> {
    pub fn new(child: B) -> Self {
        Self::with_options(child, ListBlockOptions::default())
    }

    /// Build a list of `B` using the child's no-argument constructor
    pub fn of() -> Self
    where
        B: Default,
    {
        Self::new(B::default())
    }

    pub fn with_options(child: B, options: ListBlockOptions<B::Value>) -> Self {
        let default = resolve_default(options.default, &child);
        Self {
            child,
            min_length: options.min_length,
            max_length: options.max_length,
            default,
            label: options.label,
            help_text: options.help_text,
            definition_prefix: next_definition_prefix(),
        }
    }

    pub fn child(&self) -> &B {
        &self.child
    }

    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Render one slot: hidden deleted/order fields, controls and the child's
    /// own form under `{prefix}-value`.
    fn render_list_member(
        &self,
        value: &B::Value,
        prefix: &str,
        index: Option<usize>,
        errors: &[ValidationError],
        renderer: &dyn TemplateRenderer,
    ) -> BlockResult<String> {
        let child = self
            .child
            .bind(value.clone(), format!("{}-value", prefix), errors.to_vec());

        let mut context = Context::new();
        context.insert("prefix", prefix);
        context.insert("index", &index.map(|i| i.to_string()).unwrap_or_default());
        context.insert("child_html", &child.render_form(renderer)?);
        renderer.render(LIST_MEMBER_TEMPLATE, &context)
    }

    /// The fragment a client clones when the user adds a row: one slot at
    /// [`NEW_ITEM_PREFIX`] holding the child's default value.
    pub fn new_item_template(&self, renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        self.render_list_member(
            &self.child.get_default(),
            NEW_ITEM_PREFIX,
            None,
            &[],
            renderer,
        )
    }
}

/// Errors handed to `render_form`, split into what each item gets and what
/// is shown once for the whole list.
struct ErrorDistribution<'a> {
    items: Option<&'a ListValidationError>,
    list_messages: Vec<String>,
}

impl<'a> ErrorDistribution<'a> {
    fn from_errors(errors: &'a [ValidationError]) -> BlockResult<Self> {
        if errors.len() > 1 {
            // clean() reports a list's failures as exactly one aggregate
            return Err(BlockError::Contract(
                "ListBlock.render_form unexpectedly received multiple errors".to_string(),
            ));
        }

        Ok(match errors.first() {
            None => Self {
                items: None,
                list_messages: Vec::new(),
            },
            Some(ValidationError::List(list)) => Self {
                items: Some(list),
                list_messages: list
                    .list_errors()
                    .unwrap_or_default()
                    .iter()
                    .flat_map(|e| e.messages())
                    .collect(),
            },
            Some(other) => Self {
                items: None,
                list_messages: other.messages(),
            },
        })
    }

    fn for_item(&self, index: usize) -> &'a [ValidationError] {
        self.items
            .and_then(|list| list.item_errors(index))
            .unwrap_or_default()
    }
}

impl<B: Block> Block for ListBlock<B> {
    type Value = Vec<B::Value>;

    fn definition_prefix(&self) -> &str {
        &self.definition_prefix
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    fn get_default(&self) -> Vec<B::Value> {
        self.default.clone()
    }

    fn to_native(&self, raw: &Value) -> BlockResult<Vec<B::Value>> {
        let items = raw.as_array().ok_or_else(|| {
            BlockError::Conversion(format!("expected a list, got {}", raw))
        })?;
        items.iter().map(|item| self.child.to_native(item)).collect()
    }

    fn to_raw(&self, value: &Vec<B::Value>) -> Value {
        Value::Array(value.iter().map(|item| self.child.to_raw(item)).collect())
    }

    /// Every item is cleaned even after one fails, so a single pass reports
    /// all bad items. Length bounds are checked independently.
    fn clean(&self, value: &Vec<B::Value>) -> Result<Vec<B::Value>, ValidationError> {
        let mut result = Vec::with_capacity(value.len());
        let mut errors = ListValidationError::new();

        for (index, item) in value.iter().enumerate() {
            match self.child.clean(item) {
                Ok(cleaned) => result.push(cleaned),
                Err(e) => errors.push(ErrorKey::Item(index), e),
            }
        }

        if let Some(max) = self.max_length {
            if value.len() > max {
                errors.push(
                    ErrorKey::ListLevel,
                    ValidationError::invalid(format!("Maximum of {} is reached", max)),
                );
            }
        }

        if let Some(min) = self.min_length {
            if value.len() < min {
                errors.push(
                    ErrorKey::ListLevel,
                    ValidationError::invalid(format!("Minimum of {} is required", min)),
                );
            }
        }

        if errors.is_empty() {
            Ok(result)
        } else {
            debug!(
                definition = %self.definition_prefix,
                failed_keys = errors.len(),
                "List validation failed"
            );
            Err(ValidationError::List(errors))
        }
    }

    fn value_from_form(
        &self,
        data: &FormData,
        files: &FormFiles,
        prefix: &str,
    ) -> BlockResult<Vec<B::Value>> {
        let count: usize = parse_int_field(data, &format!("{}-count", prefix)).map_err(|e| {
            warn!(prefix = %prefix, "Malformed list submission: {}", e);
            e
        })?;

        // count is untrusted; every live slot needs its own order field
        let mut slots = Vec::with_capacity(count.min(data.len()));
        for slot in 0..count {
            let deleted = data
                .get(&format!("{}-{}-deleted", prefix, slot))
                .is_some_and(|flag| !flag.is_empty());
            if deleted {
                continue;
            }

            let order: i64 = parse_int_field(data, &format!("{}-{}-order", prefix, slot))?;
            let value =
                self.child
                    .value_from_form(data, files, &format!("{}-{}-value", prefix, slot))?;
            slots.push((order, slot, value));
        }

        // Equal orders fall back to submission position
        slots.sort_by_key(|(order, slot, _)| (*order, *slot));

        debug!(prefix = %prefix, submitted = count, kept = slots.len(), "Decoded list form data");
        Ok(slots.into_iter().map(|(_, _, value)| value).collect())
    }

    fn value_omitted_from_data(&self, data: &FormData, _files: &FormFiles, prefix: &str) -> bool {
        !data.contains_key(&format!("{}-count", prefix))
    }

    fn render_basic(&self, value: &Vec<B::Value>) -> String {
        let children: Vec<String> = value
            .iter()
            .map(|item| format!("<li>{}</li>", self.child.render(item)))
            .collect();
        format!("<ul>{}</ul>", children.join("\n"))
    }

    fn render_form(
        &self,
        value: &Vec<B::Value>,
        prefix: &str,
        errors: &[ValidationError],
        renderer: &dyn TemplateRenderer,
    ) -> BlockResult<String> {
        let distribution = ErrorDistribution::from_errors(errors)?;

        let list_members_html = value
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.render_list_member(
                    item,
                    &format!("{}-{}", prefix, index),
                    Some(index),
                    distribution.for_item(index),
                    renderer,
                )
            })
            .collect::<BlockResult<Vec<String>>>()?;

        let mut context = Context::new();
        context.insert("help_text", &self.help_text);
        context.insert("prefix", prefix);
        context.insert("list_members_html", &list_members_html);
        context.insert("block_errors", &distribution.list_messages);
        renderer.render(LIST_TEMPLATE, &context)
    }

    fn get_searchable_content(&self, value: &Vec<B::Value>) -> Vec<String> {
        value
            .iter()
            .flat_map(|item| self.child.get_searchable_content(item))
            .collect()
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
        issues.extend(self.child.check());
        issues
    }

    fn js_initializer(&self) -> Option<ClientInitializer> {
        Some(ClientInitializer {
            controller: "ListBlock".to_string(),
            definition_prefix: self.definition_prefix.clone(),
            child_initializer: self.child.js_initializer().map(Box::new),
        })
    }

    fn html_declarations(&self, renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        let member_html = self.new_item_template(renderer)?;
        Ok(format!(
            r#"<script type="text/template" id="{}-newmember">{}</script>"#,
            self.definition_prefix,
            escape_script(&member_html)
        ))
    }

    fn all_html_declarations(&self, renderer: &dyn TemplateRenderer) -> BlockResult<String> {
        let child = self.child.all_html_declarations(renderer)?;
        let own = self.html_declarations(renderer)?;
        if child.is_empty() {
            Ok(own)
        } else {
            Ok(format!("{}\n{}", child, own))
        }
    }
}
