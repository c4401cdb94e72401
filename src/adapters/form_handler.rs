//! HTTP handlers for editing and submitting configured blocks
//!
//! Each block is served under its registry name, which doubles as the form
//! field prefix of its editor.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tera::Context;

use crate::adapters::any_block::{AnyBlock, AnyValue};
use crate::adapters::block_registry::BlockRegistry;
use crate::domain::{
    Block, BlockError, BlockResult, FormData, FormFiles, TemplateRenderer, ValidationError,
};

const PAGE_TEMPLATE: &str = "form_page.html";

/// Shared state for form handlers
#[derive(Clone)]
pub struct FormState {
    pub registry: Arc<BlockRegistry>,
    pub renderer: Arc<dyn TemplateRenderer>,
}

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockSummary {
    pub name: String,
    pub definition_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResult {
    /// Cleaned value in its stored (raw) form
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub content: Vec<String>,
}

/// Malformed input is the client's fault; anything else is ours
fn status_for(err: &BlockError) -> StatusCode {
    match err {
        BlockError::Form(_) | BlockError::Conversion(_) => StatusCode::BAD_REQUEST,
        BlockError::Contract(_) | BlockError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: BlockError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Block handling failed: {}", err);
    } else {
        tracing::warn!("Rejected submission: {}", err);
    }
    (status, Json(ApiResponse::<()>::error(err.to_string()))).into_response()
}

fn not_found(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(format!("Block '{}' not found", name))),
    )
        .into_response()
}

/// Full editor page: the form, the block's client declarations and its initializer
fn render_page(
    renderer: &dyn TemplateRenderer,
    name: &str,
    block: &AnyBlock,
    value: &AnyValue,
    errors: &[ValidationError],
) -> BlockResult<String> {
    let mut context = Context::new();
    context.insert("title", block.label().unwrap_or(name));
    context.insert("name", name);
    context.insert("form_html", &block.render_form(value, name, errors, renderer)?);
    context.insert("declarations", &block.all_html_declarations(renderer)?);
    context.insert(
        "initializer",
        &block
            .js_initializer()
            .map(|init| init.to_string())
            .unwrap_or_default(),
    );
    renderer.render(PAGE_TEMPLATE, &context)
}

/// GET /blocks
pub async fn list_blocks(State(state): State<FormState>) -> impl IntoResponse {
    let blocks: Vec<BlockSummary> = state
        .registry
        .iter()
        .map(|b| BlockSummary {
            name: b.name.clone(),
            definition_prefix: b.block.definition_prefix().to_string(),
            label: b.block.label().map(str::to_string),
            initializer: b.block.js_initializer().map(|init| init.to_string()),
        })
        .collect();

    (StatusCode::OK, Json(ApiResponse::success(blocks)))
}

/// GET /blocks/:name/form
pub async fn get_form(State(state): State<FormState>, Path(name): Path<String>) -> Response {
    let Some(block) = state.registry.get(&name) else {
        return not_found(&name);
    };

    match render_page(
        state.renderer.as_ref(),
        &name,
        block,
        &block.get_default(),
        &[],
    ) {
        Ok(html) => (StatusCode::OK, Html(html)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /blocks/:name
///
/// A valid submission answers with the cleaned raw value; an invalid one
/// re-renders the editor with every error next to the item that caused it.
pub async fn submit_form(
    State(state): State<FormState>,
    Path(name): Path<String>,
    Form(data): Form<FormData>,
) -> Response {
    let Some(block) = state.registry.get(&name) else {
        return not_found(&name);
    };

    let files = FormFiles::new();
    if block.value_omitted_from_data(&data, &files, &name) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(format!(
                "No data submitted for block '{}'",
                name
            ))),
        )
            .into_response();
    }

    let value = match block.value_from_form(&data, &files, &name) {
        Ok(value) => value,
        Err(e) => return error_response(e),
    };

    match block.clean(&value) {
        Ok(cleaned) => {
            tracing::debug!("Block '{}' accepted a submission", name);
            (
                StatusCode::OK,
                Json(ApiResponse::success(SubmitResult {
                    value: block.to_raw(&cleaned),
                })),
            )
                .into_response()
        }
        Err(err) => {
            tracing::debug!("Block '{}' rejected a submission: {:?}", name, err.messages());
            match render_page(state.renderer.as_ref(), &name, block, &value, &[err]) {
                Ok(html) => (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response(),
                Err(e) => error_response(e),
            }
        }
    }
}

/// POST /blocks/:name/search
pub async fn search_content(
    State(state): State<FormState>,
    Path(name): Path<String>,
    Json(raw): Json<Value>,
) -> Response {
    let Some(block) = state.registry.get(&name) else {
        return not_found(&name);
    };

    match block.to_native(&raw) {
        Ok(value) => (
            StatusCode::OK,
            Json(ApiResponse::success(SearchResult {
                content: block.get_searchable_content(&value),
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
