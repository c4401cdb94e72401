//! # Blockform - list blocks for form editing
//!
//! Blockform edits, validates and stores **ordered, resizable lists** of
//! values described by a child block. A list travels through an HTML form as
//! flat fields and comes back as a structured value, with reordering and
//! deletion done in the browser resolved on the way in.
//!
//! ## Features
//!
//! - **Composable blocks**: text, integer and list blocks, lists of lists
//! - **Collect-all validation**: every bad item reported in one pass
//! - **Error redistribution**: one aggregate error, re-rendered per item
//! - **Client bootstrap**: new-row templates and initializer descriptors
//! - **HTTP surface**: editor pages and submission endpoints for configured blocks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockform::adapters::field_block::CharBlock;
//! use blockform::adapters::list_block::ListBlock;
//! use blockform::domain::{Block, FormData, FormFiles};
//!
//! let tags = ListBlock::new(CharBlock::new().max_length(40));
//! let data: FormData = [
//!     ("tags-count", "1"),
//!     ("tags-0-order", "0"),
//!     ("tags-0-value", "rust"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let value = tags.value_from_form(&data, &FormFiles::new(), "tags")?;
//! let cleaned = tags.clean(&value)?;
//! assert_eq!(tags.to_raw(&cleaned), serde_json::json!(["rust"]));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: the `Block` contract, form data types and errors
//! - **Adapters**: block kinds, the Tera renderer and HTTP handlers
//! - **Config**: settings and block definitions

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;

use crate::adapters::block_registry::BlockRegistry;
use crate::adapters::form_handler::{self, FormState};
use crate::adapters::health_handler::HealthHandler;
use crate::domain::TemplateRenderer;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates the Axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `registry` - Block definitions served under `/blocks/:name`
/// * `renderer` - Renderer used for editor pages
///
/// # Returns
///
/// Configured Axum Router
pub fn create_app(registry: Arc<BlockRegistry>, renderer: Arc<dyn TemplateRenderer>) -> Router {
    let health_handler = Arc::new(HealthHandler::new(registry.clone()));

    let public_router = Router::new().route(
        "/health",
        get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }),
    );

    let state = FormState { registry, renderer };

    let form_router = Router::new()
        .route("/blocks", get(form_handler::list_blocks))
        .route("/blocks/:name", post(form_handler::submit_form))
        .route("/blocks/:name/form", get(form_handler::get_form))
        .route("/blocks/:name/search", post(form_handler::search_content))
        .with_state(state);

    public_router
        .merge(form_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}
