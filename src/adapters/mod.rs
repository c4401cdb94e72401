pub mod any_block;
pub mod block_registry;
pub mod field_block;
pub mod form_handler;
pub mod health_handler;
pub mod list_block;
pub mod renderer;
