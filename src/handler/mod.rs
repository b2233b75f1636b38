//! Request handler module
//!
//! A handler is built per request by a registered factory and asked to render
//! exactly once. The `render` method is required, so a handler that does not
//! implement it never compiles.

mod registry;

pub use registry::{HandlerFactory, HandlerRegistry};

use crate::error::HandlerError;
use crate::response::Render;

/// Result of running a handler
pub type HandlerResult = Result<Render, HandlerError>;

/// Per-request handler
pub trait Responder {
    /// Run the handler and describe the response
    fn render(&mut self) -> HandlerResult;
}
