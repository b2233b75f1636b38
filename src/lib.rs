//! jsonroute
//!
//! A small JSON web framework. Requests are matched exactly on `(METHOD, path)`
//! against a static route table, dispatched to a registered handler, and answered
//! with a JSON envelope carrying `status_code` and `success` ahead of the
//! handler's own fields.

pub mod adapter;
pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod logger;
pub mod request;
pub mod response;
pub mod routing;
pub mod server;

pub use adapter::{AdapterRegistry, HyperAdapter, ServerAdapter};
pub use app::{Application, ApplicationBuilder};
pub use config::Config;
pub use error::{ConfigError, DispatchError, HandlerError, RequestError, RoutingError};
pub use handler::{HandlerRegistry, HandlerResult, Responder};
pub use request::{Params, Request};
pub use response::{Render, ResponseEnvelope};
pub use routing::{RouteTable, RouteTableBuilder};
