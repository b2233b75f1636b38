//! Routing module
//!
//! Exact-match routing:
//! - Route table keyed by uppercase method and literal path
//! - Dispatcher separating "unknown path" from "method not allowed"

mod dispatch;
mod table;

pub use dispatch::{classify, resolve, Resolution};
pub use table::{RouteEntry, RouteTable, RouteTableBuilder};
