//! Responder contract module
//!
//! Handlers return a [`Render`]; the framework turns it into a
//! [`ResponseEnvelope`] whose body always carries `status_code` and `success`.

mod envelope;
mod render;

pub use envelope::{
    compute_body, is_success, is_valid_status, ResponseEnvelope, DEFAULT_CONTENT_TYPE,
    DEFAULT_STATUS,
};
pub use render::Render;
