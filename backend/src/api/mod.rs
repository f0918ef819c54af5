//! Form host.
//!
//! HTTP server, request/response types, the form page and the pipeline log
//! stream.

pub mod form;
pub mod logs;
pub mod page;
pub mod server;
pub mod types;

pub use form::FormState;
pub use logs::*;
pub use server::{router, start_server};
pub use types::*;
