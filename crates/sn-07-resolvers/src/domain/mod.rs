//! # Domain Module
//!
//! Topic names, the request envelope and errors.

pub mod errors;
pub mod request;
pub mod topics;

pub use errors::*;
pub use request::{RequestData, RequestDataType};
