//! Service Layer
//!
//! The broker and the pieces it hands out: dispatchers for serving routes
//! and responders for answering requests.

pub mod broker;
pub mod dispatcher;
pub mod responder;

pub use broker::{Broker, DECODE_FAILURE_CHANNEL_CAPACITY};
pub use dispatcher::DecodeFailure;
pub use responder::Responder;
