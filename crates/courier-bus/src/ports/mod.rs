//! Ports Layer
//!
//! - Driving Ports (inbound): request handlers registered with a dispatcher
//! - Driven Ports (outbound): the shared queue store

pub mod inbound;
pub mod outbound;

pub use inbound::RequestHandler;
pub use outbound::QueueTransport;
