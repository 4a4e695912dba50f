//! Inbound Ports (Driving Ports)
//!
//! What application code plugs into a dispatcher.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use crate::service::Responder;

/// Application logic for one route (Driving Port)
///
/// Called once per decoded request, on its own task. The handler decides
/// whether, when and how often to answer through the [`Responder`]; a handler
/// that never responds simply leaves the caller to time out.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(&self, payload: Value, responder: Responder);
}

/// Closures are handlers:
///
/// ```ignore
/// broker.receive(RouteId(1), |payload, responder: Responder| async move {
///     let _ = responder.respond_with(&payload).await;
/// }).await?;
/// ```
#[async_trait]
impl<F, Fut> RequestHandler for F
where
    F: Fn(Value, Responder) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, payload: Value, responder: Responder) {
        (self)(payload, responder).await;
    }
}
