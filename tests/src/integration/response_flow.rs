//! # Response Flow
//!
//! ```text
//! [Handler] ──respond──→ "{correlation id}" ──BLPOP──→ [Waiter]
//! ```
//!
//! A waiter consumes exactly one response; a second wait on the same id
//! finds nothing.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use courier_bus::{BrokerConfigBuilder, BrokerError, Responder};
    use courier_types::{CorrelationId, Request, Response, RouteId, ServiceId, Ttl, WaitTimeout};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use tokio::time::{timeout, Instant};

    use crate::support::{spawn_dispatcher, Harness, GUARD};

    #[tokio::test(start_paused = true)]
    async fn test_response_is_consumed_once() {
        let harness = Harness::new(1).await;
        let id = CorrelationId::generate();

        harness
            .broker
            .responder(id)
            .respond(Response::new(json!({"status": "ok", "items": [1, 2]})))
            .await
            .unwrap();

        let first = harness.broker.wait(id, WaitTimeout::from_secs(5)).await.unwrap();
        assert_eq!(first, json!({"status": "ok", "items": [1, 2]}));

        let second = harness.broker.wait(id, WaitTimeout::from_secs(1)).await;
        assert!(matches!(second, Err(BrokerError::Timeout { correlation_id, .. }) if correlation_id == id));
        assert!(!harness.transport.contains_key(&id.as_key()));

        let snapshot = harness.metrics.snapshot();
        assert_eq!(snapshot.responses_sent, 1);
        assert_eq!(snapshot.responses_collected, 1);
        assert_eq!(snapshot.wait_timeouts, 1);
    }

    #[tokio::test]
    async fn test_unanswered_wait_times_out_in_about_a_second() {
        let harness = Harness::new(1).await;
        let id = harness
            .broker
            .send(Request::new(harness.broker.address(RouteId(1)), "nobody listens"))
            .await
            .unwrap();

        let started = Instant::now();
        let result = timeout(GUARD, harness.broker.wait(id, WaitTimeout::from_secs(1)))
            .await
            .expect("wait blocked past its timeout");
        let elapsed = started.elapsed();

        assert!(result.unwrap_err().is_timeout());
        assert!(elapsed >= Duration::from_millis(900), "returned early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "returned late: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_forever_waits_for_a_late_response() {
        let harness = Harness::new(1).await;
        let id = CorrelationId::generate();

        let waiter = {
            let broker = harness.broker.clone();
            tokio::spawn(async move { broker.wait(id, WaitTimeout::Forever).await })
        };

        // Well past any finite default, then answer.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(!waiter.is_finished());

        harness.broker.responder(id).respond_with("late").await.unwrap();

        let response = timeout(GUARD, waiter).await.expect("timeout").unwrap().unwrap();
        assert_eq!(response, json!("late"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_seconds_means_forever() {
        assert_eq!(WaitTimeout::from_secs(0), WaitTimeout::Forever);

        let harness = Harness::new(1).await;
        let id = CorrelationId::generate();
        let waiter = {
            let broker = harness.broker.clone();
            tokio::spawn(async move { broker.wait(id, WaitTimeout::from_secs(0)).await })
        };

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!waiter.is_finished());
        waiter.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_queue_expires_when_uncollected() {
        let config = BrokerConfigBuilder::new(ServiceId(1))
            .response_ttl_secs(10)
            .build()
            .unwrap();
        let harness = Harness::with_config(config).await;
        let id = CorrelationId::generate();

        harness.broker.responder(id).respond_with("too late").await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;

        let result = harness.broker.wait(id, WaitTimeout::from_secs(1)).await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_response_ttl_overrides_default() {
        let harness = Harness::new(1).await;
        let id = CorrelationId::generate();

        harness
            .broker
            .responder(id)
            .respond(Response::new("short lived").with_ttl(Ttl::from_secs(2)))
            .await
            .unwrap();

        let remaining = harness.transport.ttl_remaining(&id.as_key()).unwrap();
        assert!(remaining <= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_handler_may_respond_more_than_once() {
        let harness = Harness::new(1).await;
        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(6), |payload: Value, responder: Responder| async move {
            let _ = responder.respond_with(&json!({"part": 1, "of": payload})).await;
            let _ = responder.respond_with(&json!({"part": 2, "of": payload})).await;
        });

        let id = harness
            .broker
            .send(Request::new(harness.broker.address(RouteId(6)), "stream"))
            .await
            .unwrap();

        let first = harness.broker.wait(id, WaitTimeout::from_secs(5)).await.unwrap();
        let second = harness.broker.wait(id, WaitTimeout::from_secs(5)).await.unwrap();
        assert_eq!(first, json!({"part": 1, "of": "stream"}));
        assert_eq!(second, json!({"part": 2, "of": "stream"}));
        dispatcher.abort();
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Quote {
        symbol: String,
        price_cents: u64,
    }

    #[tokio::test]
    async fn test_typed_call() {
        let harness = Harness::new(2).await;
        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(1), |payload: Value, responder: Responder| async move {
            let symbol = payload.as_str().unwrap_or_default().to_string();
            let _ = responder
                .respond_with(&Quote {
                    symbol,
                    price_cents: 12_345,
                })
                .await;
        });

        let quote: Quote = harness
            .broker
            .call_as(
                Request::new(harness.broker.address(RouteId(1)), "ACME"),
                WaitTimeout::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(
            quote,
            Quote {
                symbol: "ACME".to_string(),
                price_cents: 12_345,
            }
        );
        dispatcher.abort();
    }
}
