//! # Resilience
//!
//! Malformed requests are skipped and reported, a panicking handler takes
//! down only its own task, and closing the broker ends its dispatchers.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use courier_bus::{BrokerConfigBuilder, QueueTransport, Responder};
    use courier_types::{Address, CorrelationId, Request, RouteId, ServiceId, WaitTimeout};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use crate::support::{spawn_dispatcher, Harness, GUARD};

    fn echo(payload: Value, responder: Responder) -> impl std::future::Future<Output = ()> + Send {
        async move {
            let _ = responder.respond_with(&payload).await;
        }
    }

    #[tokio::test]
    async fn test_malformed_items_do_not_stop_the_loop() {
        let harness = Harness::new(1).await;
        let address = Address::new(1, 2);
        let mut failures = harness.broker.decode_failures();

        let garbage: Vec<Vec<u8>> = vec![
            b"not json".to_vec(),
            br#"{"data":"missing id"}"#.to_vec(),
            br#"{"id":"not-a-uuid","data":1}"#.to_vec(),
            vec![0xff, 0xfe, 0x00],
        ];
        for item in &garbage {
            harness
                .transport
                .push_with_expiry(&address.key(), item.clone(), 60)
                .await
                .unwrap();
        }

        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(2), echo);
        let response = harness
            .broker
            .call(Request::new(address, "still alive"), WaitTimeout::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response, json!("still alive"));

        for expected in &garbage {
            let failure = timeout(GUARD, failures.recv()).await.expect("timeout").unwrap();
            assert_eq!(failure.address, address);
            assert_eq!(&failure.raw, expected);
            assert!(!failure.error.is_empty());
        }

        assert_eq!(harness.metrics.snapshot().decode_failures, garbage.len() as u64);
        assert!(!dispatcher.is_finished());
        dispatcher.abort();
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let harness = Harness::new(1).await;
        let address = Address::new(1, 3);

        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(3), |payload: Value, responder: Responder| async move {
            if payload == json!("boom") {
                panic!("handler blew up");
            }
            let _ = responder.respond_with(&payload).await;
        });

        let doomed = harness.broker.send(Request::new(address, "boom")).await.unwrap();
        let lost = harness.broker.wait(doomed, WaitTimeout::from_secs(1)).await;
        assert!(lost.unwrap_err().is_timeout());

        let response = harness
            .broker
            .call(Request::new(address, "fine"), WaitTimeout::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response, json!("fine"));

        let snapshot = harness.metrics.snapshot();
        assert_eq!(snapshot.handler_panics, 1);
        assert!(!dispatcher.is_finished());
        dispatcher.abort();
    }

    #[tokio::test]
    async fn test_slow_handler_does_not_block_dispatch() {
        let harness = Harness::new(1).await;
        let address = Address::new(1, 4);
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);

        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(4), move |payload: Value, responder: Responder| {
            let mut release = release_rx.clone();
            async move {
                if payload == json!("slow") {
                    let _ = release.wait_for(|r| *r).await;
                }
                let _ = responder.respond_with(&payload).await;
            }
        });

        let slow = harness.broker.send(Request::new(address, "slow")).await.unwrap();
        let fast = harness
            .broker
            .call(Request::new(address, "fast"), WaitTimeout::from_secs(5))
            .await
            .unwrap();
        assert_eq!(fast, json!("fast"));

        release_tx.send(true).unwrap();
        let slow = harness.broker.wait(slow, WaitTimeout::from_secs(5)).await.unwrap();
        assert_eq!(slow, json!("slow"));
        dispatcher.abort();
    }

    #[tokio::test]
    async fn test_close_ends_dispatchers_and_waiters() {
        let harness = Harness::new(1).await;
        let (started_tx, mut started_rx) = mpsc::unbounded_channel::<()>();

        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(5), move |_: Value, _: Responder| {
            let started_tx = started_tx.clone();
            async move {
                let _ = started_tx.send(());
            }
        });
        let waiter = {
            let broker = harness.broker.clone();
            let id = CorrelationId::generate();
            tokio::spawn(async move { broker.wait(id, WaitTimeout::Forever).await })
        };

        // The dispatcher is live before we close.
        harness
            .broker
            .send(Request::new(Address::new(1, 5), json!(null)))
            .await
            .unwrap();
        timeout(GUARD, started_rx.recv()).await.expect("timeout").unwrap();

        harness.broker.close().await;

        let served = timeout(GUARD, dispatcher).await.expect("timeout").unwrap();
        assert!(served.unwrap_err().is_closed());
        let waited = timeout(GUARD, waiter).await.expect("timeout").unwrap();
        assert!(waited.unwrap_err().is_closed());

        let send = harness
            .broker
            .send(Request::new(Address::new(1, 5), json!(null)))
            .await;
        assert!(send.unwrap_err().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_dispatcher_leaves_requests_queued() {
        let config = BrokerConfigBuilder::new(ServiceId(1))
            .max_in_flight(2)
            .build()
            .unwrap();
        let harness = Harness::with_config(config).await;
        let address = Address::new(1, 6);

        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(6), |_: Value, _: Responder| async move {
            // Never finishes within the test.
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        for i in 0..5 {
            harness.broker.send(Request::new(address, i)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(harness.metrics.snapshot().handlers_in_flight, 2);
        assert_eq!(harness.transport.len(&address.key()), 3);
        dispatcher.abort();
    }
}
