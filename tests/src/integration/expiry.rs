//! # Whole-Queue Expiry
//!
//! TTLs apply to the address queue, not to single items. Every send resets
//! the queue's clock; once it runs out, everything still buffered is gone.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use courier_bus::{BrokerConfigBuilder, Responder};
    use courier_types::{Address, Request, RouteId, ServiceId, Ttl};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use crate::support::{spawn_dispatcher, Harness};

    #[tokio::test(start_paused = true)]
    async fn test_unconsumed_request_expires_before_late_receive() {
        let config = BrokerConfigBuilder::new(ServiceId(1))
            .request_ttl_secs(5)
            .build()
            .unwrap();
        let harness = Harness::with_config(config).await;
        let address = Address::new(1, 2);

        harness.broker.send(Request::new(address, "stale")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!harness.transport.contains_key(&address.key()));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = spawn_dispatcher(&harness.broker, RouteId(2), move |payload: Value, _: Responder| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(payload);
            }
        });

        let nothing = timeout(Duration::from_secs(30), rx.recv()).await;
        assert!(nothing.is_err(), "expired request was delivered");

        // The dispatcher itself is healthy: a fresh request goes through.
        harness.broker.send(Request::new(address, "fresh")).await.unwrap();
        let seen = timeout(Duration::from_secs(5), rx.recv()).await.expect("timeout").unwrap();
        assert_eq!(seen, json!("fresh"));
        dispatcher.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_send_extends_buffered_items() {
        let harness = Harness::new(1).await;
        let address = Address::new(1, 3);

        harness
            .broker
            .send(Request::new(address, "first").with_ttl(Ttl::from_secs(4)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        harness
            .broker
            .send(Request::new(address, "second").with_ttl(Ttl::from_secs(4)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;

        // Six seconds after the first send, both are still there.
        assert_eq!(harness.transport.len(&address.key()), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffered_items_lost_together() {
        let harness = Harness::new(1).await;
        let address = Address::new(1, 4);

        for label in ["a", "b", "c"] {
            harness
                .broker
                .send(Request::new(address, label).with_ttl(Ttl::from_secs(2)))
                .await
                .unwrap();
        }
        assert_eq!(harness.transport.len(&address.key()), 3);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(harness.transport.len(&address.key()), 0);
        assert!(!harness.transport.contains_key(&address.key()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_queues_unaffected() {
        let harness = Harness::new(1).await;
        let short = Address::new(1, 5);
        let long = Address::new(1, 6);

        harness
            .broker
            .send(Request::new(short, 1).with_ttl(Ttl::from_secs(1)))
            .await
            .unwrap();
        harness
            .broker
            .send(Request::new(long, 2).with_ttl(Ttl::from_secs(100)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!harness.transport.contains_key(&short.key()));
        assert_eq!(harness.transport.len(&long.key()), 1);
    }
}
