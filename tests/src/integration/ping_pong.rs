//! # Ping/Pong Scenario
//!
//! ```text
//! send({service: 1, route: 2, data: "ping"}) → id
//! receive(route 2): handler("ping", responder) → respond("pong")
//! wait(id, 5s) → "pong"
//! ```

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use courier_bus::BrokerConfig;
    use courier_runtime::config::{DemoSection, NodeConfig};
    use courier_runtime::demo::{PingPongService, PING, PONG};
    use courier_runtime::NodeRuntime;
    use courier_types::{Address, Request, ServiceId, WaitTimeout};
    use serde_json::json;
    use tokio::time::{timeout, Instant};

    use crate::support::{Harness, GUARD};

    fn demo_on_route_2() -> DemoSection {
        DemoSection {
            route: 2,
            ..DemoSection::default()
        }
    }

    #[tokio::test]
    async fn test_ping_answered_with_pong_within_five_seconds() {
        let server = Harness::new(1).await;
        let service = PingPongService::new(server.broker.clone(), &demo_on_route_2());
        let serving = tokio::spawn(async move { service.serve().await });

        // A different service does the asking.
        let client = server.peer(BrokerConfig::new(ServiceId(7))).await;

        let started = Instant::now();
        let id = client
            .send(Request::new(Address::new(1, 2), PING))
            .await
            .unwrap();
        let response = client.wait(id, WaitTimeout::from_secs(5)).await.unwrap();

        assert_eq!(response, json!(PONG));
        assert!(started.elapsed() < Duration::from_secs(5));
        serving.abort();
    }

    #[tokio::test]
    async fn test_many_concurrent_pings() {
        let server = Harness::new(1).await;
        let service = PingPongService::new(server.broker.clone(), &demo_on_route_2());
        let serving = {
            let service = service.clone();
            tokio::spawn(async move { service.serve().await })
        };

        let pings: Vec<_> = (0..50)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.ping_once().await })
            })
            .collect();

        for ping in pings {
            let response = timeout(GUARD, ping).await.expect("timeout").unwrap().unwrap();
            assert_eq!(response, json!(PONG));
        }

        let snapshot = server.metrics.snapshot();
        assert_eq!(snapshot.requests_received, 50);
        assert_eq!(snapshot.responses_sent, 50);
        serving.abort();
    }

    #[tokio::test]
    async fn test_node_runtime_round_trip_and_shutdown() {
        let harness = Harness::new(1).await;
        let config = NodeConfig {
            demo: DemoSection {
                route: 2,
                interval_secs: 1,
                ..DemoSection::default()
            },
            ..NodeConfig::default()
        };

        let mut runtime = NodeRuntime::new(harness.broker.clone(), config);
        runtime.start();

        // The runtime's own requester pings every second; wait for a pong.
        timeout(GUARD, async {
            while harness.metrics.snapshot().responses_collected == 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("no pong collected");

        timeout(Duration::from_secs(10), runtime.shutdown())
            .await
            .expect("shutdown hung");
        assert!(harness.transport.is_closed());
    }
}
