//! Bridges broker metrics hooks into the Prometheus collectors.

use std::time::Duration;

use courier_bus::MetricsRecorder;
use courier_telemetry::{
    DECODE_FAILURES, HANDLERS_IN_FLIGHT, HANDLER_PANICS, REQUESTS_RECEIVED, REQUESTS_SENT,
    RESPONSES_COLLECTED, RESPONSES_SENT, WAIT_DURATION, WAIT_TIMEOUTS,
};
use courier_types::Address;

fn address_label(address: &Address) -> String {
    address.key()
}

/// [`MetricsRecorder`] backed by the global Prometheus registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusRecorder;

impl MetricsRecorder for PrometheusRecorder {
    fn record_request_sent(&self, address: &Address) {
        REQUESTS_SENT.with_label_values(&[address_label(address).as_str()]).inc();
    }

    fn record_request_received(&self, address: &Address) {
        REQUESTS_RECEIVED.with_label_values(&[address_label(address).as_str()]).inc();
    }

    fn record_response_sent(&self) {
        RESPONSES_SENT.inc();
    }

    fn record_response_collected(&self, waited: Duration) {
        RESPONSES_COLLECTED.inc();
        WAIT_DURATION.observe(waited.as_secs_f64());
    }

    fn record_wait_timeout(&self) {
        WAIT_TIMEOUTS.inc();
    }

    fn record_decode_failure(&self, address: &Address) {
        DECODE_FAILURES.with_label_values(&[address_label(address).as_str()]).inc();
    }

    fn record_handler_panic(&self, address: &Address) {
        HANDLER_PANICS.with_label_values(&[address_label(address).as_str()]).inc();
    }

    fn record_handler_started(&self) {
        HANDLERS_IN_FLIGHT.inc();
    }

    fn record_handler_finished(&self) {
        HANDLERS_IN_FLIGHT.dec();
    }
}
