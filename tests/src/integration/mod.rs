//! End-to-end broker behaviour over the in-memory transport, plus live
//! Redis checks that only run with `--ignored`.

pub mod expiry;
pub mod ping_pong;
pub mod resilience;
pub mod response_flow;
