//! Mock API server startup for sandboxes without loopback networking.
//!
//! Tests that talk HTTP to a wiremock server are skipped (with a note on
//! stderr) when no localhost port can be bound. CI sets
//! `IKFETCH_STRICT_HTTP_TESTS=1` so a missing loopback fails loudly instead.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const STRICT_ENV: &str = "IKFETCH_STRICT_HTTP_TESTS";

fn strict() -> bool {
    std::env::var(STRICT_ENV).is_ok_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

/// Starts a mock API server, or returns `None` when loopback is unavailable.
#[track_caller]
pub fn start_mock_api_or_skip() -> impl std::future::Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let loopback = TcpListener::bind("127.0.0.1:0").is_ok();

    async move {
        if loopback {
            return Some(MockServer::start().await);
        }
        let note = format!(
            "{}:{}: no loopback socket, mock API server unavailable",
            caller.file(),
            caller.line()
        );
        assert!(!strict(), "{note} ({STRICT_ENV} is set)");
        eprintln!("skipping: {note}");
        None
    }
}
