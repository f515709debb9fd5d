//! Mock HTTP server for the remote-store tests, or a skip when the sandbox
//! has no loopback networking.
//!
//! `FILES_DOWNLOADER_REQUIRE_SOCKET_TESTS=1` turns a skip into a failure, so
//! CI cannot pass without actually exercising the HTTP store.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "FILES_DOWNLOADER_REQUIRE_SOCKET_TESTS";

fn skipping_is_fatal() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` after reporting why the test is skipped.
#[track_caller]
pub fn start_mock_server_or_skip() -> impl Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let loopback_ok = TcpListener::bind("127.0.0.1:0").is_ok();
    async move {
        if loopback_ok {
            return Some(MockServer::start().await);
        }
        let reason = format!(
            "HTTP store test at {}:{} needs a localhost socket",
            caller.file(),
            caller.line()
        );
        assert!(!skipping_is_fatal(), "{reason}; {REQUIRE_ENV} is set");
        eprintln!("{reason}; skipping (set {REQUIRE_ENV}=1 to fail instead)");
        None
    }
}
