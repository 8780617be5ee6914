//! Shared harness: run the relay over in-memory pipes against a mock server.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use arcpoint_mcp::error::RelayError;
use arcpoint_mcp::relay::run_relay;
use arcpoint_mcp_core::{OutputSink, RelayConfig};

const PIPE_CAPACITY: usize = 1 << 20;
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// A running relay plus the client-side ends of its stdio.
pub struct RelayHarness {
    input: Option<DuplexStream>,
    output: BufReader<DuplexStream>,
    pub shutdown: CancellationToken,
    handle: JoinHandle<Result<(), RelayError>>,
}

impl RelayHarness {
    pub fn start(config: RelayConfig) -> Self {
        let (input, relay_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (relay_out, output) = tokio::io::duplex(PIPE_CAPACITY);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_relay(
            Arc::new(config),
            relay_in,
            OutputSink::new(relay_out),
            shutdown.clone(),
        ));
        Self {
            input: Some(input),
            output: BufReader::new(output),
            shutdown,
            handle,
        }
    }

    pub async fn send(&mut self, data: &str) {
        let input = self.input.as_mut().expect("input still open");
        input.write_all(data.as_bytes()).await.expect("write input");
    }

    /// Signal EOF on the relay's input.
    pub fn close_input(&mut self) {
        drop(self.input.take());
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Next output line, without its terminator.
    pub async fn next_line(&mut self) -> String {
        let mut line = String::new();
        let read = tokio::time::timeout(Duration::from_secs(5), self.output.read_line(&mut line))
            .await
            .expect("output line within 5s")
            .expect("read output");
        assert!(read > 0, "output closed before a line arrived");
        line.truncate(line.trim_end_matches('\n').len());
        line
    }

    /// Close input and wait for the relay to stop on its own.
    pub async fn finish(mut self) -> (Result<(), RelayError>, String) {
        self.close_input();
        self.join().await
    }

    /// Close input, signal shutdown and wait for the relay to stop.
    pub async fn stop(mut self) -> (Result<(), RelayError>, String) {
        self.close_input();
        self.shutdown.cancel();
        self.join().await
    }

    async fn join(mut self) -> (Result<(), RelayError>, String) {
        let result = tokio::time::timeout(STOP_TIMEOUT, self.handle)
            .await
            .expect("relay stops")
            .expect("relay task not panicked");
        let mut out = String::new();
        self.output
            .read_to_string(&mut out)
            .await
            .expect("read output");
        (result, out)
    }
}

/// Poll until the mock server has seen `at_least` requests matching `method`.
pub async fn wait_for_requests(server: &wiremock::MockServer, method: &str, at_least: usize) {
    for _ in 0..500 {
        let seen = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == method)
            .count();
        if seen >= at_least {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected at least {at_least} {method} requests");
}
