//! Shared helpers for unit tests.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::client::Peer;
use crate::types::ClientId;

const WAIT: Duration = Duration::from_secs(2);

/// A peer wired to a receiver standing in for its connection.
pub fn member(name: &str) -> (Peer, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Peer::new(ClientId::new(), name.to_string(), tx), rx)
}

/// Read from a connection until `needle` shows up; returns everything read.
pub async fn expect_text(rx: &mut mpsc::UnboundedReceiver<String>, needle: &str) -> String {
    let mut seen = String::new();
    while !seen.contains(needle) {
        match timeout(WAIT, rx.recv()).await {
            Ok(Some(chunk)) => seen.push_str(&chunk),
            Ok(None) => panic!("connection closed waiting for {:?}; got {:?}", needle, seen),
            Err(_) => panic!("timed out waiting for {:?}; got {:?}", needle, seen),
        }
    }
    seen
}

/// Drain whatever arrives within a short window.
pub async fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    let mut seen = String::new();
    while let Ok(Some(chunk)) = timeout(Duration::from_millis(100), rx.recv()).await {
        seen.push_str(&chunk);
    }
    seen
}

/// Give spawned announcement tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
