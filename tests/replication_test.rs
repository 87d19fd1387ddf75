//! Multi-node replication over real HTTP.
//!
//! Each node is a server on 127.0.0.1:0 plus a `SyncEngine` driven with
//! `run_once`, so cycle ordering is explicit.

use clipsync::server;
use clipsync::state::ReplicatedValue;
use clipsync::store::MemoryStore;
use clipsync::sync::SyncEngine;
use clipsync::transport::{build_client, HttpPeer, PeerClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

struct TestNode {
    url: String,
    state: Arc<ReplicatedValue>,
    shutdown: broadcast::Sender<()>,
}

impl TestNode {
    async fn start(initial: &str) -> anyhow::Result<Self> {
        let state = Arc::new(ReplicatedValue::new(
            Arc::new(MemoryStore::new(initial)),
            initial,
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);
        let (shutdown, rx) = broadcast::channel(1);
        tokio::spawn(server::serve(listener, state.clone(), rx));
        Ok(Self {
            url,
            state,
            shutdown,
        })
    }

    fn engine(&self, peers: &[&String]) -> anyhow::Result<SyncEngine> {
        let client = build_client(Duration::from_secs(2))?;
        let peers = peers
            .iter()
            .map(|url| {
                Arc::new(HttpPeer::new(url.as_str(), client.clone())) as Arc<dyn PeerClient>
            })
            .collect();
        Ok(SyncEngine::new(
            self.state.clone(),
            peers,
            Duration::from_secs(5),
        ))
    }

    async fn post(&self, text: &str) -> anyhow::Result<()> {
        let response = reqwest::Client::new()
            .post(format!("{}/clipboard", self.url))
            .body(text.to_string())
            .send()
            .await?;
        anyhow::ensure!(response.status().is_success(), "POST failed");
        Ok(())
    }

    async fn get(&self) -> anyhow::Result<String> {
        Ok(reqwest::get(format!("{}/clipboard", self.url))
            .await?
            .text()
            .await?)
    }
}

/// Address with nothing listening on it
async fn dead_url() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    drop(listener);
    Ok(url)
}

#[tokio::test]
async fn test_write_on_a_visible_on_b() -> anyhow::Result<()> {
    let a = TestNode::start("").await?;
    let b = TestNode::start("").await?;
    let a_engine = a.engine(&[&b.url])?;
    let b_engine = b.engine(&[&a.url])?;

    a.post("copied on a").await?;
    a_engine.run_once().await;
    b_engine.run_once().await;

    assert_eq!(b.get().await?, "copied on a");
    assert_eq!(a.get().await?, "copied on a");
    Ok(())
}

#[tokio::test]
async fn test_b_converges_by_pull_when_push_missed() -> anyhow::Result<()> {
    let a = TestNode::start("").await?;
    let b = TestNode::start("").await?;
    let a_engine = a.engine(&[&b.url])?;
    let b_engine = b.engine(&[&a.url])?;

    // B is down while A pushes
    let _ = b.shutdown.send(());
    tokio::time::sleep(Duration::from_millis(100)).await;
    a.post("while b was away").await?;
    let stats = a_engine.run_once().await;
    assert_eq!(stats.push_failed, 1);

    // B's clipboard state survives (same process), B pulls from A
    let b_again = {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);
        let (shutdown, rx) = broadcast::channel(1);
        tokio::spawn(server::serve(listener, b.state.clone(), rx));
        TestNode {
            url,
            state: b.state.clone(),
            shutdown,
        }
    };
    let stats = b_engine.run_once().await;
    assert_eq!(stats.merged, 1);
    assert_eq!(b_again.get().await?, "while b was away");
    Ok(())
}

#[tokio::test]
async fn test_conflicting_writes_resolve_by_cycle_order() -> anyhow::Result<()> {
    let a = TestNode::start("base").await?;
    let b = TestNode::start("base").await?;
    let a_engine = a.engine(&[&b.url])?;
    let b_engine = b.engine(&[&a.url])?;

    a.post("from a").await?;
    b.post("from b").await?;

    // A's cycle runs first: its push overwrites B's unpushed write
    a_engine.run_once().await;
    b_engine.run_once().await;

    assert_eq!(a.get().await?, "from a");
    assert_eq!(b.get().await?, "from a");

    // Other order on a fresh pair: B wins
    let c = TestNode::start("base").await?;
    let d = TestNode::start("base").await?;
    let c_engine = c.engine(&[&d.url])?;
    let d_engine = d.engine(&[&c.url])?;

    c.post("from c").await?;
    d.post("from d").await?;
    d_engine.run_once().await;
    c_engine.run_once().await;

    assert_eq!(c.get().await?, "from d");
    assert_eq!(d.get().await?, "from d");
    Ok(())
}

#[tokio::test]
async fn test_last_peer_in_pull_order_wins() -> anyhow::Result<()> {
    let a = TestNode::start("a").await?;
    let b = TestNode::start("b").await?;
    let c = TestNode::start("c").await?;

    let stats = a.engine(&[&b.url, &c.url])?.run_once().await;
    assert!(stats.push_skipped);
    assert_eq!(stats.merged, 2);
    assert_eq!(a.get().await?, "c");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_peer_does_not_block_others() -> anyhow::Result<()> {
    let a = TestNode::start("").await?;
    let b = TestNode::start("").await?;
    let dead = dead_url().await?;

    a.post("hello").await?;
    let stats = a.engine(&[&dead, &b.url])?.run_once().await;

    assert_eq!(stats.push_failed, 1);
    assert_eq!(stats.pushed, 1);
    assert_eq!(stats.fetch_failed, 1);
    assert_eq!(stats.fetched, 1);
    assert_eq!(b.get().await?, "hello");
    Ok(())
}

#[tokio::test]
async fn test_three_node_ring_converges() -> anyhow::Result<()> {
    let a = TestNode::start("").await?;
    let b = TestNode::start("").await?;
    let c = TestNode::start("").await?;
    let a_engine = a.engine(&[&b.url, &c.url])?;
    let b_engine = b.engine(&[&c.url, &a.url])?;
    let c_engine = c.engine(&[&a.url, &b.url])?;

    c.post("from c").await?;
    for _ in 0..2 {
        a_engine.run_once().await;
        b_engine.run_once().await;
        c_engine.run_once().await;
    }

    for node in [&a, &b, &c] {
        assert_eq!(node.get().await?, "from c");
    }
    Ok(())
}
