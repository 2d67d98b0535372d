use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pmucore::core::PhasorResult;
use pmucore::sink::{result_channel, spawn_sink_task, ResultSink, TracingSink};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout, Duration};

struct CollectingSink {
    seen: Arc<Mutex<Vec<u64>>>,
    fail_on: Option<u64>,
}

#[async_trait]
impl ResultSink for CollectingSink {
    async fn deliver(&mut self, result: PhasorResult) -> Result<()> {
        if self.fail_on == Some(result.frame_index) {
            return Err(anyhow!("link down"));
        }
        self.seen.lock().unwrap().push(result.frame_index);
        Ok(())
    }
}

fn result(frame_index: u64) -> PhasorResult {
    PhasorResult {
        frame_index,
        timestamp_us: frame_index * 20_000,
        estimates: Default::default(),
    }
}

#[tokio::test]
async fn test_sink_drains_in_order_until_disconnect() {
    let (publisher, rx) = result_channel(4).unwrap();
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectingSink {
        seen: seen.clone(),
        fail_on: None,
    };
    let handle = spawn_sink_task(rx, sink, shutdown_rx);

    for i in 1..=3 {
        assert!(publisher.publish(result(i)));
    }
    drop(publisher);

    let delivered = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap().unwrap();
    assert_eq!(delivered, 3);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_delivery_failure_does_not_stop_sink() {
    let (publisher, rx) = result_channel(4).unwrap();
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectingSink {
        seen: seen.clone(),
        fail_on: Some(2),
    };
    let handle = spawn_sink_task(rx, sink, shutdown_rx);

    for i in 1..=3 {
        publisher.publish(result(i));
    }
    drop(publisher);

    let delivered = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap().unwrap();
    assert_eq!(delivered, 2);
    assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
}

#[tokio::test]
async fn test_shutdown_ends_sink_with_publisher_alive() {
    let (publisher, rx) = result_channel(4).unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = spawn_sink_task(rx, TracingSink::new(), shutdown_rx);

    publisher.publish(result(1));
    sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(()).unwrap();

    let delivered = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap().unwrap();
    assert_eq!(delivered, 1);
    assert_eq!(publisher.results_dropped(), 0);
}

#[tokio::test]
async fn test_tracing_sink_counts_deliveries() {
    let mut sink = TracingSink::new();
    sink.deliver(result(1)).await.unwrap();
    sink.deliver(result(2)).await.unwrap();
    assert_eq!(sink.delivered(), 2);
}
