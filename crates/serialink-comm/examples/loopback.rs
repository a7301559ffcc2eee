//! Loopback demo: scan, connect, and stream newline-delimited records
//! through an in-memory transport.
//!
//! Run with `cargo run -p serialink-comm --example loopback`.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use serialink_comm::{
    Communicator, CommunicatorConfig, Event, LinkEvent, PeerAddr, PeerDevice, RadioAdapter,
    Result, ScanEvent, StreamPair, StreamTransport,
};

// ----------------------------------------------------------------------------
// Demo Radio
// ----------------------------------------------------------------------------

/// Radio that reports one nearby peer as soon as a scan starts
struct DemoRadio {
    peer: PeerDevice,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ScanEvent>>>,
}

#[async_trait]
impl RadioAdapter for DemoRadio {
    fn is_present(&self) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn bonded_peers(&self) -> Vec<PeerDevice> {
        vec![self.peer.clone()]
    }

    async fn start_scan(&self) -> Result<()> {
        self.subscribers.lock().unwrap().retain(|tx| {
            tx.send(ScanEvent::PeerFound(self.peer.clone())).is_ok()
                && tx.send(ScanEvent::Finished).is_ok()
        });
        Ok(())
    }

    async fn cancel_scan(&self) {}

    fn subscribe_scan_events(&self) -> mpsc::UnboundedReceiver<ScanEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}

// ----------------------------------------------------------------------------
// Demo Transport
// ----------------------------------------------------------------------------

/// Transport whose far end drips a few sensor lines, split mid-record to
/// show the framer reassembling them
struct DemoTransport {
    link_subscribers: Mutex<Vec<mpsc::UnboundedSender<LinkEvent>>>,
}

#[async_trait]
impl StreamTransport for DemoTransport {
    async fn open(&self, _peer: &PeerDevice, _service: Uuid) -> io::Result<StreamPair> {
        let (local, mut remote) = tokio::io::duplex(4096);
        let (input, output) = tokio::io::split(local);

        tokio::spawn(async move {
            for chunk in [&b"21.5,48\n90."[..], &b"1,12\n7.3,99\n"[..]] {
                tokio::time::sleep(Duration::from_millis(50)).await;
                if remote.write_all(chunk).await.is_err() {
                    return;
                }
            }
            // Keep the far end open until the session disconnects.
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let subscribers: Vec<_> = self.link_subscribers.lock().unwrap().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            for tx in &subscribers {
                let _ = tx.send(LinkEvent::Up);
            }
        });

        Ok(StreamPair {
            input: Box::new(input),
            output: Box::new(output),
        })
    }

    fn subscribe_link_events(&self) -> mpsc::UnboundedReceiver<LinkEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.link_subscribers.lock().unwrap().push(tx);
        rx
    }
}

// ----------------------------------------------------------------------------
// Composition Root
// ----------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let peer = PeerDevice::new(PeerAddr::new([0xAA, 0, 0, 0, 0, 1]), "demo-probe");
    let radio = Arc::new(DemoRadio {
        peer,
        subscribers: Mutex::new(Vec::new()),
    });
    let transport = Arc::new(DemoTransport {
        link_subscribers: Mutex::new(Vec::new()),
    });
    let communicator = Communicator::new(radio, transport, CommunicatorConfig::default());

    let (milestone_tx, mut milestones) = mpsc::unbounded_channel();
    communicator.set_observer(move |event: Event| {
        println!("event: {event:?}");
        if matches!(event, Event::DiscoveryFinished | Event::Connected) {
            let _ = milestone_tx.send(event);
        }
    });

    communicator.start_scan().await.expect("scan failed");
    milestones.recv().await; // DiscoveryFinished

    let target = communicator
        .discovered_devices()
        .into_iter()
        .next()
        .expect("no peer found");
    println!("connecting to {target}");
    communicator.connect_to(target);
    milestones.recv().await; // Connected

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("records: {:?}", communicator.records().snapshot());

    communicator.disconnect();
    tokio::time::sleep(Duration::from_millis(50)).await;
}
