//! Sensor bridge
//!
//! Converts the backend's asynchronous sensor callback into a bounded,
//! ordered queue consumed by the control loop. Single producer (the sensor
//! callback thread), single consumer (the control thread). When the queue is
//! full the producer blocks, so correctness requires the consumer to drain
//! once per tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use contracts::{FrameSink, SensorFrame, SensorSource};
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

use crate::error::{Result, RunError};

/// Bounded bridge between sensor callbacks and the control loop
pub struct SensorBridge {
    tx: mpsc::Sender<SensorFrame>,
    rx: mpsc::Receiver<SensorFrame>,
    last_seen: HashMap<String, u64>,
}

impl SensorBridge {
    /// Create a bridge with a fixed queue capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx,
            last_seen: HashMap::new(),
        }
    }

    /// Subscribe a sensor
    ///
    /// Each delivered frame is persisted through `sink` on the sensor's own
    /// thread, then enqueued. Persistence failures are logged and the frame
    /// is still enqueued: the synchronization barrier must not starve because
    /// a disk write failed. Enqueueing blocks the producer while the queue is
    /// at capacity.
    pub fn subscribe(&self, source: &dyn SensorSource, sink: Arc<dyn FrameSink>) {
        let tx = self.tx.clone();
        source.listen(Arc::new(move |frame| {
            if let Err(e) = sink.persist(&frame) {
                error!(
                    sensor = %frame.sensor_name,
                    frame_id = frame.frame_id,
                    error = %e,
                    "failed to persist sensor frame"
                );
            }
            if tx.blocking_send(frame).is_err() {
                warn!("sensor bridge receiver dropped; frame discarded");
            }
        }));
    }

    /// Blocking dequeue of the next frame
    ///
    /// This is the synchronization barrier: the control loop only proceeds
    /// once the tick's sensor data is confirmed delivered. Times out with a
    /// fatal error if nothing arrives within `timeout`.
    pub async fn await_frame(&mut self, timeout: Duration) -> Result<SensorFrame> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(frame)) => {
                // Frames are expected non-decreasing per sensor; a regression
                // means the delivery order assumption broke somewhere.
                let last = self
                    .last_seen
                    .entry(frame.sensor_name.clone())
                    .or_insert(frame.frame_id);
                if frame.frame_id < *last {
                    warn!(
                        sensor = %frame.sensor_name,
                        frame_id = frame.frame_id,
                        last = *last,
                        "sensor frame number regressed"
                    );
                } else {
                    *last = frame.frame_id;
                }
                trace!(sensor = %frame.sensor_name, frame_id = frame.frame_id, "frame consumed");
                Ok(frame)
            }
            Ok(None) => Err(RunError::SensorClosed),
            Err(_) => Err(RunError::FrameTimeout {
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use bytes::Bytes;
    use contracts::FrameCallback;

    use super::*;

    /// Source whose frames are fired manually from the test
    struct StubSource {
        name: String,
        callback: Mutex<Option<FrameCallback>>,
        listening: AtomicBool,
    }

    impl StubSource {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                callback: Mutex::new(None),
                listening: AtomicBool::new(false),
            }
        }

        fn fire(&self, frame_id: u64) {
            let callback = self.callback.lock().unwrap().clone().unwrap();
            let name = self.name.clone();
            // deliver from a separate thread, like a real sensor
            std::thread::spawn(move || {
                callback(SensorFrame {
                    frame_id,
                    sensor_name: name,
                    payload: Bytes::from_static(b"stub"),
                });
            })
            .join()
            .unwrap();
        }
    }

    impl SensorSource for StubSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn listen(&self, callback: FrameCallback) {
            if self.listening.swap(true, Ordering::SeqCst) {
                return;
            }
            *self.callback.lock().unwrap() = Some(callback);
        }

        fn stop(&self) {
            self.listening.store(false, Ordering::SeqCst);
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::Relaxed)
        }
    }

    struct NullSink;

    impl FrameSink for NullSink {
        fn persist(&self, _frame: &SensorFrame) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn frames_come_out_in_fifo_order_then_timeout() {
        let mut bridge = SensorBridge::new(10);
        let source = StubSource::new("camera");
        bridge.subscribe(&source, Arc::new(NullSink));

        source.fire(1);
        source.fire(2);

        let first = bridge.await_frame(Duration::from_secs(1)).await.unwrap();
        let second = bridge.await_frame(Duration::from_secs(1)).await.unwrap();
        assert_eq!((first.frame_id, first.sensor_name.as_str()), (1, "camera"));
        assert_eq!((second.frame_id, second.sensor_name.as_str()), (2, "camera"));

        let err = bridge.await_frame(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, RunError::FrameTimeout { waited_ms: 1000 }));
    }

    #[tokio::test]
    async fn persist_failure_still_enqueues_the_frame() {
        struct FailingSink;
        impl FrameSink for FailingSink {
            fn persist(&self, _frame: &SensorFrame) -> std::io::Result<()> {
                Err(std::io::Error::other("disk full"))
            }
        }

        let mut bridge = SensorBridge::new(10);
        let source = StubSource::new("camera");
        bridge.subscribe(&source, Arc::new(FailingSink));

        source.fire(5);
        let frame = bridge.await_frame(Duration::from_secs(1)).await.unwrap();
        assert_eq!(frame.frame_id, 5);
    }
}
