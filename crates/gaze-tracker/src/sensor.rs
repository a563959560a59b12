//! Sensor implementations.
//!
//! A sensor pushes one [`SensorReading`] per tick into the listener it was
//! started with. Stopping a sensor drops its copy of the listener, so no
//! reading is delivered on its behalf afterwards.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use gazetile_common::error::{GazeError, GazeResult};
use gazetile_model::point::SensorReading;

use crate::{GazeSensor, ReadingSender};

/// Replays a recorded reading stream at a fixed interval.
///
/// The listener is closed once the recording is exhausted.
pub struct ReplaySensor {
    readings: Arc<[SensorReading]>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl ReplaySensor {
    pub fn new(readings: Vec<SensorReading>, interval: Duration) -> Self {
        Self {
            readings: readings.into(),
            interval,
            task: None,
        }
    }

    /// Replay without pacing, as fast as the consumer drains.
    pub fn unpaced(readings: Vec<SensorReading>) -> Self {
        Self::new(readings, Duration::ZERO)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl GazeSensor for ReplaySensor {
    fn name(&self) -> &str {
        "replay"
    }

    fn start(&mut self, listener: ReadingSender) -> GazeResult<()> {
        if self.task.is_some() {
            return Err(GazeError::sensor("replay sensor already started"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| GazeError::sensor(format!("replay sensor needs a tokio runtime: {e}")))?;

        let readings = Arc::clone(&self.readings);
        let interval = self.interval;
        self.task = Some(runtime.spawn(async move {
            for reading in readings.iter().copied() {
                if listener.send(reading).await.is_err() {
                    // Receiver gone: tracking stopped.
                    return;
                }
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
            tracing::debug!(readings = readings.len(), "Replay finished");
        }));
        Ok(())
    }

    fn stop(&mut self) -> GazeResult<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }
}

impl Drop for ReplaySensor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

type SharedListener = Arc<Mutex<Option<ReadingSender>>>;

/// A sensor driven by hand through a [`ManualSensorHandle`].
///
/// Useful wherever readings come from somewhere other than a device: tests,
/// bridges from other event loops, or scripted demos.
pub struct ManualSensor {
    listener: SharedListener,
}

/// Emits readings into a [`ManualSensor`] while it is started.
#[derive(Clone)]
pub struct ManualSensorHandle {
    listener: SharedListener,
}

impl ManualSensor {
    pub fn new() -> (Self, ManualSensorHandle) {
        let listener: SharedListener = Arc::new(Mutex::new(None));
        (
            Self {
                listener: Arc::clone(&listener),
            },
            ManualSensorHandle { listener },
        )
    }
}

impl ManualSensorHandle {
    /// Deliver a reading. Returns `false` when the sensor is stopped or the
    /// listener is full or gone.
    pub fn emit(&self, reading: SensorReading) -> bool {
        let sender = match self.listener.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return false,
        };
        match sender {
            Some(tx) => tx.try_send(reading).is_ok(),
            None => false,
        }
    }

    /// Whether the sensor currently has a listener attached.
    pub fn is_attached(&self) -> bool {
        self.listener
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }
}

impl GazeSensor for ManualSensor {
    fn name(&self) -> &str {
        "manual"
    }

    fn start(&mut self, listener: ReadingSender) -> GazeResult<()> {
        let mut guard = self
            .listener
            .lock()
            .map_err(|_| GazeError::sensor("manual sensor listener poisoned"))?;
        *guard = Some(listener);
        Ok(())
    }

    fn stop(&mut self) -> GazeResult<()> {
        let mut guard = self
            .listener
            .lock()
            .map_err(|_| GazeError::sensor("manual sensor listener poisoned"))?;
        guard.take();
        Ok(())
    }
}

/// Create the listener channel a tracker hands to its sensor.
pub(crate) fn listener_channel(capacity: usize) -> (ReadingSender, mpsc::Receiver<SensorReading>) {
    mpsc::channel(capacity.max(1))
}
