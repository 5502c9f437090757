use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{
    collaborators::Navigator,
    device::{Device, DeviceCatalog},
    error::FlowError,
    flow::{FlowEvent, FlowSnapshot, Phase, Selection, StepSequencer},
};

#[derive(Debug)]
enum Command {
    Start(oneshot::Sender<bool>),
    Select(String, oneshot::Sender<Selection>),
}

/// Owner side of a running flow instance.
///
/// The flow lives on its own tokio task. Dropping the handle, or calling
/// [`FlowHandle::shutdown`], cancels that task together with its timer.
#[derive(Debug)]
pub struct FlowHandle {
    catalog: Arc<DeviceCatalog>,
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<FlowSnapshot>,
    events: broadcast::Sender<FlowEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FlowHandle {
    /// Spawns a task hosting `sequencer`. `navigator` is called once when the flow completes.
    pub fn spawn(sequencer: StepSequencer, navigator: Arc<dyn Navigator>) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(sequencer.snapshot());
        let (events_tx, _) = broadcast::channel(64);
        let cancel = CancellationToken::new();
        let catalog = sequencer.catalog().clone();

        let task = FlowTask {
            period: sequencer.timings().tick_period(),
            sequencer,
            navigator,
            commands: commands_rx,
            snapshot: snapshot_tx,
            events: events_tx.clone(),
            cancel: cancel.clone(),
        };

        Self {
            catalog,
            commands: commands_tx,
            snapshot: snapshot_rx,
            events: events_tx,
            cancel,
            task: Some(tokio::spawn(task.run())),
        }
    }

    /// Begins scanning. Returns `false` if the flow was already started.
    pub async fn start(&self) -> Result<bool, FlowError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start(tx)).await?;
        rx.await.map_err(|_| FlowError::Closed)
    }

    /// Picks a device. Invalid picks come back as [`Selection::Ignored`].
    pub async fn select(&self, device_id: impl Into<String>) -> Result<Selection, FlowError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Select(device_id.into(), tx)).await?;
        rx.await.map_err(|_| FlowError::Closed)
    }

    async fn send(&self, command: Command) -> Result<(), FlowError> {
        self.commands.send(command).await.map_err(|_| FlowError::Closed)
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.snapshot.borrow().clone()
    }

    /// The device list, available only while the flow waits for a pick.
    pub fn visible_devices(&self) -> Option<Vec<Device>> {
        (self.snapshot.borrow().phase == Phase::Found)
            .then(|| self.catalog.iter().cloned().collect())
    }

    pub fn watch(&self) -> watch::Receiver<FlowSnapshot> {
        self.snapshot.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    /// Waits until the flow task has ended, either by completing or by teardown.
    pub async fn finished(&self) {
        let mut rx = self.snapshot.clone();
        while rx.changed().await.is_ok() {}
    }

    /// Cancels the flow and waits for its task to stop.
    #[instrument(skip(self))]
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("Connection flow shut down.");
    }
}

impl Drop for FlowHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct FlowTask {
    sequencer: StepSequencer,
    navigator: Arc<dyn Navigator>,
    commands: mpsc::Receiver<Command>,
    snapshot: watch::Sender<FlowSnapshot>,
    events: broadcast::Sender<FlowEvent>,
    cancel: CancellationToken,
    period: Duration,
}

impl FlowTask {
    #[instrument(skip_all)]
    async fn run(mut self) {
        info!(tick = ?self.period, "Connection flow task started.");

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let before = self.sequencer.phase();
            let timed = self.sequencer.is_timed();

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("Flow cancelled; dropping pending timers.");
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("All flow handles dropped.");
                        break;
                    }
                },

                _ = ticker.tick(), if timed => self.sequencer.tick(self.period),
            }

            if self.sequencer.phase() != before {
                // Each state's timeline starts at its entry.
                ticker.reset();
            }

            self.publish();

            if self.sequencer.is_finished() {
                break;
            }
        }

        info!(phase = %self.sequencer.phase(), "Connection flow task ended.");
    }

    fn handle(&mut self, command: Command) {
        debug!(?command, "Handling flow command.");

        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.sequencer.start());
            }
            Command::Select(device_id, reply) => {
                let _ = reply.send(self.sequencer.select(&device_id));
            }
        }
    }

    fn publish(&mut self) {
        for event in self.sequencer.take_events() {
            if let FlowEvent::Navigate(route) = &event {
                self.navigator.navigate(route);
            }
            if self.events.send(event).is_err() {
                debug!("No subscribers to notify about the event.");
            }
        }

        let snapshot = self.sequencer.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
