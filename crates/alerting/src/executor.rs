//! Background execution of alert commands

use alertness::{AlertCommand, FaceId, FrameResult, NotificationKind};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::manager::{NotificationConfig, NotificationManager};
use crate::sink::{Notifier, ToneDevice};

/// Executor error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Command queue full")]
    QueueFull,

    #[error("Executor stopped")]
    Closed,

    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Bounded command queue length
    pub queue_capacity: usize,
    /// Notification throttling
    pub notification: NotificationConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            notification: NotificationConfig::default(),
        }
    }
}

/// A command tagged with the face that requested it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub face_id: FaceId,
    pub command: AlertCommand,
}

/// Totals reported by the worker when it exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub commands: u64,
    pub tone_starts: u64,
    pub tone_stops: u64,
    pub notifications_sent: u64,
    pub notifications_suppressed: u64,
    pub sink_failures: u64,
}

/// Owns the output devices and applies commands to them
///
/// The tone device is shared by all faces: it plays while at least one face
/// has an outstanding start, and device calls are guarded by its own busy
/// state rather than by the command stream.
pub struct AlarmWorker<T, N> {
    tone: T,
    notifier: N,
    manager: NotificationManager,
    alarm_faces: HashSet<FaceId>,
    report: WorkerReport,
}

impl<T: ToneDevice, N: Notifier> AlarmWorker<T, N> {
    pub fn new(config: NotificationConfig, tone: T, notifier: N) -> Self {
        Self {
            tone,
            notifier,
            manager: NotificationManager::new(config),
            alarm_faces: HashSet::new(),
            report: WorkerReport::default(),
        }
    }

    pub fn execute(&mut self, dispatch: Dispatch) {
        self.report.commands += 1;
        let Dispatch { face_id, command } = dispatch;

        match command {
            AlertCommand::StartAlarm => {
                self.alarm_faces.insert(face_id);
                if self.tone.is_busy() {
                    debug!(face = %face_id, "Alarm already playing");
                    return;
                }
                match self.tone.start() {
                    Ok(()) => {
                        self.report.tone_starts += 1;
                        info!(face = %face_id, "Alarm started");
                    }
                    Err(e) => self.sink_failed(&e),
                }
            }
            AlertCommand::StopAlarm => {
                self.alarm_faces.remove(&face_id);
                if !self.alarm_faces.is_empty() {
                    debug!(
                        face = %face_id,
                        "Alarm still requested by {} face(s)",
                        self.alarm_faces.len()
                    );
                    return;
                }
                self.stop_tone();
            }
            AlertCommand::SendNotification { kind, message } => {
                self.notify(face_id, kind, &message);
            }
        }
    }

    fn notify(&mut self, face_id: FaceId, kind: NotificationKind, message: &str) {
        let now = Instant::now();
        if !self.manager.should_send(kind, now) {
            self.report.notifications_suppressed += 1;
            counter!("nonap_notifications_suppressed_total", "kind" => kind.as_str()).increment(1);
            return;
        }

        match self.notifier.send(kind, message) {
            Ok(()) => {
                self.manager.record_sent(kind, now);
                self.report.notifications_sent += 1;
                counter!("nonap_notifications_sent_total", "kind" => kind.as_str()).increment(1);
                info!(face = %face_id, kind = kind.as_str(), "Notification sent");
            }
            Err(e) => self.sink_failed(&e),
        }
    }

    fn stop_tone(&mut self) {
        if !self.tone.is_busy() {
            return;
        }
        match self.tone.stop() {
            Ok(()) => {
                self.report.tone_stops += 1;
                info!("Alarm stopped");
            }
            Err(e) => self.sink_failed(&e),
        }
    }

    fn sink_failed(&mut self, error: &crate::sink::SinkError) {
        self.report.sink_failures += 1;
        counter!("nonap_sink_failures_total").increment(1);
        warn!("Alert output failed: {}", error);
    }

    /// Silence the tone and return the totals
    pub fn finish(mut self) -> WorkerReport {
        self.alarm_faces.clear();
        self.stop_tone();
        self.report
    }

    pub fn report(&self) -> &WorkerReport {
        &self.report
    }
}

/// Cloneable, non-blocking sender into the executor queue
#[derive(Debug, Clone)]
pub struct ExecutorHandle {
    tx: mpsc::Sender<Dispatch>,
}

impl ExecutorHandle {
    /// Queue a command without waiting; a full or closed queue drops it
    pub fn dispatch(&self, face_id: FaceId, command: AlertCommand) -> Result<(), ExecutorError> {
        match self.tx.try_send(Dispatch { face_id, command }) {
            Ok(()) => {
                counter!("nonap_commands_dispatched_total").increment(1);
                Ok(())
            }
            Err(TrySendError::Full(dropped)) => {
                counter!("nonap_commands_dropped_total").increment(1);
                warn!(face = %face_id, "Command queue full, dropping {:?}", dropped.command);
                Err(ExecutorError::QueueFull)
            }
            Err(TrySendError::Closed(dropped)) => {
                counter!("nonap_commands_dropped_total").increment(1);
                warn!(face = %face_id, "Executor stopped, dropping {:?}", dropped.command);
                Err(ExecutorError::Closed)
            }
        }
    }

    /// Queue every command of a frame result; returns how many were accepted
    pub fn dispatch_result(&self, result: &FrameResult) -> usize {
        debug!(face = %result.face_id, status = result.state.label(), "Frame status");
        result
            .commands
            .iter()
            .filter(|command| self.dispatch(result.face_id, (*command).clone()).is_ok())
            .count()
    }
}

/// Alert command executor running on a background task
pub struct EffectExecutor {
    handle: ExecutorHandle,
    worker: JoinHandle<WorkerReport>,
}

impl EffectExecutor {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn<T, N>(config: ExecutorConfig, tone: T, notifier: N) -> Self
    where
        T: ToneDevice + Send + 'static,
        N: Notifier + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(config.queue_capacity.max(1));
        let mut worker = AlarmWorker::new(config.notification, tone, notifier);

        let worker = tokio::spawn(async move {
            info!("Alert executor started");
            while let Some(dispatch) = rx.recv().await {
                worker.execute(dispatch);
            }
            let report = worker.finish();
            info!("Alert executor stopped after {} commands", report.commands);
            report
        });

        Self {
            handle: ExecutorHandle { tx },
            worker,
        }
    }

    pub fn handle(&self) -> ExecutorHandle {
        self.handle.clone()
    }

    /// Close the queue and wait for the worker to drain it
    ///
    /// Waits until every cloned handle has been dropped as well.
    pub async fn shutdown(self) -> Result<WorkerReport, ExecutorError> {
        drop(self.handle);
        self.worker
            .await
            .map_err(|e| ExecutorError::WorkerFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingTone {
        calls: Arc<Mutex<Vec<&'static str>>>,
        busy: Arc<Mutex<bool>>,
    }

    impl ToneDevice for RecordingTone {
        fn start(&mut self) -> Result<(), SinkError> {
            self.calls.lock().unwrap().push("start");
            *self.busy.lock().unwrap() = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), SinkError> {
            self.calls.lock().unwrap().push("stop");
            *self.busy.lock().unwrap() = false;
            Ok(())
        }

        fn is_busy(&self) -> bool {
            *self.busy.lock().unwrap()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(NotificationKind, String)>>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn send(&mut self, kind: NotificationKind, message: &str) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Delivery("no network".into()));
            }
            self.sent.lock().unwrap().push((kind, message.to_string()));
            Ok(())
        }
    }

    fn dispatch(face: u32, command: AlertCommand) -> Dispatch {
        Dispatch {
            face_id: FaceId(face),
            command,
        }
    }

    #[test]
    fn test_duplicate_start_does_not_restart_tone() {
        let tone = RecordingTone::default();
        let mut worker = AlarmWorker::new(NotificationConfig::default(), tone.clone(), RecordingNotifier::default());

        worker.execute(dispatch(0, AlertCommand::StartAlarm));
        worker.execute(dispatch(0, AlertCommand::StartAlarm));
        worker.execute(dispatch(0, AlertCommand::StopAlarm));
        worker.execute(dispatch(0, AlertCommand::StopAlarm));

        assert_eq!(*tone.calls.lock().unwrap(), vec!["start", "stop"]);
        assert_eq!(worker.report().tone_starts, 1);
        assert_eq!(worker.report().tone_stops, 1);
    }

    #[test]
    fn test_shared_tone_waits_for_last_face() {
        let tone = RecordingTone::default();
        let mut worker = AlarmWorker::new(NotificationConfig::default(), tone.clone(), RecordingNotifier::default());

        worker.execute(dispatch(0, AlertCommand::StartAlarm));
        worker.execute(dispatch(1, AlertCommand::StartAlarm));
        worker.execute(dispatch(0, AlertCommand::StopAlarm));
        assert!(tone.is_busy());

        worker.execute(dispatch(1, AlertCommand::StopAlarm));
        assert!(!tone.is_busy());
        assert_eq!(*tone.calls.lock().unwrap(), vec!["start", "stop"]);
    }

    #[test]
    fn test_notification_cooldown() {
        let notifier = RecordingNotifier::default();
        let mut worker = AlarmWorker::new(NotificationConfig::default(), RecordingTone::default(), notifier.clone());

        let command = AlertCommand::notify(NotificationKind::FatigueBreakSuggested);
        worker.execute(dispatch(0, command.clone()));
        worker.execute(dispatch(0, command));

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], (NotificationKind::FatigueBreakSuggested, "Take a tea break".to_string()));
        assert_eq!(worker.report().notifications_suppressed, 1);
    }

    #[test]
    fn test_delivery_failure_is_counted_not_recorded() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let mut worker = AlarmWorker::new(NotificationConfig::default(), RecordingTone::default(), notifier);

        worker.execute(dispatch(0, AlertCommand::notify(NotificationKind::DriverSleeping)));
        assert_eq!(worker.report().sink_failures, 1);
        assert_eq!(worker.report().notifications_sent, 0);
    }

    #[tokio::test]
    async fn test_executor_drains_queue_on_shutdown() {
        let tone = RecordingTone::default();
        let notifier = RecordingNotifier::default();
        let executor = EffectExecutor::spawn(ExecutorConfig::default(), tone.clone(), notifier.clone());
        let handle = executor.handle();

        handle.dispatch(FaceId(0), AlertCommand::StartAlarm).unwrap();
        handle
            .dispatch(FaceId(0), AlertCommand::notify(NotificationKind::DriverSleeping))
            .unwrap();
        drop(handle);

        let report = executor.shutdown().await.unwrap();
        assert_eq!(report.commands, 2);
        assert_eq!(report.tone_starts, 1);
        assert_eq!(report.tone_stops, 1);
        assert_eq!(report.notifications_sent, 1);
        assert!(!tone.is_busy());
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_command() {
        let config = ExecutorConfig {
            queue_capacity: 1,
            ..Default::default()
        };
        let executor = EffectExecutor::spawn(config, RecordingTone::default(), RecordingNotifier::default());
        let handle = executor.handle();

        // Worker has not run yet on the current-thread runtime
        assert!(handle.dispatch(FaceId(0), AlertCommand::StartAlarm).is_ok());
        assert_eq!(
            handle.dispatch(FaceId(0), AlertCommand::StopAlarm),
            Err(ExecutorError::QueueFull)
        );
        drop(handle);

        let report = executor.shutdown().await.unwrap();
        assert_eq!(report.commands, 1);
    }
}
