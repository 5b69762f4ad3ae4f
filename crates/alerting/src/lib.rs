//! Alert Execution
//!
//! Executes alert commands emitted by the alertness monitor: alarm tone
//! start/stop on a shared device and throttled out-of-band notifications,
//! on a background task fed by a bounded queue.

mod executor;
mod manager;
mod sink;

pub use executor::{
    AlarmWorker, Dispatch, EffectExecutor, ExecutorConfig, ExecutorError, ExecutorHandle, WorkerReport,
};
pub use manager::{NotificationConfig, NotificationManager};
pub use sink::{LogNotifier, LogToneDevice, Notifier, SinkError, ToneDevice};
