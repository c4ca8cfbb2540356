//! Background CPU/memory sampling for diagnostics.
//!
//! The sampler runs on its own OS thread and owns its snapshot buffer; the
//! only shared state is a stop channel in and a result channel out.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use sysinfo::{Pid, System};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub taken_at: DateTime<Local>,
    pub cpu_percent: f32,
    pub memory_mb: f64,
    pub threads: usize,
}

pub struct ResourceSampler {
    stop_tx: Sender<()>,
    done_rx: Receiver<Vec<ResourceSnapshot>>,
    handle: Option<JoinHandle<()>>,
}

impl ResourceSampler {
    /// Starts sampling the current process every `interval`.
    pub fn start(interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("spley-monitor".to_string())
            .spawn(move || {
                let snapshots = sample_until_stopped(interval, &stop_rx);
                let _ = done_tx.send(snapshots);
            })?;
        tracing::debug!("Resource sampler started ({:.1}s interval)", interval.as_secs_f64());
        Ok(Self {
            stop_tx,
            done_rx,
            handle: Some(handle),
        })
    }

    /// Signals the thread and waits at most `join_timeout` for its snapshots.
    ///
    /// Returns an empty list if the thread did not finish in time; it is then
    /// left detached.
    pub fn stop(mut self, join_timeout: Duration) -> Vec<ResourceSnapshot> {
        let _ = self.stop_tx.send(());
        match self.done_rx.recv_timeout(join_timeout) {
            Ok(snapshots) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                snapshots
            }
            Err(_) => {
                tracing::warn!(
                    "Resource sampler did not stop within {:.1}s, detaching",
                    join_timeout.as_secs_f64()
                );
                Vec::new()
            }
        }
    }
}

fn sample_until_stopped(interval: Duration, stop_rx: &Receiver<()>) -> Vec<ResourceSnapshot> {
    let mut snapshots = Vec::new();
    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(e) => {
            tracing::warn!("Resource sampler disabled: {}", e);
            return snapshots;
        }
    };
    let mut system = System::new();
    loop {
        if let Some(snapshot) = take_snapshot(&mut system, pid) {
            snapshots.push(snapshot);
        }
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    snapshots
}

fn take_snapshot(system: &mut System, pid: Pid) -> Option<ResourceSnapshot> {
    if !system.refresh_process(pid) {
        return None;
    }
    let process = system.process(pid)?;
    Some(ResourceSnapshot {
        taken_at: Local::now(),
        cpu_percent: process.cpu_usage(),
        memory_mb: process.memory() as f64 / (1024.0 * 1024.0),
        threads: process.tasks().map_or(1, |tasks| tasks.len().max(1)),
    })
}

/// Current, mean and peak figures over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SamplerSummary {
    pub samples: usize,
    pub current_cpu_percent: f32,
    pub avg_cpu_percent: f32,
    pub max_cpu_percent: f32,
    pub current_memory_mb: f64,
    pub avg_memory_mb: f64,
    pub max_memory_mb: f64,
    pub max_threads: usize,
}

impl SamplerSummary {
    pub fn from_snapshots(snapshots: &[ResourceSnapshot]) -> Option<Self> {
        let last = snapshots.last()?;
        let n = snapshots.len();
        Some(Self {
            samples: n,
            current_cpu_percent: last.cpu_percent,
            avg_cpu_percent: snapshots.iter().map(|s| s.cpu_percent).sum::<f32>() / n as f32,
            max_cpu_percent: snapshots.iter().map(|s| s.cpu_percent).fold(0.0, f32::max),
            current_memory_mb: last.memory_mb,
            avg_memory_mb: snapshots.iter().map(|s| s.memory_mb).sum::<f64>() / n as f64,
            max_memory_mb: snapshots.iter().map(|s| s.memory_mb).fold(0.0, f64::max),
            max_threads: snapshots.iter().map(|s| s.threads).max().unwrap_or(0),
        })
    }
}
