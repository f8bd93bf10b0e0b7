use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::speech::{SfxPlayer, SpeechEngine};
use super::AudioTask;

/// Sequential audio output with provider failover.
///
/// One FIFO queue, exactly one task in flight. A task plays its SFX to
/// completion first, then its announcement. Speech goes to the primary
/// remote engine when one is configured, falling back to the local engine
/// on any provider failure, without reordering or duplicating audio.
/// Tasks are never dropped, only delayed; `reset` is the one exception
/// and empties everything.
pub struct AudioSerializer {
    queue: Arc<Mutex<VecDeque<AudioTask>>>,
    wakeup: Arc<Notify>,
    generation: watch::Sender<u64>,
    primary: Option<Arc<dyn SpeechEngine>>,
    fallback: Arc<dyn SpeechEngine>,
    sfx: Arc<dyn SfxPlayer>,
    primary_timeout: Duration,
    shutdown: Arc<AtomicBool>,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl AudioSerializer {
    pub fn new(
        primary: Option<Arc<dyn SpeechEngine>>,
        fallback: Arc<dyn SpeechEngine>,
        sfx: Arc<dyn SfxPlayer>,
        primary_timeout: Duration,
    ) -> Arc<Self> {
        let (generation, generation_rx) = watch::channel(0u64);

        let serializer = Arc::new(Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            wakeup: Arc::new(Notify::new()),
            generation,
            primary,
            fallback,
            sfx,
            primary_timeout,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: std::sync::Mutex::new(None),
        });

        let worker = tokio::spawn(Self::run(Arc::clone(&serializer), generation_rx));
        *serializer.worker.lock().expect("worker slot poisoned") = Some(worker);

        serializer
    }

    /// Append a task to the tail of the queue.
    pub async fn enqueue(&self, task: AudioTask) {
        if task.sfx.is_none() && task.announce.is_none() {
            return;
        }
        {
            let mut queue = self.queue.lock().await;
            queue.push_back(task);
        }
        self.wakeup.notify_one();
    }

    /// Cancel in-flight playback, drop every queued task, and leave the
    /// serializer ready to accept new tasks immediately.
    pub async fn reset(&self) {
        info!("audio serializer reset");

        // Clear and bump under the queue lock: the worker either never
        // sees a pre-reset task, or sees the bumped generation with it
        {
            let mut queue = self.queue.lock().await;
            queue.clear();
            self.generation.send_modify(|g| *g += 1);
        }

        if let Some(primary) = &self.primary {
            primary.stop().await;
        }
        self.fallback.stop().await;
        self.sfx.stop().await;
    }

    /// Number of queued (not yet started) tasks.
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Stop the worker loop. Queued tasks are abandoned.
    pub async fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.wakeup.notify_one();
        let handle = {
            let mut slot = self.worker.lock().expect("worker slot poisoned");
            slot.take()
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("audio worker task panicked: {e}");
            }
        }
    }

    async fn run(self: Arc<Self>, mut generation_rx: watch::Receiver<u64>) {
        info!("audio serializer worker started");

        loop {
            // Pull the next task, or park until one arrives. The
            // generation is read under the same lock the reset clears
            // under, so a task popped before a reset always sees the
            // pre-reset generation and gets abandoned.
            let (task, started_under) = loop {
                if self.shutdown.load(Ordering::SeqCst) {
                    info!("audio serializer worker stopped");
                    return;
                }
                {
                    let mut queue = self.queue.lock().await;
                    if let Some(task) = queue.pop_front() {
                        break (task, *generation_rx.borrow());
                    }
                }
                self.wakeup.notified().await;
            };

            tokio::select! {
                _ = generation_rx.wait_for(|g| *g != started_under) => {
                    debug!("in-flight audio task abandoned by reset");
                }
                _ = self.play(&task) => {}
            }
        }
    }

    async fn play(&self, task: &AudioTask) {
        if let Some(kind) = task.sfx {
            if let Err(e) = self.sfx.play(kind).await {
                warn!("SFX playback failed: {e:#}");
            }
        }

        let Some(text) = &task.announce else {
            return;
        };

        // Primary first (when configured), local fallback on any failure.
        // The fallback path runs inside the same in-flight slot, so queue
        // order is preserved and nothing plays twice.
        if let Some(primary) = &self.primary {
            match tokio::time::timeout(self.primary_timeout, primary.speak(text)).await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => {
                    warn!(engine = primary.name(), "speech failed, falling back: {e:#}")
                }
                Err(_) => {
                    primary.stop().await;
                    warn!(engine = primary.name(), "speech timed out, falling back");
                }
            }
        }

        if let Err(e) = self.fallback.speak(text).await {
            warn!(engine = self.fallback.name(), "fallback speech failed: {e:#}");
        }
    }
}
