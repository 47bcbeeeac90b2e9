//! Session memory
//!
//! Per-session bounded turn history, single-process and lossy by design.
//! Sessions are created lazily on first use, serialized by a per-session
//! gate, and discarded by a timer-driven idle sweep. History is only ever
//! appended to or truncated from the front; turns are never reordered.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use shop_agent_core::ChatTurn;

/// Session memory configuration
#[derive(Debug, Clone)]
pub struct SessionMemoryConfig {
    /// Maximum turns kept per session; oldest evicted first
    pub max_turns: usize,
    /// Idle time after which a session is swept
    pub idle_timeout: Duration,
    /// Interval of the background sweep task
    pub sweep_interval: Duration,
}

impl Default for SessionMemoryConfig {
    fn default() -> Self {
        use shop_agent_config::constants::session;
        Self {
            max_turns: session::MAX_TURNS,
            idle_timeout: Duration::from_secs(session::IDLE_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(session::SWEEP_INTERVAL_SECS),
        }
    }
}

impl From<&shop_agent_config::SessionSettings> for SessionMemoryConfig {
    fn from(settings: &shop_agent_config::SessionSettings) -> Self {
        Self {
            max_turns: settings.max_turns,
            idle_timeout: Duration::from_secs(settings.idle_timeout_secs),
            sweep_interval: Duration::from_secs(settings.sweep_interval_secs),
        }
    }
}

/// One conversation's state
pub struct Session {
    pub id: String,
    turns: Mutex<VecDeque<ChatTurn>>,
    last_activity: RwLock<Instant>,
    /// Serializes request processing for this session id. Concurrent
    /// requests for the same session block here; turns are appended in
    /// gate-acquisition order.
    gate: tokio::sync::Mutex<()>,
}

impl Session {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Mutex::new(VecDeque::new()),
            last_activity: RwLock::new(Instant::now()),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Acquire the session gate. Held for the duration of one request's
    /// processing, released on drop including error paths.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Ordered history snapshot, oldest first
    pub fn history(&self) -> Vec<ChatTurn> {
        self.turns.lock().iter().cloned().collect()
    }

    pub fn turn_count(&self) -> usize {
        self.turns.lock().len()
    }

    /// Append a turn, evicting from the front beyond `max_turns`
    pub fn append(&self, turn: ChatTurn, max_turns: usize) {
        let mut turns = self.turns.lock();
        turns.push_back(turn);
        while turns.len() > max_turns {
            turns.pop_front();
        }
        self.touch();
    }

    /// Drop oldest turns until at most `max_turns` remain
    pub fn truncate(&self, max_turns: usize) {
        let mut turns = self.turns.lock();
        while turns.len() > max_turns {
            turns.pop_front();
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Whether the session has been idle longer than `timeout`
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }
}

/// Session store
pub struct SessionMemory {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    config: SessionMemoryConfig,
}

impl SessionMemory {
    pub fn new(config: SessionMemoryConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &SessionMemoryConfig {
        &self.config
    }

    /// Get a session, creating it lazily on first use
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().get(id) {
            session.touch();
            return session.clone();
        }

        let mut sessions = self.sessions.write();
        // Double-checked: another request may have created it between
        // the read and write locks
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id = %id, "Created session");
                Arc::new(Session::new(id))
            })
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// History for a session; empty when the session does not exist
    pub fn history(&self, id: &str) -> Vec<ChatTurn> {
        self.get(id).map(|s| s.history()).unwrap_or_default()
    }

    /// Append a turn to a session, creating it if needed
    pub fn append(&self, id: &str, turn: ChatTurn) {
        self.get_or_create(id).append(turn, self.config.max_turns);
    }

    /// Truncate a session's history to at most `max_turns`
    pub fn truncate(&self, id: &str, max_turns: usize) {
        if let Some(session) = self.get(id) {
            session.truncate(max_turns);
        }
    }

    pub fn remove(&self, id: &str) {
        if self.sessions.write().remove(id).is_some() {
            tracing::info!(session_id = %id, "Removed session");
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove idle sessions. Idempotent: a second call with no
    /// intervening access finds nothing new to remove.
    pub fn sweep(&self) -> usize {
        let timeout = self.config.idle_timeout;
        let mut sessions = self.sessions.write();

        let idle: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_idle(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        let removed = idle.len();
        for id in idle {
            sessions.remove(&id);
            tracing::info!(session_id = %id, "Swept idle session");
        }

        removed
    }

    /// Start the periodic sweep task. Returns a shutdown sender.
    pub fn start_sweep_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let memory = Arc::clone(self);
        let interval = memory.config.sweep_interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let removed = memory.sweep();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = memory.count(),
                                "Session sweep complete"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session sweep task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}
