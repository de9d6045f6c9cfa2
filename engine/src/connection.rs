//! Connection lifecycle state machine.
//!
//! The machine owns no socket and no timer. Each transition returns the
//! [`Effect`]s the caller must carry out, which keeps the lifecycle
//! deterministic and testable without a network.
//!
//! ```text
//! Idle --connect--> Connecting --open--> Open
//! Connecting/Open --close--> Reconnecting(n)   while n <= max_attempts
//!                       \--> Closed            once the budget is spent
//! Reconnecting(n) --retry elapsed--> Connecting
//! any live state --disconnect--> Closed
//! ```

use crate::LogKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of reconnection attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay between reconnection attempts.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Lifecycle state of the single socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    /// Boolean projection read by displays.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Whether a socket is live or being established.
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

/// How the delay grows with the attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`, capped at `max_delay`
    Exponential { max_delay: Duration },
}

/// Reconnection budget and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff: Backoff::Linear,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential { max_delay } => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor).min(max_delay)
            }
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a new socket. Never requested while one is live.
    OpenSocket,
    /// Close the live socket, if any, without reporting the close back.
    CloseSocket,
    /// Arm the retry timer; replaces any timer already armed.
    ScheduleRetry { attempt: u32, delay: Duration },
    /// Disarm the retry timer.
    CancelRetry,
    /// Record an entry in the event log.
    Log { kind: LogKind, message: String },
}

impl Effect {
    fn info(message: impl Into<String>) -> Self {
        Effect::Log {
            kind: LogKind::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Effect::Log {
            kind: LogKind::Error,
            message: message.into(),
        }
    }
}

/// The connection state machine.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    attempts: u32,
    policy: ReconnectPolicy,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

impl Connection {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Idle,
            attempts: 0,
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnection attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// User asked to connect. Idempotent while connecting or open.
    ///
    /// From `Reconnecting` the pending retry is cancelled and a socket is
    /// opened right away with a fresh attempt budget.
    pub fn connect(&mut self) -> Vec<Effect> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => Vec::new(),
            ConnectionState::Reconnecting { .. } => {
                self.attempts = 0;
                self.state = ConnectionState::Connecting;
                vec![Effect::CancelRetry, Effect::OpenSocket]
            }
            ConnectionState::Idle | ConnectionState::Closed => {
                self.attempts = 0;
                self.state = ConnectionState::Connecting;
                vec![Effect::OpenSocket]
            }
        }
    }

    /// User asked to disconnect. Terminal until the next [`connect`](Self::connect).
    pub fn disconnect(&mut self) -> Vec<Effect> {
        match self.state {
            ConnectionState::Idle | ConnectionState::Closed => Vec::new(),
            ConnectionState::Connecting
            | ConnectionState::Open
            | ConnectionState::Reconnecting { .. } => {
                self.state = ConnectionState::Closed;
                self.attempts = 0;
                vec![
                    Effect::CancelRetry,
                    Effect::CloseSocket,
                    Effect::info("Disconnected from WebSocket"),
                ]
            }
        }
    }

    /// Disconnect when connected, connect otherwise.
    pub fn toggle(&mut self) -> Vec<Effect> {
        if self.state.is_connected() {
            self.disconnect()
        } else {
            self.connect()
        }
    }

    /// The socket finished its handshake.
    pub fn on_open(&mut self) -> Vec<Effect> {
        if self.state != ConnectionState::Connecting {
            return Vec::new();
        }
        self.state = ConnectionState::Open;
        self.attempts = 0;
        vec![Effect::info("Connected to WebSocket")]
    }

    /// The transport reported an error. A close always follows, so the
    /// state is left alone.
    pub fn on_error(&mut self, reason: &str) -> Vec<Effect> {
        if !self.state.is_active() {
            return Vec::new();
        }
        vec![Effect::error(format!("WebSocket error: {}", reason))]
    }

    /// The socket closed or failed to open.
    pub fn on_close(&mut self) -> Vec<Effect> {
        let notice = match self.state {
            ConnectionState::Open => "Disconnected from WebSocket",
            ConnectionState::Connecting => "Connection attempt failed",
            // Already closed by the user, or a leftover from an abandoned socket
            _ => return Vec::new(),
        };

        let mut effects = vec![Effect::info(notice)];

        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
            let attempt = self.attempts;
            let delay = self.policy.delay(attempt);
            self.state = ConnectionState::Reconnecting { attempt };
            effects.push(Effect::info(format!(
                "Reconnecting in {} ms (attempt {} of {})",
                delay.as_millis(),
                attempt,
                self.policy.max_attempts
            )));
            effects.push(Effect::ScheduleRetry { attempt, delay });
        } else {
            self.state = ConnectionState::Closed;
            effects.push(Effect::error(format!(
                "Giving up after {} reconnection attempts",
                self.policy.max_attempts
            )));
        }

        effects
    }

    /// The retry timer fired.
    pub fn retry_elapsed(&mut self) -> Vec<Effect> {
        match self.state {
            ConnectionState::Reconnecting { .. } => {
                self.state = ConnectionState::Connecting;
                vec![Effect::OpenSocket]
            }
            _ => Vec::new(),
        }
    }
}
