use crate::error::SessionError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopping,
    Error { message: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Stopping => "Stopping",
            SessionState::Error { .. } => "Error",
        }
    }
}

/// Validated session state machine with change fan-out.
///
/// Owned by the session controller; observers subscribe to transitions
/// rather than polling.
pub struct SessionStateMachine {
    state: Arc<RwLock<SessionState>>,
    state_tx: Sender<SessionState>,
    state_rx: Receiver<SessionState>,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(SessionState::Idle)),
            state_tx,
            state_rx,
        }
    }

    pub fn transition(&self, new_state: SessionState) -> Result<(), SessionError> {
        let mut current = self.state.write();

        let valid = matches!(
            (&*current, &new_state),
            (SessionState::Idle, SessionState::Recording)
                | (SessionState::Recording, SessionState::Stopping)
                | (SessionState::Recording, SessionState::Error { .. })
                | (SessionState::Stopping, SessionState::Idle)
                | (SessionState::Stopping, SessionState::Error { .. })
                | (SessionState::Error { .. }, SessionState::Idle)
        );

        if !valid {
            return Err(SessionError::InvalidTransition {
                from: current.name().to_string(),
                to: new_state.name().to_string(),
            });
        }

        tracing::info!(target: "session", "State transition: {:?} -> {:?}", *current, new_state);
        *current = new_state.clone();
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn is_recording(&self) -> bool {
        matches!(*self.state.read(), SessionState::Recording)
    }

    pub fn subscribe(&self) -> Receiver<SessionState> {
        self.state_rx.clone()
    }
}
