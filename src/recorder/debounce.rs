use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Trailing-edge debounce slot. At most one timer is pending at a time.
#[derive(Debug, Default)]
pub enum DebounceState {
    #[default]
    Idle,
    Pending {
        generation: u64,
        deadline: Instant,
        handle: JoinHandle<()>,
    },
    Firing,
}

impl DebounceState {
    /// Moves to `Pending`, aborting whatever timer was pending before.
    pub fn schedule(&mut self, generation: u64, deadline: Instant, handle: JoinHandle<()>) {
        let previous = std::mem::replace(
            self,
            DebounceState::Pending { generation, deadline, handle },
        );
        if let DebounceState::Pending { handle, .. } = previous {
            handle.abort();
        }
    }

    /// `Pending -> Firing` if the timer for `generation` is still current.
    pub fn begin_firing(&mut self, generation: u64) -> bool {
        match self {
            DebounceState::Pending { generation: current, .. } if *current == generation => {
                *self = DebounceState::Firing;
                true
            }
            _ => false,
        }
    }

    /// `Firing -> Idle`. A timer scheduled while firing stays pending.
    pub fn finish_firing(&mut self) {
        if matches!(self, DebounceState::Firing) {
            *self = DebounceState::Idle;
        }
    }

    pub fn cancel(&mut self) {
        if let DebounceState::Pending { handle, .. } = std::mem::take(self) {
            handle.abort();
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self {
            DebounceState::Pending { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }
}
