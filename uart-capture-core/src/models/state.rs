use super::error::CaptureError;

/// Capture controller state machine.
///
/// State transitions:
/// ```text
/// idle → awaiting_sync → reading_payload → accumulating ─┐
///             ↑   ↺ timeout      │ short read              │
///             └──────────────────┴─────────────────────────┘
///                                               ↓
///                                done / cancelled / failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    AwaitingSync,
    ReadingPayload { sample_count: u16 },
    Accumulating { sample_count: u16 },
    Done,
    Cancelled,
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Failed(_))
    }

    /// Short lowercase name, suitable for logs and status lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingSync => "awaiting_sync",
            Self::ReadingPayload { .. } => "reading_payload",
            Self::Accumulating { .. } => "accumulating",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }
}
