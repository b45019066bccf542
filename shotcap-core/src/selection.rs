//! Interactive region selection.
//!
//! [`SelectionState`] is the pure state machine; the platform drives it from
//! its window procedure, one input event at a time, on the thread that owns
//! the selection window.  The state object is owned by the session and
//! handed to the window procedure by pointer -- it is never a global.
//!
//! ```text
//! Idle --press--> Dragging --release--> Committed
//!   \                |
//!    `----escape-----+-------------------> Cancelled
//! ```

use crate::errors::SelectionError;
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Dragging,
    Committed,
    Cancelled,
}

/// What the window should do after feeding an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionResponse {
    /// Nothing visible changed.
    Ignore,
    /// The rectangle changed; repaint.
    Repaint,
    /// The session is over; release capture and leave the message loop.
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(Rect),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    phase: SelectionPhase,
    origin: Point,
    current: Rect,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            phase: SelectionPhase::Idle,
            origin: Point::default(),
            current: Rect::default(),
        }
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    /// Current rectangle in screen coordinates.
    pub fn rect(&self) -> Rect {
        self.current
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == SelectionPhase::Dragging
    }

    fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            SelectionPhase::Committed | SelectionPhase::Cancelled
        )
    }

    /// Primary button pressed at `at`.
    pub fn press(&mut self, at: Point) -> SelectionResponse {
        if self.phase != SelectionPhase::Idle {
            return SelectionResponse::Ignore;
        }
        self.phase = SelectionPhase::Dragging;
        self.origin = at;
        self.current = Rect::spanning(at, at);
        SelectionResponse::Repaint
    }

    /// Pointer moved to `at`.
    pub fn motion(&mut self, at: Point) -> SelectionResponse {
        if self.phase != SelectionPhase::Dragging {
            return SelectionResponse::Ignore;
        }
        let next = Rect::spanning(self.origin, at);
        if next == self.current {
            return SelectionResponse::Ignore;
        }
        self.current = next;
        SelectionResponse::Repaint
    }

    /// Primary button released at `at`.
    pub fn release(&mut self, at: Point) -> SelectionResponse {
        if self.phase != SelectionPhase::Dragging {
            return SelectionResponse::Ignore;
        }
        self.current = Rect::spanning(self.origin, at);
        self.phase = SelectionPhase::Committed;
        SelectionResponse::Finish
    }

    /// Escape pressed or the window was closed.
    pub fn cancel(&mut self) -> SelectionResponse {
        if self.is_finished() {
            return SelectionResponse::Ignore;
        }
        self.phase = SelectionPhase::Cancelled;
        SelectionResponse::Finish
    }

    /// Final result, `None` while the session is still running.
    pub fn outcome(&self) -> Option<SelectionOutcome> {
        match self.phase {
            SelectionPhase::Committed => Some(SelectionOutcome::Selected(self.current)),
            SelectionPhase::Cancelled => Some(SelectionOutcome::Cancelled),
            SelectionPhase::Idle | SelectionPhase::Dragging => None,
        }
    }
}

/// A blocking, modal selection UI.
pub trait SelectionUi {
    /// Show the overlay and block until the user commits or cancels.
    fn select_region(&self) -> Result<SelectionOutcome, SelectionError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
