//! Touch input session tracking.
//!
//! The host forwards raw touch events already converted to logical units. Each
//! touch identifier owns at most one [`TouchSession`], created on
//! [`TouchPhase::Begin`] and dropped on [`TouchPhase::End`] or
//! [`TouchPhase::Cancel`]. Events for identifiers without a session are
//! ignored: the host may deliver late events after a session was torn down.

use crate::errors::EngineError;
use std::collections::HashMap;
use std::fmt::Display;

/// Phase of a single touch's lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    /// Finger down
    Begin,
    /// Finger moved while down
    Move,
    /// Finger lifted
    End,
    /// System took the touch away (gesture recognizer, incoming call, ...)
    Cancel,
}

impl TryFrom<i32> for TouchPhase {
    type Error = EngineError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TouchPhase::Begin),
            1 => Ok(TouchPhase::Move),
            2 => Ok(TouchPhase::End),
            3 => Ok(TouchPhase::Cancel),
            other => Err(EngineError::UnknownTouchPhase(other)),
        }
    }
}

impl From<TouchPhase> for i32 {
    fn from(phase: TouchPhase) -> i32 {
        match phase {
            TouchPhase::Begin => 0,
            TouchPhase::Move => 1,
            TouchPhase::End => 2,
            TouchPhase::Cancel => 3,
        }
    }
}

impl Display for TouchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TouchPhase::Begin => write!(f, "Begin"),
            TouchPhase::Move => write!(f, "Move"),
            TouchPhase::End => write!(f, "End"),
            TouchPhase::Cancel => write!(f, "Cancel"),
        }
    }
}

/// In-progress interaction for one touch identifier
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchSession {
    pub id: u64,
    /// Last known position in logical units
    pub x: f32,
    pub y: f32,
    /// Where the touch began, in logical units
    pub start_x: f32,
    pub start_y: f32,
    pub phase: TouchPhase,
}

impl TouchSession {
    fn begin(id: u64, x: f32, y: f32) -> Self {
        Self { id, x, y, start_x: x, start_y: y, phase: TouchPhase::Begin }
    }

    /// Distance travelled since Begin
    pub fn translation(&self) -> (f32, f32) {
        (self.x - self.start_x, self.y - self.start_y)
    }
}

/// Active touch sessions of one render context
#[derive(Debug, Default)]
pub struct InputTracker {
    sessions: HashMap<u64, TouchSession>,
    focused: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a touch event. Returns true when visible state changed.
    pub fn handle_touch(&mut self, id: u64, x: f32, y: f32, phase: TouchPhase) -> bool {
        match phase {
            TouchPhase::Begin => {
                if self.sessions.remove(&id).is_some() {
                    log::debug!("touch {id}: replacing stale session");
                }
                self.sessions.insert(id, TouchSession::begin(id, x, y));
                true
            }
            TouchPhase::Move => match self.sessions.get_mut(&id) {
                Some(session) => {
                    session.phase = TouchPhase::Move;
                    if session.x == x && session.y == y {
                        return false;
                    }
                    session.x = x;
                    session.y = y;
                    true
                }
                None => {
                    log::debug!("touch {id}: move without session ignored");
                    false
                }
            },
            TouchPhase::End | TouchPhase::Cancel => match self.sessions.remove(&id) {
                Some(_) => true,
                None => {
                    log::debug!("touch {id}: {phase} without session ignored");
                    false
                }
            },
        }
    }

    /// Records focus. Returns true when the value flipped.
    pub fn set_focused(&mut self, focused: bool) -> bool {
        if self.focused == focused {
            return false;
        }
        self.focused = focused;
        true
    }

    #[inline]
    pub fn focused(&self) -> bool {
        self.focused
    }

    pub fn session(&self, id: u64) -> Option<&TouchSession> {
        self.sessions.get(&id)
    }

    /// Active sessions, ordered by touch identifier.
    pub fn sessions(&self) -> Vec<TouchSession> {
        let mut out: Vec<TouchSession> = self.sessions.values().copied().collect();
        out.sort_by_key(|s| s.id);
        out
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
