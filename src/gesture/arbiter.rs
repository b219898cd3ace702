//! Tap / long-press / pan race for a single pointer.
//!
//! Exactly one recognizer wins per press. Pan wins as soon as the pointer
//! leaves the slop radius; long-press wins when the pointer is held still
//! for [`LONG_PRESS_DURATION`]; tap wins on a quick release inside the slop.

use std::time::{Duration, Instant};

use super::interpreter::{Commit, Displacement, DragFeedback, DragSession};

/// Minimum travel before a press turns into a pan, in points
pub const MIN_DRAG_DISTANCE: f32 = 10.0;
/// Hold time that turns a still press into a long-press
pub const LONG_PRESS_DURATION: Duration = Duration::from_millis(500);

/// A position in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    fn displacement_from(self, origin: Point) -> Displacement {
        Displacement::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Raw pointer input for one card
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// The pointer left the surface abnormally (focus loss, terminal resize)
    Cancel,
}

/// Recognized gesture output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Pan recognized; dragging starts
    DragBegin,
    /// Live drag feedback for the current frame
    DragUpdate(DragFeedback),
    /// Drag released or cancelled; carries the single commit
    DragEnd(Commit),
    /// Quick press without movement
    Tap,
    /// Held press without movement, reported on release
    LongPress,
}

#[derive(Debug, Clone, Default)]
enum Phase {
    #[default]
    Idle,
    /// Down received, no recognizer has won yet
    Pressed { origin: Point, since: Instant },
    /// Pan won
    Panning { origin: Point, session: DragSession },
    /// Long-press won; waiting for release
    LongPressed,
}

/// Gesture race for one pointer on one card
#[derive(Debug, Clone, Default)]
pub struct GestureArbiter {
    phase: Phase,
}

impl GestureArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a pan is in progress
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Panning { .. })
    }

    /// True between Down and the end of the interaction
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Feed one pointer event at time `now`
    pub fn handle(&mut self, event: PointerEvent, now: Instant) -> Vec<GestureEvent> {
        let mut out = Vec::new();
        match event {
            PointerEvent::Down(at) => {
                // A stray Down while active restarts the race
                if let Phase::Panning { session, .. } = &mut self.phase {
                    out.push(GestureEvent::DragEnd(session.cancel()));
                }
                self.phase = Phase::Pressed {
                    origin: at,
                    since: now,
                };
            }
            PointerEvent::Move(at) => {
                self.poll_long_press(now);
                match &mut self.phase {
                    Phase::Pressed { origin, .. } => {
                        let origin = *origin;
                        let d = at.displacement_from(origin);
                        if d.distance() > MIN_DRAG_DISTANCE {
                            let mut session = DragSession::begin();
                            out.push(GestureEvent::DragBegin);
                            out.push(GestureEvent::DragUpdate(session.update(d)));
                            self.phase = Phase::Panning { origin, session };
                        }
                    }
                    Phase::Panning { origin, session } => {
                        let d = at.displacement_from(*origin);
                        out.push(GestureEvent::DragUpdate(session.update(d)));
                    }
                    Phase::Idle | Phase::LongPressed => {}
                }
            }
            PointerEvent::Up(at) => {
                self.poll_long_press(now);
                match std::mem::take(&mut self.phase) {
                    Phase::Pressed { .. } => out.push(GestureEvent::Tap),
                    Phase::Panning {
                        origin,
                        mut session,
                    } => {
                        let commit = session.end(at.displacement_from(origin));
                        out.push(GestureEvent::DragEnd(commit));
                    }
                    Phase::LongPressed => out.push(GestureEvent::LongPress),
                    Phase::Idle => {}
                }
            }
            PointerEvent::Cancel => {
                if let Phase::Panning { mut session, .. } = std::mem::take(&mut self.phase) {
                    out.push(GestureEvent::DragEnd(session.cancel()));
                }
            }
        }
        out
    }

    /// Advance time without pointer input so a still press can become a
    /// long-press
    pub fn tick(&mut self, now: Instant) {
        self.poll_long_press(now);
    }

    fn poll_long_press(&mut self, now: Instant) {
        if let Phase::Pressed { since, .. } = self.phase
            && now.duration_since(since) >= LONG_PRESS_DURATION
        {
            self.phase = Phase::LongPressed;
        }
    }
}
