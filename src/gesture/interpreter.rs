//! Per-card drag classification.
//!
//! A [`DragSession`] consumes the displacement of one pointer from the
//! moment a pan is recognized until release, decides once whether the drag
//! is a vertical "tear away" (delete candidate) or a horizontal move, and
//! produces exactly one [`Commit`] at the end.

/// Vertical travel that locks a session into delete-candidate mode while
/// horizontal travel stays below the same value
pub const MODE_LOCK_THRESHOLD: f32 = 20.0;
/// Vertical travel past which a delete candidate asks for confirmation
pub const SWIPE_THRESHOLD: f32 = 80.0;
/// Horizontal travel past which a move lands in the other column
pub const COLUMN_THRESHOLD: f32 = 100.0;

/// Pointer displacement from the gesture origin, in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub dx: f32,
    pub dy: f32,
}

impl Displacement {
    pub const ZERO: Displacement = Displacement { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f32, dy: f32) -> Self {
        Displacement { dx, dy }
    }

    /// Euclidean length
    pub fn distance(self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }
}

/// What a drag session has been classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    /// Still inside the dead zone around the origin
    #[default]
    Undecided,
    /// Vertical tear-away; horizontal motion is ignored
    DeleteCandidate,
    /// Free movement toward a column
    Move,
}

/// The single decision taken when a drag session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Return to rest; nothing is mutated
    SnapBack,
    /// Flip completion. Direction-agnostic: with exactly two columns,
    /// any move past the threshold lands in the other one.
    Toggle,
    /// Open the delete confirmation; nothing is removed yet
    DeleteIntent,
}

/// Live output of one update, consumed by the card animator and the
/// column highlighter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFeedback {
    pub mode: DragMode,
    /// Translation to render. `dx` is pinned at 0 for delete candidates.
    pub translation: Displacement,
    /// Horizontal travel to forward to the column highlighter
    pub column_dx: f32,
}

/// Classification state for one card while a pointer drags it
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    mode: DragMode,
    translation: Displacement,
    committed: Option<Commit>,
}

impl DragSession {
    pub fn begin() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn translation(&self) -> Displacement {
        self.translation
    }

    pub fn committed(&self) -> Option<Commit> {
        self.committed
    }

    /// Feed a new displacement sample. Samples after commit are ignored
    /// and report the frozen state.
    pub fn update(&mut self, raw: Displacement) -> DragFeedback {
        if self.committed.is_none() {
            self.resolve_mode(raw);
            self.translation = match self.mode {
                DragMode::DeleteCandidate => Displacement::new(0.0, raw.dy),
                DragMode::Undecided | DragMode::Move => raw,
            };
        }
        self.feedback()
    }

    /// Decide the outcome from the final displacement. Only the first call
    /// decides; later calls return the same commit.
    pub fn end(&mut self, raw: Displacement) -> Commit {
        if let Some(commit) = self.committed {
            return commit;
        }
        self.update(raw);
        let commit = classify_release(self.mode, raw);
        self.committed = Some(commit);
        commit
    }

    /// The platform aborted the gesture: always a snap-back
    pub fn cancel(&mut self) -> Commit {
        *self.committed.get_or_insert(Commit::SnapBack)
    }

    fn resolve_mode(&mut self, raw: Displacement) {
        if self.mode != DragMode::Undecided {
            return;
        }
        let (ax, ay) = (raw.dx.abs(), raw.dy.abs());
        if ay > MODE_LOCK_THRESHOLD && ax < MODE_LOCK_THRESHOLD {
            self.mode = DragMode::DeleteCandidate;
        } else if ax >= MODE_LOCK_THRESHOLD || ay > MODE_LOCK_THRESHOLD {
            self.mode = DragMode::Move;
        }
    }

    fn feedback(&self) -> DragFeedback {
        DragFeedback {
            mode: self.mode,
            translation: self.translation,
            column_dx: match self.mode {
                DragMode::DeleteCandidate => 0.0,
                DragMode::Undecided | DragMode::Move => self.translation.dx,
            },
        }
    }
}

fn classify_release(mode: DragMode, raw: Displacement) -> Commit {
    match mode {
        DragMode::DeleteCandidate if raw.dy.abs() > SWIPE_THRESHOLD => Commit::DeleteIntent,
        DragMode::Move if raw.dx > COLUMN_THRESHOLD || raw.dx < -COLUMN_THRESHOLD => {
            Commit::Toggle
        }
        _ => Commit::SnapBack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(samples: &[(f32, f32)]) -> (DragSession, Vec<DragFeedback>) {
        let mut session = DragSession::begin();
        let feedback = samples
            .iter()
            .map(|&(dx, dy)| session.update(Displacement::new(dx, dy)))
            .collect();
        (session, feedback)
    }

    #[test]
    fn vertical_start_locks_delete_candidate() {
        let (session, feedback) = drag(&[(2.0, 10.0), (5.0, 25.0)]);
        assert_eq!(session.mode(), DragMode::DeleteCandidate);
        assert_eq!(feedback[0].mode, DragMode::Undecided);
        assert_eq!(feedback[1].translation, Displacement::new(0.0, 25.0));
    }

    #[test]
    fn delete_candidate_pins_horizontal_for_rest_of_session() {
        let (session, feedback) = drag(&[(0.0, 30.0), (60.0, 40.0), (150.0, 10.0), (-200.0, 5.0)]);
        assert_eq!(session.mode(), DragMode::DeleteCandidate);
        for fb in &feedback {
            assert_eq!(fb.translation.dx, 0.0);
            assert_eq!(fb.column_dx, 0.0);
        }
    }

    #[test]
    fn horizontal_start_locks_move() {
        let (session, feedback) = drag(&[(20.0, 0.0), (30.0, 60.0)]);
        assert_eq!(session.mode(), DragMode::Move);
        // Vertical travel after the lock does not switch modes
        assert_eq!(feedback[1].mode, DragMode::Move);
        assert_eq!(feedback[1].translation, Displacement::new(30.0, 60.0));
        assert_eq!(feedback[1].column_dx, 30.0);
    }

    #[test]
    fn diagonal_start_is_a_move() {
        let (session, _) = drag(&[(25.0, 25.0)]);
        assert_eq!(session.mode(), DragMode::Move);
    }

    #[test]
    fn dead_zone_stays_undecided() {
        let (session, feedback) = drag(&[(5.0, 5.0), (-10.0, 19.0)]);
        assert_eq!(session.mode(), DragMode::Undecided);
        assert_eq!(feedback[1].translation, Displacement::new(-10.0, 19.0));
    }

    #[test]
    fn move_past_threshold_toggles_either_direction() {
        let (mut right, _) = drag(&[(40.0, 0.0), (150.0, 0.0)]);
        assert_eq!(right.end(Displacement::new(150.0, 0.0)), Commit::Toggle);

        let (mut left, _) = drag(&[(-40.0, 0.0), (-150.0, 0.0)]);
        assert_eq!(left.end(Displacement::new(-150.0, 0.0)), Commit::Toggle);
    }

    #[test]
    fn move_within_threshold_snaps_back() {
        for dx in [100.0, -100.0, 99.0, 0.0, 42.0] {
            let (mut session, _) = drag(&[(30.0, 0.0)]);
            assert_eq!(session.end(Displacement::new(dx, 0.0)), Commit::SnapBack, "dx={dx}");
        }
    }

    #[test]
    fn delete_candidate_below_swipe_threshold_snaps_back() {
        let (mut session, _) = drag(&[(0.0, 30.0), (0.0, 80.0)]);
        assert_eq!(session.end(Displacement::new(0.0, 80.0)), Commit::SnapBack);
    }

    #[test]
    fn delete_candidate_past_swipe_threshold_asks_to_delete() {
        let (mut down, _) = drag(&[(0.0, 30.0)]);
        assert_eq!(down.end(Displacement::new(0.0, 81.0)), Commit::DeleteIntent);

        let (mut up, _) = drag(&[(0.0, -30.0)]);
        assert_eq!(up.end(Displacement::new(3.0, -120.0)), Commit::DeleteIntent);
    }

    #[test]
    fn delete_candidate_never_toggles_even_with_large_dx() {
        let (mut session, _) = drag(&[(0.0, 30.0)]);
        assert_eq!(session.end(Displacement::new(180.0, 40.0)), Commit::SnapBack);
    }

    #[test]
    fn commit_is_decided_once() {
        let (mut session, _) = drag(&[(30.0, 0.0)]);
        assert_eq!(session.end(Displacement::new(150.0, 0.0)), Commit::Toggle);
        assert_eq!(session.end(Displacement::new(0.0, 0.0)), Commit::Toggle);
        assert_eq!(session.cancel(), Commit::Toggle);
        let frozen = session.update(Displacement::new(-300.0, 0.0));
        assert_eq!(frozen.translation, Displacement::new(150.0, 0.0));
    }

    #[test]
    fn tiny_release_snaps_back() {
        let mut session = DragSession::begin();
        assert_eq!(session.end(Displacement::new(3.0, 4.0)), Commit::SnapBack);
        assert_eq!(session.mode(), DragMode::Undecided);
    }

    #[test]
    fn cancel_snaps_back() {
        let (mut session, _) = drag(&[(0.0, 200.0)]);
        assert_eq!(session.cancel(), Commit::SnapBack);
    }
}
