//! Frame-sampled animation primitives and the per-card transform controller.
//!
//! Every animated quantity is an [`AnimatedValue`] advanced by `step(dt)` on
//! each render tick. Springs converge to their target and snap exactly onto
//! it once they are close enough, so a card at rest always reports
//! [`CardTransform::REST`].

use std::time::Duration;

use super::arbiter::GestureEvent;
use super::interpreter::{Commit, DragMode, SWIPE_THRESHOLD};

const SPRING_STIFFNESS: f32 = 100.0;
const SPRING_DAMPING: f32 = 10.0;
const SPRING_MASS: f32 = 1.0;
const REST_DISPLACEMENT: f32 = 0.01;
const REST_SPEED: f32 = 2.0;
/// Integration step upper bound, seconds
const MAX_SUBSTEP: f32 = 0.004;

/// Scale while a card is lifted
pub const DRAG_SCALE: f32 = 1.05;
/// Scale while a card is being torn away
pub const TEAR_SCALE: f32 = 0.95;
/// Rotation at full swipe distance, degrees
pub const MAX_ROTATION_DEG: f32 = 15.0;
/// Fade-out before a confirmed delete reaches the store
pub const FADE_DURATION: Duration = Duration::from_millis(200);
pub const DRAG_ELEVATION: f32 = 8.0;
pub const REST_ELEVATION: f32 = 1.0;
pub const DRAG_Z_INDEX: i32 = 999;
pub const REST_Z_INDEX: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Driver {
    Rest,
    Spring {
        target: f32,
    },
    Timing {
        from: f32,
        to: f32,
        duration: Duration,
        elapsed: Duration,
    },
}

/// A scalar that is either at rest, following a spring, or running a timed
/// ease toward a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedValue {
    value: f32,
    velocity: f32,
    driver: Driver,
}

impl AnimatedValue {
    pub fn new(value: f32) -> Self {
        AnimatedValue {
            value,
            velocity: 0.0,
            driver: Driver::Rest,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_animating(&self) -> bool {
        self.driver != Driver::Rest
    }

    /// Jump to `value`, dropping any running animation
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.velocity = 0.0;
        self.driver = Driver::Rest;
    }

    /// Spring toward `target`, keeping the current velocity
    pub fn spring_to(&mut self, target: f32) {
        if self.driver == (Driver::Spring { target }) {
            return;
        }
        if self.driver == Driver::Rest && self.value == target {
            return;
        }
        self.driver = Driver::Spring { target };
    }

    /// Ease toward `to` over `duration`
    pub fn timing_to(&mut self, to: f32, duration: Duration) {
        self.velocity = 0.0;
        self.driver = Driver::Timing {
            from: self.value,
            to,
            duration,
            elapsed: Duration::ZERO,
        };
    }

    /// Advance by `dt`. Returns true when a timed animation finished during
    /// this step.
    pub fn step(&mut self, dt: Duration) -> bool {
        match self.driver {
            Driver::Rest => false,
            Driver::Spring { target } => {
                let mut remaining = dt.as_secs_f32();
                while remaining > 0.0 {
                    let h = remaining.min(MAX_SUBSTEP);
                    let force = -SPRING_STIFFNESS * (self.value - target)
                        - SPRING_DAMPING * self.velocity;
                    self.velocity += force / SPRING_MASS * h;
                    self.value += self.velocity * h;
                    remaining -= h;
                }
                if (self.value - target).abs() < REST_DISPLACEMENT
                    && self.velocity.abs() < REST_SPEED
                {
                    self.set(target);
                }
                false
            }
            Driver::Timing {
                from,
                to,
                duration,
                elapsed,
            } => {
                let elapsed = elapsed + dt;
                if elapsed >= duration {
                    self.set(to);
                    return true;
                }
                let progress = elapsed.as_secs_f32() / duration.as_secs_f32();
                self.value = from + (to - from) * ease_in_out_quad(progress);
                self.driver = Driver::Timing {
                    from,
                    to,
                    duration,
                    elapsed,
                };
                false
            }
        }
    }
}

fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Piecewise-linear interpolation of `value` over ascending `input` stops,
/// clamped to the first and last `output` values
pub fn interpolate_clamped(value: f32, input: &[f32], output: &[f32]) -> f32 {
    debug_assert_eq!(input.len(), output.len());
    let (Some(&first), Some(&last)) = (input.first(), input.last()) else {
        return value;
    };
    if value <= first {
        return output[0];
    }
    if value >= last {
        return output[output.len() - 1];
    }
    for i in 1..input.len() {
        if value <= input[i] {
            let span = input[i] - input[i - 1];
            let t = if span == 0.0 {
                1.0
            } else {
                (value - input[i - 1]) / span
            };
            return output[i - 1] + (output[i] - output[i - 1]) * t;
        }
    }
    output[output.len() - 1]
}

/// Rotation for a vertical displacement: ±15° at ±SWIPE_THRESHOLD, clamped
pub fn rotation_for(translate_y: f32) -> f32 {
    interpolate_clamped(
        translate_y,
        &[-SWIPE_THRESHOLD, 0.0, SWIPE_THRESHOLD],
        &[-MAX_ROTATION_DEG, 0.0, MAX_ROTATION_DEG],
    )
}

/// Visual state of one card for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub rotation_deg: f32,
    pub opacity: f32,
    pub elevation: f32,
    pub z_index: i32,
    /// Render with the error tint
    pub deleting: bool,
}

impl CardTransform {
    pub const REST: CardTransform = CardTransform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotation_deg: 0.0,
        opacity: 1.0,
        elevation: REST_ELEVATION,
        z_index: REST_Z_INDEX,
        deleting: false,
    };
}

/// Side effect a card asks its owner to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardEffect {
    /// Flip completion (drag into the other column)
    Toggle,
    /// Open the edit dialog (tap)
    Edit,
    /// The delete fade finished; remove the record now
    Remove,
}

/// Delete confirmation lifecycle of one card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePhase {
    #[default]
    Idle,
    /// Confirmation dialog open
    Confirming,
    /// Confirmed; fading out
    Fading,
    /// Fade done and removal emitted
    Removed,
}

/// Drives one card's transform from gesture events and the frame clock
#[derive(Debug, Clone)]
pub struct CardAnimator {
    translate_x: AnimatedValue,
    translate_y: AnimatedValue,
    scale: AnimatedValue,
    opacity: AnimatedValue,
    dragging: bool,
    deleting: bool,
    delete: DeletePhase,
}

impl Default for CardAnimator {
    fn default() -> Self {
        CardAnimator {
            translate_x: AnimatedValue::new(0.0),
            translate_y: AnimatedValue::new(0.0),
            scale: AnimatedValue::new(1.0),
            opacity: AnimatedValue::new(1.0),
            dragging: false,
            deleting: false,
            delete: DeletePhase::Idle,
        }
    }
}

impl CardAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn delete_phase(&self) -> DeletePhase {
        self.delete
    }

    /// Apply one recognized gesture event
    pub fn on_gesture(&mut self, event: &GestureEvent) -> Option<CardEffect> {
        match event {
            GestureEvent::DragBegin => {
                self.dragging = true;
                self.scale.spring_to(DRAG_SCALE);
                None
            }
            GestureEvent::DragUpdate(feedback) => {
                if feedback.mode == DragMode::DeleteCandidate {
                    self.deleting = true;
                    self.scale.spring_to(TEAR_SCALE);
                }
                self.translate_x.set(feedback.translation.dx);
                self.translate_y.set(feedback.translation.dy);
                None
            }
            GestureEvent::DragEnd(commit) => {
                self.dragging = false;
                match commit {
                    Commit::DeleteIntent => {
                        // Keep the translation while the dialog is up; only the scale settles
                        self.scale.spring_to(1.0);
                        self.request_delete();
                        None
                    }
                    Commit::Toggle => {
                        self.spring_home();
                        Some(CardEffect::Toggle)
                    }
                    Commit::SnapBack => {
                        self.spring_home();
                        None
                    }
                }
            }
            GestureEvent::Tap => (!self.dragging).then_some(CardEffect::Edit),
            GestureEvent::LongPress => {
                self.request_delete();
                None
            }
        }
    }

    /// Open the confirmation dialog. No-op unless idle.
    pub fn request_delete(&mut self) {
        if self.delete == DeletePhase::Idle {
            self.delete = DeletePhase::Confirming;
        }
    }

    /// Dialog confirmed: close it and start the fade. Removal is emitted by
    /// [`tick`](Self::tick) once the fade completes.
    pub fn confirm_delete(&mut self) {
        if self.delete == DeletePhase::Confirming {
            self.delete = DeletePhase::Fading;
            self.opacity.timing_to(0.0, FADE_DURATION);
        }
    }

    /// Dialog dismissed: close it and spring every transform back to rest
    pub fn cancel_delete(&mut self) {
        if self.delete == DeletePhase::Confirming {
            self.delete = DeletePhase::Idle;
            self.spring_home();
        }
    }

    /// Bring a removed card back (the removal failed upstream)
    pub fn restore(&mut self) {
        self.delete = DeletePhase::Idle;
        self.opacity.spring_to(1.0);
        self.spring_home();
    }

    /// Advance all animations by `dt`
    pub fn tick(&mut self, dt: Duration) -> Option<CardEffect> {
        self.translate_x.step(dt);
        self.translate_y.step(dt);
        self.scale.step(dt);
        let faded = self.opacity.step(dt);
        if faded && self.delete == DeletePhase::Fading {
            self.delete = DeletePhase::Removed;
            return Some(CardEffect::Remove);
        }
        None
    }

    /// True when nothing is moving and no dialog or fade is pending
    pub fn is_at_rest(&self) -> bool {
        !self.dragging
            && self.delete == DeletePhase::Idle
            && !self.translate_x.is_animating()
            && !self.translate_y.is_animating()
            && !self.scale.is_animating()
            && !self.opacity.is_animating()
    }

    pub fn transform(&self) -> CardTransform {
        let translate_y = self.translate_y.value();
        CardTransform {
            translate_x: self.translate_x.value(),
            translate_y,
            scale: self.scale.value(),
            rotation_deg: rotation_for(translate_y),
            opacity: self.opacity.value(),
            elevation: if self.dragging {
                DRAG_ELEVATION
            } else {
                REST_ELEVATION
            },
            z_index: if self.dragging {
                DRAG_Z_INDEX
            } else {
                REST_Z_INDEX
            },
            deleting: self.deleting,
        }
    }

    fn spring_home(&mut self) {
        self.translate_x.spring_to(0.0);
        self.translate_y.spring_to(0.0);
        self.scale.spring_to(1.0);
        self.deleting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::interpreter::{Displacement, DragFeedback};

    const FRAME: Duration = Duration::from_millis(16);

    fn run_frames(animator: &mut CardAnimator, frames: usize) -> Vec<CardEffect> {
        (0..frames).filter_map(|_| animator.tick(FRAME)).collect()
    }

    fn update(mode: DragMode, dx: f32, dy: f32) -> GestureEvent {
        GestureEvent::DragUpdate(DragFeedback {
            mode,
            translation: Displacement::new(dx, dy),
            column_dx: dx,
        })
    }

    #[test]
    fn spring_converges_exactly() {
        let mut v = AnimatedValue::new(150.0);
        v.spring_to(0.0);
        for _ in 0..400 {
            v.step(FRAME);
        }
        assert_eq!(v.value(), 0.0);
        assert!(!v.is_animating());
    }

    #[test]
    fn timing_reports_completion_once() {
        let mut v = AnimatedValue::new(1.0);
        v.timing_to(0.0, Duration::from_millis(200));
        let finished: Vec<bool> = (0..20).map(|_| v.step(FRAME)).collect();
        assert_eq!(finished.iter().filter(|f| **f).count(), 1);
        assert_eq!(v.value(), 0.0);
    }

    #[test]
    fn timing_eases_monotonically() {
        let mut v = AnimatedValue::new(1.0);
        v.timing_to(0.0, Duration::from_millis(200));
        let mut last = 1.0;
        for _ in 0..12 {
            v.step(FRAME);
            assert!(v.value() <= last);
            last = v.value();
        }
    }

    #[test]
    fn rotation_is_clamped() {
        assert_eq!(rotation_for(0.0), 0.0);
        assert_eq!(rotation_for(40.0), 7.5);
        assert_eq!(rotation_for(-80.0), -15.0);
        assert_eq!(rotation_for(300.0), 15.0);
        assert_eq!(rotation_for(-300.0), -15.0);
    }

    #[test]
    fn drag_lifts_and_follows_pointer() {
        let mut card = CardAnimator::new();
        card.on_gesture(&GestureEvent::DragBegin);
        card.on_gesture(&update(DragMode::Move, 60.0, 10.0));
        run_frames(&mut card, 60);
        let t = card.transform();
        assert_eq!(t.translate_x, 60.0);
        assert_eq!(t.translate_y, 10.0);
        assert_eq!(t.scale, DRAG_SCALE);
        assert_eq!(t.elevation, DRAG_ELEVATION);
        assert_eq!(t.z_index, DRAG_Z_INDEX);
        assert!(!t.deleting);
    }

    #[test]
    fn tearing_shrinks_and_tints() {
        let mut card = CardAnimator::new();
        card.on_gesture(&GestureEvent::DragBegin);
        card.on_gesture(&update(DragMode::DeleteCandidate, 0.0, 60.0));
        run_frames(&mut card, 120);
        let t = card.transform();
        assert_eq!(t.scale, TEAR_SCALE);
        assert!(t.deleting);
        assert_eq!(t.rotation_deg, rotation_for(60.0));
    }

    #[test]
    fn toggle_commit_springs_home() {
        let mut card = CardAnimator::new();
        card.on_gesture(&GestureEvent::DragBegin);
        card.on_gesture(&update(DragMode::Move, 150.0, 0.0));
        let effect = card.on_gesture(&GestureEvent::DragEnd(Commit::Toggle));
        assert_eq!(effect, Some(CardEffect::Toggle));
        run_frames(&mut card, 400);
        assert_eq!(card.transform(), CardTransform::REST);
        assert!(card.is_at_rest());
    }

    #[test]
    fn snap_back_emits_nothing() {
        let mut card = CardAnimator::new();
        card.on_gesture(&GestureEvent::DragBegin);
        card.on_gesture(&update(DragMode::Move, 90.0, 0.0));
        assert_eq!(card.on_gesture(&GestureEvent::DragEnd(Commit::SnapBack)), None);
        assert!(run_frames(&mut card, 400).is_empty());
        assert_eq!(card.transform(), CardTransform::REST);
    }

    #[test]
    fn delete_intent_opens_dialog_without_removing() {
        let mut card = CardAnimator::new();
        card.on_gesture(&GestureEvent::DragBegin);
        card.on_gesture(&update(DragMode::DeleteCandidate, 0.0, 100.0));
        card.on_gesture(&GestureEvent::DragEnd(Commit::DeleteIntent));
        assert_eq!(card.delete_phase(), DeletePhase::Confirming);
        assert!(run_frames(&mut card, 400).is_empty());
        let t = card.transform();
        assert_eq!(t.opacity, 1.0);
        // Still torn away, but no longer shrunk
        assert_eq!((t.translate_x, t.translate_y), (0.0, 100.0));
        assert_eq!(t.scale, 1.0);
    }

    #[test]
    fn removal_waits_for_fade() {
        let mut card = CardAnimator::new();
        card.request_delete();
        card.confirm_delete();
        assert_eq!(card.delete_phase(), DeletePhase::Fading);

        // 160 ms into a 200 ms fade: nothing emitted yet
        assert!(run_frames(&mut card, 10).is_empty());
        assert!(card.transform().opacity > 0.0);

        let effects = run_frames(&mut card, 10);
        assert_eq!(effects, vec![CardEffect::Remove]);
        assert_eq!(card.transform().opacity, 0.0);
        assert_eq!(card.delete_phase(), DeletePhase::Removed);

        // Emitted exactly once
        assert!(run_frames(&mut card, 30).is_empty());
    }

    #[test]
    fn cancel_resets_transform_deterministically() {
        let mut card = CardAnimator::new();
        card.on_gesture(&GestureEvent::DragBegin);
        card.on_gesture(&update(DragMode::DeleteCandidate, 0.0, -95.0));
        card.on_gesture(&GestureEvent::DragEnd(Commit::DeleteIntent));
        card.cancel_delete();
        assert_eq!(card.delete_phase(), DeletePhase::Idle);
        run_frames(&mut card, 400);
        assert_eq!(card.transform(), CardTransform::REST);
        assert!(card.is_at_rest());
    }

    #[test]
    fn confirm_without_dialog_is_ignored() {
        let mut card = CardAnimator::new();
        card.confirm_delete();
        assert_eq!(card.delete_phase(), DeletePhase::Idle);
        assert!(run_frames(&mut card, 30).is_empty());
    }

    #[test]
    fn tap_edits_and_long_press_asks_to_delete() {
        let mut card = CardAnimator::new();
        assert_eq!(card.on_gesture(&GestureEvent::Tap), Some(CardEffect::Edit));
        assert_eq!(card.on_gesture(&GestureEvent::LongPress), None);
        assert_eq!(card.delete_phase(), DeletePhase::Confirming);
    }

    #[test]
    fn restore_brings_card_back() {
        let mut card = CardAnimator::new();
        card.request_delete();
        card.confirm_delete();
        run_frames(&mut card, 20);
        card.restore();
        run_frames(&mut card, 400);
        assert_eq!(card.transform(), CardTransform::REST);
    }
}
