//! Drop-target feedback on the kanban columns.

use std::time::Duration;

use super::animation::AnimatedValue;
use super::interpreter::COLUMN_THRESHOLD;
use crate::model::Column;

/// Scale of the targeted column
pub const TARGET_SCALE: f32 = 1.02;
/// Opacity of the targeted column
pub const TARGET_OPACITY: f32 = 0.9;

/// The column a card dragged by `dx` would be released into.
///
/// Right of the threshold is Completed, left of it is Pending.
pub fn drop_target(dx: f32) -> Option<Column> {
    if dx > COLUMN_THRESHOLD {
        Some(Column::Completed)
    } else if dx < -COLUMN_THRESHOLD {
        Some(Column::Pending)
    } else {
        None
    }
}

/// Visual state of one column for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStyle {
    pub scale: f32,
    pub opacity: f32,
    pub border_highlight: bool,
}

impl ColumnStyle {
    pub const NEUTRAL: ColumnStyle = ColumnStyle {
        scale: 1.0,
        opacity: 1.0,
        border_highlight: false,
    };
}

#[derive(Debug, Clone)]
struct Pulse {
    scale: AnimatedValue,
    opacity: AnimatedValue,
}

impl Pulse {
    fn new() -> Self {
        Pulse {
            scale: AnimatedValue::new(1.0),
            opacity: AnimatedValue::new(1.0),
        }
    }

    fn retarget(&mut self, targeted: bool) {
        if targeted {
            self.scale.spring_to(TARGET_SCALE);
            self.opacity.spring_to(TARGET_OPACITY);
        } else {
            self.scale.spring_to(1.0);
            self.opacity.spring_to(1.0);
        }
    }

    fn step(&mut self, dt: Duration) {
        self.scale.step(dt);
        self.opacity.step(dt);
    }
}

/// Board-wide drop-target selection plus the per-column pulse animation
#[derive(Debug, Clone)]
pub struct ColumnHighlighter {
    target: Option<Column>,
    pending: Pulse,
    completed: Pulse,
}

impl Default for ColumnHighlighter {
    fn default() -> Self {
        ColumnHighlighter {
            target: None,
            pending: Pulse::new(),
            completed: Pulse::new(),
        }
    }
}

impl ColumnHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<Column> {
        self.target
    }

    /// Feed the live horizontal displacement of the dragged card
    pub fn update(&mut self, dx: f32) {
        let target = drop_target(dx);
        if target == self.target {
            return;
        }
        self.target = target;
        self.pending.retarget(target == Some(Column::Pending));
        self.completed.retarget(target == Some(Column::Completed));
    }

    /// No drag in progress
    pub fn reset(&mut self) {
        self.update(0.0);
    }

    pub fn tick(&mut self, dt: Duration) {
        self.pending.step(dt);
        self.completed.step(dt);
    }

    pub fn style(&self, column: Column) -> ColumnStyle {
        let pulse = match column {
            Column::Pending => &self.pending,
            Column::Completed => &self.completed,
        };
        ColumnStyle {
            scale: pulse.scale.value(),
            opacity: pulse.opacity.value(),
            border_highlight: self.target == Some(column),
        }
    }
}
