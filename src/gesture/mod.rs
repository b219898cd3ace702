//! Gesture-driven kanban interaction.
//!
//! Pointer events flow through [`arbiter`] (tap / long-press / pan race)
//! into [`interpreter`] (drag classification), whose feedback drives the
//! per-card [`animation`] and the board-wide [`highlight`]. [`board`] ties
//! them together for a set of cards.

pub mod animation;
pub mod arbiter;
pub mod board;
pub mod highlight;
pub mod interpreter;

pub use animation::{CardAnimator, CardEffect, CardTransform};
pub use arbiter::{GestureArbiter, GestureEvent, Point, PointerEvent};
pub use board::{BoardAction, KanbanBoard};
pub use highlight::{ColumnHighlighter, ColumnStyle, drop_target};
pub use interpreter::{Commit, Displacement, DragMode, DragSession};
