//! Kanban interaction: routes pointer input to the card under it, keeps one
//! animator per card, and turns card effects into store requests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::animation::{CardAnimator, CardEffect, CardTransform, DeletePhase};
use super::arbiter::{GestureArbiter, GestureEvent, PointerEvent};
use super::highlight::{ColumnHighlighter, ColumnStyle};
use crate::model::Column;

/// A request for the todo store (or the edit dialog) raised by the board
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BoardAction {
    Toggle(String),
    Remove(String),
    Edit(String),
}

#[derive(Debug, Default)]
pub struct KanbanBoard {
    cards: HashMap<String, CardAnimator>,
    /// Card currently under an active pointer
    active: Option<(String, GestureArbiter)>,
    highlighter: ColumnHighlighter,
    /// Card whose delete confirmation is open
    pending_delete: Option<String>,
}

impl KanbanBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one pointer event. `target` is the card under the pointer at
    /// Down; later events follow the card that was pressed.
    pub fn pointer(
        &mut self,
        target: Option<&str>,
        event: PointerEvent,
        now: Instant,
    ) -> Vec<BoardAction> {
        // Cards are inert while a confirmation dialog is open
        if self.pending_delete.is_some() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if let PointerEvent::Down(_) = event {
            self.cancel_active(now, &mut actions);
            let Some(id) = target else {
                return actions;
            };
            self.active = Some((id.to_string(), GestureArbiter::new()));
        }

        let Some((id, arbiter)) = self.active.as_mut() else {
            return actions;
        };
        let id = id.clone();
        let events = arbiter.handle(event, now);
        if !arbiter.is_active() {
            self.active = None;
        }
        self.apply(&id, &events, &mut actions);
        actions
    }

    /// Advance the frame clock
    pub fn tick(&mut self, now: Instant, dt: Duration) -> Vec<BoardAction> {
        if let Some((_, arbiter)) = self.active.as_mut() {
            arbiter.tick(now);
        }
        self.highlighter.tick(dt);
        let mut actions = Vec::new();
        for (id, card) in &mut self.cards {
            if let Some(CardEffect::Remove) = card.tick(dt) {
                actions.push(BoardAction::Remove(id.clone()));
            }
        }
        actions.sort();
        actions
    }

    /// Open the delete confirmation for a card (keyboard path)
    pub fn request_delete(&mut self, id: &str) {
        if self.pending_delete.is_some() {
            return;
        }
        let card = self.cards.entry(id.to_string()).or_default();
        card.request_delete();
        if card.delete_phase() == DeletePhase::Confirming {
            self.pending_delete = Some(id.to_string());
        }
    }

    /// Id of the card whose confirmation dialog is open
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Confirm the open dialog; removal follows once the fade finishes
    pub fn confirm_delete(&mut self) {
        if let Some(id) = self.pending_delete.take()
            && let Some(card) = self.cards.get_mut(&id)
        {
            card.confirm_delete();
        }
    }

    /// Dismiss the open dialog and spring the card back
    pub fn cancel_delete(&mut self) {
        if let Some(id) = self.pending_delete.take()
            && let Some(card) = self.cards.get_mut(&id)
        {
            card.cancel_delete();
        }
    }

    /// Bring a card back after its removal failed
    pub fn restore(&mut self, id: &str) {
        if let Some(card) = self.cards.get_mut(id) {
            card.restore();
        }
    }

    /// Drop animators for cards that no longer exist
    pub fn retain_cards<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = ids.into_iter().collect();
        self.cards.retain(|id, _| keep.contains(id.as_str()));
        if let Some((id, _)) = &self.active
            && !keep.contains(id.as_str())
        {
            self.active = None;
            self.highlighter.reset();
        }
        if let Some(id) = &self.pending_delete
            && !keep.contains(id.as_str())
        {
            self.pending_delete = None;
        }
    }

    pub fn transform(&self, id: &str) -> CardTransform {
        self.cards
            .get(id)
            .map_or(CardTransform::REST, CardAnimator::transform)
    }

    pub fn column_style(&self, column: Column) -> ColumnStyle {
        self.highlighter.style(column)
    }

    pub fn drop_target(&self) -> Option<Column> {
        self.highlighter.target()
    }

    /// Id of the card being dragged, if a pan is in progress
    pub fn dragging(&self) -> Option<&str> {
        self.active
            .as_ref()
            .filter(|(_, arb)| arb.is_dragging())
            .map(|(id, _)| id.as_str())
    }

    /// True while anything still needs frames
    pub fn is_animating(&self) -> bool {
        self.active.is_some() || self.cards.values().any(|c| !c.is_at_rest())
    }

    fn cancel_active(&mut self, now: Instant, actions: &mut Vec<BoardAction>) {
        if let Some((id, mut arbiter)) = self.active.take() {
            let events = arbiter.handle(PointerEvent::Cancel, now);
            self.apply(&id, &events, actions);
        }
    }

    fn apply(&mut self, id: &str, events: &[GestureEvent], actions: &mut Vec<BoardAction>) {
        for event in events {
            match event {
                GestureEvent::DragUpdate(feedback) => self.highlighter.update(feedback.column_dx),
                GestureEvent::DragEnd(commit) => {
                    tracing::debug!(card = id, ?commit, "drag committed");
                    self.highlighter.reset();
                }
                _ => {}
            }
            let card = self.cards.entry(id.to_string()).or_default();
            match card.on_gesture(event) {
                Some(CardEffect::Toggle) => actions.push(BoardAction::Toggle(id.to_string())),
                Some(CardEffect::Edit) => actions.push(BoardAction::Edit(id.to_string())),
                Some(CardEffect::Remove) | None => {}
            }
            if card.delete_phase() == DeletePhase::Confirming && self.pending_delete.is_none() {
                self.pending_delete = Some(id.to_string());
            }
        }
    }
}
