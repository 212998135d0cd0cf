//! Smart toggle: cascading a state change through parents and children.
//!
//! The propagator only computes a change-set. Applying it to the text is the
//! caller's business (see `editing::actions`), which keeps cascades
//! inspectable without touching a document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EditError;

use super::{TodoId, TodoMap, TodoState};

/// How far a cascade reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    AllChildren,
    DirectChildren,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartToggleConfig {
    /// With smart toggle off only the targeted item changes.
    pub enabled: bool,
    /// Checking a parent checks its children.
    pub check_down: Propagation,
    /// Unchecking a parent unchecks its children.
    pub uncheck_down: Propagation,
    /// Checking the last unchecked child checks the parent.
    pub check_up: Propagation,
    /// Unchecking a child unchecks a checked parent.
    pub uncheck_up: Propagation,
}

impl Default for SmartToggleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_down: Propagation::DirectChildren,
            uncheck_down: Propagation::None,
            check_up: Propagation::DirectChildren,
            uncheck_up: Propagation::DirectChildren,
        }
    }
}

impl SmartToggleConfig {
    fn down(&self, state: TodoState) -> Propagation {
        match state {
            TodoState::Checked => self.check_down,
            TodoState::Unchecked => self.uncheck_down,
        }
    }

    fn up(&self, state: TodoState) -> Propagation {
        match state {
            TodoState::Checked => self.check_up,
            TodoState::Unchecked => self.uncheck_up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub id: TodoId,
    pub from: TodoState,
    pub to: TodoState,
}

pub type ChangeSet = Vec<StateChange>;

/// Working state of one propagation: the map plus pending changes.
struct Cascade<'a> {
    map: &'a TodoMap,
    pending: HashMap<TodoId, TodoState>,
    changes: ChangeSet,
}

impl<'a> Cascade<'a> {
    fn new(map: &'a TodoMap) -> Self {
        Self {
            map,
            pending: HashMap::new(),
            changes: Vec::new(),
        }
    }

    fn state(&self, id: TodoId) -> Option<TodoState> {
        self.pending
            .get(&id)
            .copied()
            .or_else(|| self.map.get(id).map(|i| i.state))
    }

    /// Records a change; returns whether the item actually changed.
    fn set(&mut self, id: TodoId, to: TodoState) -> bool {
        let Some(current) = self.state(id) else {
            return false;
        };
        if current == to {
            return false;
        }
        self.pending.insert(id, to);
        match self.changes.iter().position(|c| c.id == id) {
            Some(idx) if self.changes[idx].from == to => {
                self.changes.remove(idx);
            }
            Some(idx) => self.changes[idx].to = to,
            None => self.changes.push(StateChange {
                id,
                from: current,
                to,
            }),
        }
        true
    }

    fn children(&self, id: TodoId) -> Vec<TodoId> {
        self.map
            .get(id)
            .map(|i| i.children.clone())
            .unwrap_or_default()
    }

    fn descendants(&self, id: TodoId) -> Vec<TodoId> {
        self.map.descendants(id).into_iter().map(|i| i.id).collect()
    }

    fn cascade_down(&mut self, id: TodoId, to: TodoState, policy: Propagation) {
        match policy {
            Propagation::None => {}
            Propagation::AllChildren => {
                for descendant in self.descendants(id) {
                    self.set(descendant, to);
                }
            }
            Propagation::DirectChildren => {
                for child in self.children(id) {
                    if self.set(child, to) {
                        self.cascade_down(child, to, policy);
                    }
                }
            }
        }
    }

    /// Whether `ancestor` should follow its subtree into `to`.
    fn subtree_demands(&self, ancestor: TodoId, to: TodoState, policy: Propagation) -> bool {
        let scope = match policy {
            Propagation::None => return false,
            Propagation::DirectChildren => self.children(ancestor),
            Propagation::AllChildren => self.descendants(ancestor),
        };
        let is = |id: &TodoId| self.state(*id) == Some(to);
        match to {
            // Every child done means the parent is done.
            TodoState::Checked => !scope.is_empty() && scope.iter().all(is),
            // One open child reopens the parent.
            TodoState::Unchecked => scope.iter().any(is),
        }
    }

    fn cascade_up(&mut self, from: TodoId, to: TodoState, policy: Propagation) {
        let mut cursor = self.map.get(from).and_then(|i| i.parent);
        while let Some(ancestor) = cursor {
            if !self.subtree_demands(ancestor, to, policy) || !self.set(ancestor, to) {
                break;
            }
            cursor = self.map.get(ancestor).and_then(|i| i.parent);
        }
    }
}

/// Computes every state change that setting `id` to `to` causes.
///
/// Setting an item to the state it already has yields an empty change-set.
/// The target comes first, then forced descendants in document order, then
/// ancestors from the nearest outwards.
pub fn propagate(
    map: &TodoMap,
    config: &SmartToggleConfig,
    id: TodoId,
    to: TodoState,
) -> Result<ChangeSet, EditError> {
    if !map.contains(id) {
        return Err(EditError::InvalidTarget(id));
    }

    let mut cascade = Cascade::new(map);
    if !cascade.set(id, to) {
        return Ok(Vec::new());
    }

    if config.enabled {
        cascade.cascade_down(id, to, config.down(to));
        cascade.cascade_up(id, to, config.up(to));
    }

    log::debug!("setting {id} to {to} changes {} items", cascade.changes.len());
    Ok(cascade.changes)
}
