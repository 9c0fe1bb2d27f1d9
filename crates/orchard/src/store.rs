//! Shared application state, passed around as a cheap handle.
//!
//! Listeners receive a [`StateChange`] for every setter call that actually changed a
//! value. A setter called from inside a listener is applied at once, but its
//! notification is queued and delivered after the current one finishes, so listeners
//! always observe changes in the order they happened.

use crate::letters::Letter;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

/// Snapshot of everything the store holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub intro_complete: bool,
    pub selected_letter: Option<Arc<Letter>>,
    pub is_muted: bool,
    pub hovered_fruit_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    IntroComplete(bool),
    SelectedLetter(Option<Arc<Letter>>),
    Muted(bool),
    HoveredFruit(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StateChange)>;

#[derive(Default)]
struct Inner {
    state: AppState,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
    queue: VecDeque<StateChange>,
    /// Unsubscribed while the listener list was checked out for delivery.
    removed: Vec<u64>,
    delivering: bool,
}

#[derive(Clone, Default)]
pub struct Store {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("state", &self.inner.borrow().state).finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> AppState {
        self.inner.borrow().state.clone()
    }

    pub fn intro_complete(&self) -> bool {
        self.inner.borrow().state.intro_complete
    }

    pub fn selected_letter(&self) -> Option<Arc<Letter>> {
        self.inner.borrow().state.selected_letter.clone()
    }

    pub fn is_muted(&self) -> bool {
        self.inner.borrow().state.is_muted
    }

    pub fn hovered_fruit_id(&self) -> Option<String> {
        self.inner.borrow().state.hovered_fruit_id.clone()
    }

    pub fn set_intro_complete(&self, value: bool) {
        let changed = self.update(|s| std::mem::replace(&mut s.intro_complete, value) != value);
        if changed {
            self.emit(StateChange::IntroComplete(value));
        }
    }

    /// Letters compare by id; re-selecting the same letter is not a change.
    pub fn set_selected_letter(&self, letter: Option<Arc<Letter>>) {
        let changed = self.update(|s| {
            let same = match (&s.selected_letter, &letter) {
                (Some(a), Some(b)) => a.id == b.id,
                (None, None) => true,
                _ => false,
            };
            if !same {
                s.selected_letter = letter.clone();
            }
            !same
        });
        if changed {
            self.emit(StateChange::SelectedLetter(letter));
        }
    }

    pub fn set_muted(&self, value: bool) {
        let changed = self.update(|s| std::mem::replace(&mut s.is_muted, value) != value);
        if changed {
            self.emit(StateChange::Muted(value));
        }
    }

    pub fn toggle_muted(&self) {
        self.set_muted(!self.is_muted());
    }

    pub fn set_hovered_fruit(&self, id: Option<String>) {
        let changed = self.update(|s| {
            if s.hovered_fruit_id == id {
                false
            } else {
                s.hovered_fruit_id = id.clone();
                true
            }
        });
        if changed {
            self.emit(StateChange::HoveredFruit(id));
        }
    }

    pub fn subscribe(&self, listener: impl FnMut(&StateChange) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.push((id, Box::new(listener)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id.0);
        if inner.delivering && inner.listeners.len() == before {
            inner.removed.push(id.0);
        }
    }

    fn update(&self, apply: impl FnOnce(&mut AppState) -> bool) -> bool {
        apply(&mut self.inner.borrow_mut().state)
    }

    fn emit(&self, change: StateChange) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.queue.push_back(change);
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }

        loop {
            let (change, mut listeners) = {
                let mut inner = self.inner.borrow_mut();
                let Some(change) = inner.queue.pop_front() else {
                    inner.delivering = false;
                    break;
                };
                (change, std::mem::take(&mut inner.listeners))
            };

            for (id, listener) in listeners.iter_mut() {
                if self.inner.borrow().removed.contains(id) {
                    continue;
                }
                listener(&change);
            }

            let mut inner = self.inner.borrow_mut();
            let removed = std::mem::take(&mut inner.removed);
            let added = std::mem::take(&mut inner.listeners);
            listeners.retain(|(id, _)| !removed.contains(id));
            listeners.extend(added);
            inner.listeners = listeners;
        }
    }
}
