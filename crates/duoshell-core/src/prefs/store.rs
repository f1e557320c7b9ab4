//! Observable preference store.
//!
//! Wraps [`Preferences`] in a tokio watch channel so runtime flags (the
//! interception toggle, reloaded settings) have a defined read/write
//! contract with change notification instead of a process-wide mutable
//! global.

use super::settings::Preferences;
use crate::Result;
use duoshell_types::{Gesture, HomeAction, Slot};
use std::path::Path;
use tokio::sync::watch;

/// Shared, observable preferences.
#[derive(Debug)]
pub struct PrefsStore {
    tx: watch::Sender<Preferences>,
}

impl PrefsStore {
    #[must_use]
    pub fn new(prefs: Preferences) -> Self {
        let (tx, _rx) = watch::channel(prefs);
        Self { tx }
    }

    /// Load the store from a preferences file; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Preferences::load(path)?))
    }

    /// Snapshot of the current preferences.
    #[must_use]
    pub fn snapshot(&self) -> Preferences {
        self.tx.borrow().clone()
    }

    /// Subscribe to preference changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }

    /// Apply a mutation and notify subscribers.
    pub fn update(&self, mutate: impl FnOnce(&mut Preferences)) {
        self.tx.send_modify(mutate);
    }

    /// Replace the whole preference set (used by the config reload path).
    pub fn replace(&self, prefs: Preferences) {
        self.tx.send_replace(prefs);
    }

    /// Flip the interception flag; returns the new value.
    pub fn toggle_interception(&self) -> bool {
        let mut active = false;
        self.tx.send_modify(|prefs| {
            prefs.interception_active = !prefs.interception_active;
            active = prefs.interception_active;
        });
        active
    }

    #[must_use]
    pub fn interception_active(&self) -> bool {
        self.tx.borrow().interception_active
    }

    #[must_use]
    pub fn configured_app(&self, slot: Slot) -> Option<String> {
        self.tx.borrow().configured_app(slot).map(String::from)
    }

    #[must_use]
    pub fn gesture_action(&self, gesture: Gesture) -> HomeAction {
        self.tx.borrow().gesture_action(gesture)
    }

    #[must_use]
    pub fn main_screen(&self) -> Slot {
        self.tx.borrow().main_screen()
    }

    #[must_use]
    pub fn show_all_apps(&self) -> bool {
        self.tx.borrow().show_all_apps()
    }

    /// Persist the current preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.snapshot().save(path)
    }
}
