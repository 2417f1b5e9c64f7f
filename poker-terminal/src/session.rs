//! Identifiers learned from server messages during one run.
//!
//! The receive loop writes, the shell reads. Every setter replaces the stored
//! value outright; nothing is merged and nothing survives the process.

use std::sync::{PoisonError, RwLock};

/// Copy of the tracked identifiers at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub player_id: Option<String>,
    pub game_id: Option<String>,
    pub lobby_id: Option<String>,
}

/// Shared session state for one connected operator.
#[derive(Debug)]
pub struct Session {
    player_name: String,
    ids: RwLock<SessionSnapshot>,
}

impl Session {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ids: RwLock::new(SessionSnapshot::default()),
        }
    }

    /// Display name the operator started with. Never changes.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn set_player_id(&self, id: impl Into<String>) {
        self.write(|ids| ids.player_id = Some(id.into()));
    }

    pub fn set_game_id(&self, id: impl Into<String>) {
        self.write(|ids| ids.game_id = Some(id.into()));
    }

    pub fn set_lobby_id(&self, id: impl Into<String>) {
        self.write(|ids| ids.lobby_id = Some(id.into()));
    }

    pub fn player_id(&self) -> Option<String> {
        self.snapshot().player_id
    }

    pub fn game_id(&self) -> Option<String> {
        self.snapshot().game_id
    }

    pub fn lobby_id(&self) -> Option<String> {
        self.snapshot().lobby_id
    }

    /// Reads all three identifiers under one lock so they are mutually consistent.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        let mut ids = self.ids.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut ids);
    }
}
