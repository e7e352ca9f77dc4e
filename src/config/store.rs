//! Live configuration with write-through persistence.
//!
//! Commands change admins, rooms, modes and vars at runtime. Every mutation
//! happens under the write lock and the whole document is re-serialized and
//! written back before the lock is released, so the file never lags behind
//! what the bot acts on.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use warden_proto::{MemberId, RoomId, RoomMode, Setting};

use super::types::{Config, ConfigError, RoomConfig};

/// Shared, persisted configuration.
pub struct ConfigStore {
    path: Option<PathBuf>,
    inner: RwLock<Config>,
}

impl ConfigStore {
    /// Load from `path`; mutations are written back to the same file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::load(path.as_ref())?;
        Ok(Self {
            path: Some(path.as_ref().to_path_buf()),
            inner: RwLock::new(config),
        })
    }

    /// Wrap an already loaded config that persists to `path`.
    pub fn with_path(config: Config, path: PathBuf) -> Self {
        Self {
            path: Some(path),
            inner: RwLock::new(config),
        }
    }

    /// A store that never touches the disk.
    pub fn in_memory(config: Config) -> Self {
        Self {
            path: None,
            inner: RwLock::new(config),
        }
    }

    /// Run `f` against the current config under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Config) -> R) -> R {
        f(&self.inner.read())
    }

    /// Owned copy of the current config.
    pub fn snapshot(&self) -> Config {
        self.inner.read().clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut Config) -> Result<R, ConfigError>) -> Result<R, ConfigError> {
        let mut guard = self.inner.write();
        let mut draft = guard.clone();
        let result = f(&mut draft)?;
        if let Some(path) = &self.path {
            let text = toml::to_string_pretty(&draft)?;
            std::fs::write(path, text)?;
            debug!(path = %path.display(), "Configuration persisted");
        }
        *guard = draft;
        Ok(result)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn prefix(&self) -> String {
        self.read(|c| c.bot.prefix.clone())
    }

    pub fn is_passive(&self) -> bool {
        self.read(|c| c.bot.passive)
    }

    pub fn is_dry_run(&self) -> bool {
        self.read(|c| c.actions.dry_run)
    }

    pub fn monitored_rooms(&self) -> Vec<RoomId> {
        self.read(|c| c.rooms.keys().cloned().collect())
    }

    pub fn is_monitored(&self, room: &RoomId) -> bool {
        self.read(|c| c.rooms.contains_key(room))
    }

    pub fn room(&self, room: &RoomId) -> Option<RoomConfig> {
        self.read(|c| c.rooms.get(room).cloned())
    }

    pub fn modes(&self, room: &RoomId) -> BTreeSet<RoomMode> {
        self.read(|c| c.rooms.get(room).map(|r| r.modes.clone()).unwrap_or_default())
    }

    pub fn is_mode_enabled(&self, room: &RoomId, mode: RoomMode) -> bool {
        self.read(|c| c.rooms.get(room).is_some_and(|r| r.modes.contains(&mode)))
    }

    pub fn param(&self, room: &RoomId, mode: RoomMode) -> Option<String> {
        self.read(|c| {
            c.rooms
                .get(room)
                .and_then(|r| r.param(mode))
                .map(str::to_string)
        })
    }

    pub fn is_admin(&self, member: &MemberId) -> bool {
        self.read(|c| c.admins.contains(member))
    }

    pub fn admins(&self) -> Vec<MemberId> {
        self.read(|c| c.admins.iter().cloned().collect())
    }

    pub fn var(&self, name: &str) -> Option<String> {
        self.read(|c| c.vars.get(name).cloned())
    }

    pub fn vars(&self) -> BTreeMap<String, String> {
        self.read(|c| c.vars.clone())
    }

    pub fn setting(&self, setting: Setting) -> String {
        self.read(|c| match setting {
            Setting::Login => c.homeserver.login.clone(),
            Setting::Host => c.homeserver.url.clone(),
            Setting::Password => c.homeserver.password.clone(),
        })
    }

    // ------------------------------------------------------------------------
    // Mutations (persisted)
    // ------------------------------------------------------------------------

    /// Returns `false` when the member already was an admin.
    pub fn grant_admin(&self, member: &MemberId) -> Result<bool, ConfigError> {
        self.update(|c| Ok(c.admins.insert(member.clone())))
    }

    /// Returns `false` when the member was not an admin.
    pub fn revoke_admin(&self, member: &MemberId) -> Result<bool, ConfigError> {
        self.update(|c| Ok(c.admins.remove(member)))
    }

    /// Returns `false` when the room was already monitored.
    pub fn add_room(&self, room: &RoomId) -> Result<bool, ConfigError> {
        self.update(|c| {
            if c.rooms.contains_key(room) {
                return Ok(false);
            }
            c.rooms.insert(room.clone(), RoomConfig::default());
            Ok(true)
        })
    }

    /// Returns `false` when the room was not monitored.
    pub fn remove_room(&self, room: &RoomId) -> Result<bool, ConfigError> {
        self.update(|c| Ok(c.rooms.remove(room).is_some()))
    }

    pub fn add_mode(&self, room: &RoomId, mode: RoomMode) -> Result<bool, ConfigError> {
        self.update(|c| {
            let entry = c
                .rooms
                .get_mut(room)
                .ok_or_else(|| ConfigError::UnknownRoom(room.clone()))?;
            Ok(entry.modes.insert(mode))
        })
    }

    pub fn remove_mode(&self, room: &RoomId, mode: RoomMode) -> Result<bool, ConfigError> {
        self.update(|c| {
            let entry = c
                .rooms
                .get_mut(room)
                .ok_or_else(|| ConfigError::UnknownRoom(room.clone()))?;
            Ok(entry.modes.remove(&mode))
        })
    }

    pub fn set_param(&self, room: &RoomId, mode: RoomMode, value: &str) -> Result<(), ConfigError> {
        self.update(|c| {
            let entry = c
                .rooms
                .get_mut(room)
                .ok_or_else(|| ConfigError::UnknownRoom(room.clone()))?;
            entry
                .params
                .retain(|key, _| !key.eq_ignore_ascii_case(mode.as_str()));
            entry.params.insert(mode.as_str().to_string(), value.to_string());
            Ok(())
        })
    }

    pub fn set_var(&self, name: &str, payload: &str) -> Result<(), ConfigError> {
        self.update(|c| {
            c.vars.insert(name.to_string(), payload.to_string());
            Ok(())
        })
    }

    /// Returns the removed payload.
    pub fn delete_var(&self, name: &str) -> Result<Option<String>, ConfigError> {
        self.update(|c| Ok(c.vars.remove(name)))
    }

    /// Change a connection setting. The stored session is cleared so the
    /// next start logs in with the new values.
    pub fn set_setting(&self, setting: Setting, value: &str) -> Result<(), ConfigError> {
        self.update(|c| {
            match setting {
                Setting::Login => c.homeserver.login = value.to_string(),
                Setting::Host => c.homeserver.url = value.to_string(),
                Setting::Password => c.homeserver.password = value.to_string(),
            }
            c.homeserver.clear_session();
            Ok(())
        })
    }

    /// Record the session obtained from a password login.
    pub fn store_session(
        &self,
        access_token: &str,
        device_id: Option<&str>,
        user_id: &MemberId,
    ) -> Result<(), ConfigError> {
        self.update(|c| {
            c.homeserver.access_token = Some(access_token.to_string());
            c.homeserver.device_id = device_id.map(str::to_string);
            c.homeserver.user_id = Some(user_id.clone());
            Ok(())
        })
    }
}
