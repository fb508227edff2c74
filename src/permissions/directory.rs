use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::is_valid_slug;
use crate::error::{AppError, Result};

/// Read side of the user/role/permission records.
///
/// `roles_for_user` returns `None` for users the directory has never heard of,
/// which callers treat the same as a user with no roles. Lookup failures come
/// back as `Err` and are never folded into "not permitted".
///
/// `revision` must change whenever any grant changes; caches key off it.
pub trait RoleDirectory: Send + Sync {
    fn roles_for_user(&self, user_id: &str) -> Result<Option<HashSet<String>>>;
    fn permissions_for_role(&self, role_id: &str) -> Result<HashSet<String>>;
    fn revision(&self) -> u64;
}

// On-disk seed format
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantsFile {
    #[serde(default)]
    pub roles: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub users: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: DashMap<String, HashSet<String>>, // user -> roles
    roles: DashMap<String, HashSet<String>>, // role -> permission slugs
    revision: AtomicU64,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_grants(grants: GrantsFile) -> Result<Self> {
        let directory = Self::new();

        for (role, slugs) in grants.roles {
            directory.roles.entry(role.clone()).or_default();
            for slug in slugs {
                directory.grant_permission(&role, &slug)?;
            }
        }
        for (user, roles) in grants.users {
            directory.upsert_user(&user);
            for role in roles {
                directory.assign_role(&user, &role);
            }
        }

        Ok(directory)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let grants: GrantsFile = serde_json::from_str(&raw)?;
        let directory = Self::from_grants(grants)?;

        info!(
            "Loaded grants from {}: {} roles, {} users",
            path.as_ref().display(),
            directory.roles.len(),
            directory.users.len()
        );
        Ok(directory)
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    // Register a user with no roles. Returns false if already known.
    pub fn upsert_user(&self, user_id: &str) -> bool {
        if self.users.contains_key(user_id) {
            return false;
        }
        self.users.insert(user_id.to_owned(), HashSet::new());
        self.bump();
        true
    }

    pub fn assign_role(&self, user_id: &str, role_id: &str) -> bool {
        let added = self
            .users
            .entry(user_id.to_owned())
            .or_default()
            .insert(role_id.to_owned());
        if added {
            self.bump();
        }
        added
    }

    pub fn revoke_role(&self, user_id: &str, role_id: &str) -> bool {
        let removed = self
            .users
            .get_mut(user_id)
            .map(|mut roles| roles.remove(role_id))
            .unwrap_or(false);
        if removed {
            self.bump();
        }
        removed
    }

    pub fn grant_permission(&self, role_id: &str, slug: &str) -> Result<bool> {
        if !is_valid_slug(slug) {
            return Err(AppError::InvalidSlug(slug.to_owned()));
        }
        let added = self
            .roles
            .entry(role_id.to_owned())
            .or_default()
            .insert(slug.to_owned());
        if added {
            self.bump();
        }
        Ok(added)
    }

    pub fn revoke_permission(&self, role_id: &str, slug: &str) -> bool {
        let removed = self
            .roles
            .get_mut(role_id)
            .map(|mut slugs| slugs.remove(slug))
            .unwrap_or(false);
        if removed {
            self.bump();
        }
        removed
    }

    // Delete a role and take it away from everyone holding it
    pub fn remove_role(&self, role_id: &str) -> bool {
        let existed = self.roles.remove(role_id).is_some();
        let mut held = false;
        for mut roles in self.users.iter_mut() {
            held |= roles.remove(role_id);
        }
        if existed || held {
            self.bump();
        }
        existed || held
    }
}

impl RoleDirectory for InMemoryDirectory {
    fn roles_for_user(&self, user_id: &str) -> Result<Option<HashSet<String>>> {
        Ok(self.users.get(user_id).map(|roles| roles.clone()))
    }

    fn permissions_for_role(&self, role_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .roles
            .get(role_id)
            .map(|slugs| slugs.clone())
            .unwrap_or_default())
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}
