use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::cache::PermissionCache;
use super::directory::RoleDirectory;
use super::is_valid_slug;
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::metrics::{PERMISSION_CACHE_HITS, PERMISSION_CHECKS, PERMISSION_DENIALS};

pub struct PermissionChecker {
    directory: Arc<dyn RoleDirectory>,
    cache: Option<PermissionCache>,
}

impl PermissionChecker {
    pub fn new(directory: Arc<dyn RoleDirectory>) -> Self {
        Self {
            directory,
            cache: None,
        }
    }

    pub fn with_cache(directory: Arc<dyn RoleDirectory>) -> Self {
        Self {
            directory,
            cache: Some(PermissionCache::new()),
        }
    }

    /// Union of the permission slugs granted by every role the user holds.
    /// Unknown users and users without roles get an empty set.
    pub fn effective_permissions(&self, user_id: &str) -> Result<HashSet<String>> {
        let Some(roles) = self.directory.roles_for_user(user_id)? else {
            return Ok(HashSet::new());
        };

        let mut granted = HashSet::new();
        for role in &roles {
            granted.extend(self.directory.permissions_for_role(role)?);
        }
        Ok(granted)
    }

    pub fn has_permission(&self, user_id: &str, slug: &str) -> Result<bool> {
        PERMISSION_CHECKS.inc();

        // read before computing so a concurrent mutation leaves a stale tag
        let revision = self.directory.revision();

        if let Some(cache) = &self.cache {
            if let Some(allowed) = cache.get(user_id, slug, revision) {
                PERMISSION_CACHE_HITS.inc();
                return Ok(Self::record(user_id, slug, allowed));
            }
        }

        let allowed = self.effective_permissions(user_id)?.contains(slug);

        // ill-formed slugs can never be granted, not worth a slot
        if let Some(cache) = self.cache.as_ref().filter(|_| is_valid_slug(slug)) {
            cache.insert(user_id, slug, revision, allowed);
        }
        Ok(Self::record(user_id, slug, allowed))
    }

    fn record(user_id: &str, slug: &str, allowed: bool) -> bool {
        if !allowed {
            PERMISSION_DENIALS.inc();
            debug!(user_id, slug, "Permission denied");
        }
        allowed
    }

    /// Check against whoever is making the request. Nobody signed in means
    /// no permission.
    pub fn check_permission(&self, current: Option<&CurrentUser>, slug: &str) -> Result<bool> {
        match current {
            Some(user) => self.has_permission(&user.id, slug),
            None => Ok(false),
        }
    }

    // Same as check_permission but as an error for handlers to `?` on
    pub fn require_permission(&self, current: Option<&CurrentUser>, slug: &str) -> Result<()> {
        let Some(user) = current else {
            return Err(AppError::Unauthenticated);
        };
        if self.has_permission(&user.id, slug)? {
            Ok(())
        } else {
            Err(AppError::Forbidden(slug.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::InMemoryDirectory;

    fn directory() -> Arc<InMemoryDirectory> {
        let dir = InMemoryDirectory::new();
        dir.grant_permission("editor", "news.create").unwrap();
        dir.grant_permission("editor", "news.update").unwrap();
        dir.grant_permission("moderator", "news.update").unwrap();
        dir.grant_permission("moderator", "blog.delete").unwrap();
        dir.grant_permission("admin", "user.create").unwrap();
        dir.assign_role("alice", "editor");
        dir.assign_role("alice", "moderator");
        dir.upsert_user("bob");
        Arc::new(dir)
    }

    fn checkers(dir: Arc<InMemoryDirectory>) -> [PermissionChecker; 2] {
        [
            PermissionChecker::new(dir.clone()),
            PermissionChecker::with_cache(dir),
        ]
    }

    #[test]
    fn effective_permissions_is_union_of_roles() {
        let checker = PermissionChecker::new(directory());
        let expected: HashSet<String> = ["news.create", "news.update", "blog.delete"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(checker.effective_permissions("alice").unwrap(), expected);
    }

    #[test]
    fn granted_and_not_granted() {
        for checker in checkers(directory()) {
            for slug in ["news.create", "news.update", "blog.delete"] {
                assert!(checker.has_permission("alice", slug).unwrap(), "{slug}");
            }
            for slug in ["user.create", "menu.update", "news"] {
                assert!(!checker.has_permission("alice", slug).unwrap(), "{slug}");
            }
        }
    }

    #[test]
    fn no_roles_or_unknown_user_is_never_permitted() {
        for checker in checkers(directory()) {
            for slug in ["news.create", "user.create", "blog.delete"] {
                assert!(!checker.has_permission("bob", slug).unwrap());
                assert!(!checker.has_permission("nobody", slug).unwrap());
            }
            assert!(checker.effective_permissions("nobody").unwrap().is_empty());
        }
    }

    #[test]
    fn repeated_checks_agree() {
        for checker in checkers(directory()) {
            let first = checker.has_permission("alice", "news.update").unwrap();
            for _ in 0..10 {
                assert_eq!(checker.has_permission("alice", "news.update").unwrap(), first);
            }
        }
    }

    #[test]
    fn cache_follows_mutations() {
        let dir = directory();
        let checker = PermissionChecker::with_cache(dir.clone());

        assert!(!checker.has_permission("bob", "user.create").unwrap());
        dir.assign_role("bob", "admin");
        assert!(checker.has_permission("bob", "user.create").unwrap());

        assert!(checker.has_permission("alice", "blog.delete").unwrap());
        dir.revoke_permission("moderator", "blog.delete");
        assert!(!checker.has_permission("alice", "blog.delete").unwrap());
    }

    #[test]
    fn check_permission_without_user_is_false() {
        let checker = PermissionChecker::new(directory());
        assert!(!checker.check_permission(None, "news.create").unwrap());

        let alice = CurrentUser { id: "alice".into() };
        assert!(checker.check_permission(Some(&alice), "news.create").unwrap());
    }

    #[test]
    fn require_permission_errors() {
        let checker = PermissionChecker::new(directory());
        let alice = CurrentUser { id: "alice".into() };

        assert!(matches!(
            checker.require_permission(None, "news.create"),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            checker.require_permission(Some(&alice), "user.create"),
            Err(AppError::Forbidden(_))
        ));
        assert!(checker.require_permission(Some(&alice), "news.create").is_ok());
    }

    #[test]
    fn cache_stays_bounded_under_unknown_lookups() {
        let checker = PermissionChecker::with_cache(directory());

        for i in 0..50_000 {
            assert!(!checker.has_permission("ghost", &format!("junk.s{i}")).unwrap());
            assert!(!checker.has_permission("ghost", &format!("junk{i}")).unwrap());
        }

        let cache = checker.cache.as_ref().unwrap();
        assert!(cache.len() <= crate::permissions::cache::DEFAULT_CAPACITY);
        assert!(checker.has_permission("alice", "news.create").unwrap());
    }

    #[test]
    fn ill_formed_slugs_are_not_cached() {
        let checker = PermissionChecker::with_cache(directory());
        assert!(!checker.has_permission("alice", "news").unwrap());
        assert!(checker.cache.as_ref().unwrap().is_empty());
    }

    struct Unreachable;

    impl RoleDirectory for Unreachable {
        fn roles_for_user(&self, _: &str) -> Result<Option<HashSet<String>>> {
            Err(AppError::Directory("connection refused".into()))
        }
        fn permissions_for_role(&self, _: &str) -> Result<HashSet<String>> {
            Err(AppError::Directory("connection refused".into()))
        }
        fn revision(&self) -> u64 {
            0
        }
    }

    #[test]
    fn directory_failure_propagates() {
        let checker = PermissionChecker::with_cache(Arc::new(Unreachable));
        assert!(matches!(
            checker.has_permission("alice", "news.create"),
            Err(AppError::Directory(_))
        ));
    }
}
