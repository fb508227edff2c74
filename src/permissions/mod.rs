// Role-based permission lookup: a user may do whatever the union of their
// roles' slugs (`resource.action`) allows. No inheritance, deny rules or expiry.

mod cache;
mod checker;
mod directory;

pub use cache::PermissionCache;
pub use checker::PermissionChecker;
pub use directory::{GrantsFile, InMemoryDirectory, RoleDirectory};

// "resource.action", both halves non-empty
pub fn is_valid_slug(slug: &str) -> bool {
    match slug.split_once('.') {
        Some((resource, action)) => {
            !resource.is_empty() && !action.is_empty() && !action.contains('.')
        }
        None => false,
    }
}
