use crate::auth::dto::SessionUser;
use crate::auth::repo::Role;

/// Visibility boundary for event data. Every event read or write resolves
/// one of these from the session identity first; handlers never branch on
/// the raw role inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Staff see every event.
    All,
    /// Members see events tagged with their own church.
    Church(String),
    /// Members without a church see nothing. Not an error.
    Empty,
}

impl Scope {
    /// Total over all identities: every session maps to exactly one scope.
    pub fn for_session(user: &SessionUser) -> Scope {
        match (user.role, user.church.as_ref()) {
            (Role::Staff, _) => Scope::All,
            (Role::Member, Some(church)) => Scope::Church(church.clone()),
            (Role::Member, None) => Scope::Empty,
        }
    }
}
