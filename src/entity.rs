//! Typed entities used as graph nodes.
//!
//! An [`Entity`] is an immutable `(kind, id)` pair. Equality and hashing are by
//! both fields, so a user and a repository sharing a numeric id are distinct.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of an entity.
///
/// `User` and `Organization` are both accounts: [`EntityKind::is_a`] treats
/// `Account` as their common class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Account,
    User,
    Organization,
    Repository,
    Language,
}

impl EntityKind {
    /// Whether an entity of this kind belongs to `class`.
    ///
    /// ```
    /// use stargraph::EntityKind;
    ///
    /// assert!(EntityKind::User.is_a(EntityKind::Account));
    /// assert!(EntityKind::Organization.is_a(EntityKind::Account));
    /// assert!(!EntityKind::Account.is_a(EntityKind::User));
    /// assert!(!EntityKind::Repository.is_a(EntityKind::Account));
    /// ```
    pub fn is_a(self, class: EntityKind) -> bool {
        self == class
            || (class == EntityKind::Account
                && matches!(self, EntityKind::User | EntityKind::Organization))
    }

    /// Type name used in serialized reports.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Account => "Account",
            EntityKind::User => "User",
            EntityKind::Organization => "Organization",
            EntityKind::Repository => "Repository",
            EntityKind::Language => "Language",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Account" => Ok(EntityKind::Account),
            "User" => Ok(EntityKind::User),
            "Organization" => Ok(EntityKind::Organization),
            "Repository" => Ok(EntityKind::Repository),
            "Language" => Ok(EntityKind::Language),
            other => Err(Error::UnknownEntityKind(other.to_string())),
        }
    }
}

/// Identifier of an entity: numeric for accounts and repositories, a name for
/// languages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(u64),
    Name(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Name(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        EntityId::Number(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Name(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Name(s)
    }
}

/// A typed, hashable identity used as a graph node.
///
/// Serializes as `{"type": "User", "id": 42}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: EntityId,
}

impl Entity {
    /// Create an entity of the given kind.
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn user(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::User, id)
    }

    pub fn organization(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Organization, id)
    }

    pub fn account(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Account, id)
    }

    pub fn repository(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Repository, id)
    }

    pub fn language(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Language, id)
    }

    /// Shorthand for `self.kind.is_a(class)`.
    pub fn is_a(&self, class: EntityKind) -> bool {
        self.kind.is_a(class)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_by_kind_and_id() {
        let mut set = HashSet::new();
        set.insert(Entity::user(1));
        set.insert(Entity::repository(1));
        set.insert(Entity::user(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Entity::repository(7)).unwrap();
        assert_eq!(json, r#"{"type":"Repository","id":7}"#);

        let lang: Entity = serde_json::from_str(r#"{"type":"Language","id":"Rust"}"#).unwrap();
        assert_eq!(lang, Entity::language("Rust"));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("User".parse::<EntityKind>().unwrap(), EntityKind::User);
        assert!("Gist".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Entity::user(3).to_string(), "User(3)");
    }
}
