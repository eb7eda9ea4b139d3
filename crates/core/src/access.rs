//! Actors, roles and the access gate.
//!
//! The workflow engine never authenticates anybody. It is handed an [`Actor`] that an
//! [`AccessGate`] has already resolved, and it only reads the actor's roles.
//!
//! The gate shipped here is backed by an [`ActorDirectory`], loaded from YAML, that maps
//! opaque bearer tokens to actors.

use crate::error::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use testreq_types::{ActorId, NonEmptyText};

/// Capability held by an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Doctor,
    Tester,
    Admin,
    User,
}

/// An authenticated identity invoking workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: NonEmptyText,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(id: ActorId, name: NonEmptyText, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            name,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Fails with [`WorkflowError::Permission`] unless the actor holds `role`.
    pub fn require(&self, role: Role) -> WorkflowResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(WorkflowError::permission(
                self.id,
                format!("role {role:?} required"),
            ))
        }
    }
}

/// Resolves the identity of whoever is making the current call.
pub trait AccessGate {
    /// # Errors
    ///
    /// Returns [`WorkflowError::Unauthenticated`] if no actor can be resolved.
    fn current_actor(&self) -> WorkflowResult<Actor>;
}

/// Gate that always answers with the same actor. Used by the CLI after it has looked a token up.
#[derive(Debug, Clone)]
pub struct FixedAccessGate(pub Actor);

impl AccessGate for FixedAccessGate {
    fn current_actor(&self) -> WorkflowResult<Actor> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryFile {
    actors: Vec<DirectoryEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryEntry {
    id: ActorId,
    name: NonEmptyText,
    token: NonEmptyText,
    roles: BTreeSet<Role>,
}

/// Token → actor lookup table.
#[derive(Debug, Clone, Default)]
pub struct ActorDirectory {
    by_token: HashMap<String, Actor>,
}

impl ActorDirectory {
    /// Parse a directory from YAML text.
    ///
    /// ```yaml
    /// actors:
    ///   - id: 1
    ///     name: Dr Ada
    ///     token: ada-secret
    ///     roles: [DOCTOR]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidInput`] if the YAML does not match the schema, if a token
    /// or actor id appears twice, or if an actor has no roles.
    pub fn from_yaml_str(yaml_text: &str) -> WorkflowResult<Self> {
        let file: DirectoryFile = serde_yaml::from_str(yaml_text)
            .map_err(|e| WorkflowError::InvalidInput(format!("actor directory: {e}")))?;

        let mut ids = HashSet::new();
        let mut by_token = HashMap::with_capacity(file.actors.len());
        for entry in file.actors {
            if entry.roles.is_empty() {
                return Err(WorkflowError::InvalidInput(format!(
                    "actor {} has no roles",
                    entry.id
                )));
            }
            if !ids.insert(entry.id) {
                return Err(WorkflowError::InvalidInput(format!(
                    "actor id {} listed twice",
                    entry.id
                )));
            }
            let actor = Actor::new(entry.id, entry.name, entry.roles);
            if by_token.insert(entry.token.into_inner(), actor).is_some() {
                return Err(WorkflowError::InvalidInput(
                    "actor directory contains a duplicate token".into(),
                ));
            }
        }

        Ok(Self { by_token })
    }

    /// Read and parse a directory file.
    pub fn load(path: &Path) -> WorkflowResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WorkflowError::InvalidInput(format!(
                "cannot read actor directory {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn insert(&mut self, token: impl Into<String>, actor: Actor) {
        self.by_token.insert(token.into(), actor);
    }

    pub fn resolve(&self, token: &str) -> Option<&Actor> {
        self.by_token.get(token)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    /// A gate for one call, holding whatever token the transport extracted.
    pub fn gate(&self, token: Option<&str>) -> TokenAccessGate<'_> {
        TokenAccessGate {
            directory: self,
            token: token.map(str::to_owned),
        }
    }
}

/// Per-call gate backed by an [`ActorDirectory`].
#[derive(Debug)]
pub struct TokenAccessGate<'a> {
    directory: &'a ActorDirectory,
    token: Option<String>,
}

impl AccessGate for TokenAccessGate<'_> {
    fn current_actor(&self) -> WorkflowResult<Actor> {
        let token = self.token.as_deref().ok_or(WorkflowError::Unauthenticated)?;
        self.directory
            .resolve(token)
            .cloned()
            .ok_or(WorkflowError::Unauthenticated)
    }
}
