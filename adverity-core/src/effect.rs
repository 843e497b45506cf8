//! Effect - A side effect described as a value
//!
//! Effects are produced by the differ and only executed by the Interpreter.

use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Evaluate a data source
    Read(Resource),
    Create(Resource),
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete `from`, then create `to` (a force-new attribute changed)
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    Delete(State),
}

impl Effect {
    /// Whether executing this Effect changes remote objects
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } => id,
            Effect::Delete(state) => &state.id,
        }
    }

    /// The desired resource this Effect converges to, if any
    pub fn target(&self) -> Option<&Resource> {
        match self {
            Effect::Read(r) | Effect::Create(r) => Some(r),
            Effect::Update { to, .. } | Effect::Replace { to, .. } => Some(to),
            Effect::Delete(_) => None,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Effect::Read(_) => "Read",
            Effect::Create(_) => "Create",
            Effect::Update { .. } => "Update",
            Effect::Replace { .. } => "Replace",
            Effect::Delete(_) => "Delete",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.verb(), self.resource_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_not_mutating() {
        let read = Effect::Read(Resource::new("adverity_workspace", "ws").with_read_only(true));
        assert!(!read.is_mutating());
        assert!(Effect::Create(Resource::new("adverity_workspace", "ws")).is_mutating());
    }

    #[test]
    fn display_uses_verb_and_id() {
        let delete = Effect::Delete(State::not_found(ResourceId::new("adverity_fetch", "f")));
        assert_eq!(delete.to_string(), "Delete adverity_fetch.f");
        assert!(delete.target().is_none());
    }
}
