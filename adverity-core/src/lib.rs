//! Adverity Core
//!
//! Resource model and plan engine for managing Adverity objects declaratively.
//! Desired state is loaded from a manifest, compared with recorded state, and
//! the resulting side effects are described as values before anything runs.

pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod manifest;
pub mod plan;
pub mod provider;
pub mod resolver;
pub mod resource;
pub mod schema;
