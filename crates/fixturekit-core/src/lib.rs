//! Core types for fixturekit.
//!
//! This crate provides the building blocks shared by the builder, the mocks
//! and the facade:
//!
//! - `TypeDefinition` metadata for attributes, relationships and traits
//! - the `Schema` collaborator trait and its in-memory `SchemaRegistry`
//! - `Record`/`Sideloads`/`Graph` for built fixtures
//! - `Overrides`/`FieldInput` describing what a test asks for
//! - per-type `Sequences`, inflection helpers, configuration and errors

pub mod config;
pub mod definition;
pub mod error;
pub mod inflect;
pub mod input;
pub mod record;
pub mod schema;
pub mod sequence;

pub use config::{DocumentStyle, FactoryConfig, KeyStyle};
pub use definition::{
    AttributeDefault, AttributeInfo, EmbedMode, RelationshipInfo, RelationshipKind,
    TypeDefinition,
};
pub use error::{
    ConfigError, Error, InvalidOverrideError, InvalidOverrideKind, MissingPrimaryKeyError, Result,
    UnknownTraitError, UnknownTypeError,
};
pub use input::{Fabricate, FieldInput, Overrides};
pub use record::{FieldValue, Graph, Record, Reference, Sideloads};
pub use schema::{Resolved, Schema, SchemaRegistry};
pub use sequence::Sequences;
