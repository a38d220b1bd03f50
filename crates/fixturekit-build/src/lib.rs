//! Fixture graph building and document rendering.
//!
//! [`FixtureBuilder`] produces [`BuildResult`]s and [`BuildListResult`]s from a
//! [`Schema`](fixturekit_core::Schema); results expose `get`, `add` and
//! `unwrap` (REST or JSON-API documents, see [`render`]).

pub mod builder;
pub mod render;
pub mod result;

pub use builder::FixtureBuilder;
pub use result::{BuildListResult, BuildResult, graphs};
