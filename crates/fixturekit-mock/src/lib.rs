//! Store and request mocks for fixturekit.
//!
//! - [`Store`]: identity map backing `make`/`make_list`
//! - [`MockRegistry`]: answers simulated requests with unwrapped fixtures

pub mod mock;
pub mod store;

pub use mock::{MockHandle, MockRegistry, MockRequest, MockResponse, Method};
pub use store::Store;
