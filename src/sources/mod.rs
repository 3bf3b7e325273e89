//! Concrete collaborators.

mod http;

pub use http::HttpSource;
