//! NAV data source adapters

pub mod http;

pub use http::HttpNavProvider;
