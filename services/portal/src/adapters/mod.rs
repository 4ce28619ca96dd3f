pub mod http;
pub mod wire;

pub use http::HttpBackend;
