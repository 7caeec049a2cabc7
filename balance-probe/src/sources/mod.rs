pub mod portal_http;

pub use portal_http::PortalHttpSource;
