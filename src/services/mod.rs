//! Business logic services for the chat relay.

pub mod upstream;

pub use upstream::UpstreamClient;
