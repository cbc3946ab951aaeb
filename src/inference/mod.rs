/// Hosted detection API
///
/// - `client.rs` - multipart upload to the configured endpoint, one attempt per call
/// - `response.rs` - tolerant parsing of the `predictions` payload into `Detection`s

pub mod client;
pub mod response;

pub use client::InferenceClient;
