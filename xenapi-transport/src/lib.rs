pub mod transport;
pub mod jsonrpc;
#[cfg(feature = "http")]
pub mod http;
pub mod scripted;

pub use transport::{Transport, TransportError, WireRequest};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use scripted::ScriptedTransport;
