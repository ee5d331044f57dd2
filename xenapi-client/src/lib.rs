//! Session management and typed call dispatch for XenAPI pools.
//!
//! ```no_run
//! # async fn demo() -> Result<(), xenapi_client::Fault> {
//! use xenapi_client::{api::vm, ClientConfig, Session};
//!
//! let config = ClientConfig::new_with_url("https://pool-master/jsonrpc");
//! let transport = config.http_transport().map_err(xenapi_client::Fault::from)?;
//! let mut session = Session::login_with_password(transport, &config, "root", "password").await?;
//!
//! for handle in vm::get_all(&session).await? {
//!     let record = vm::get_record(&session, &handle).await?;
//!     println!("{} {}", record.name_label, record.power_state);
//! }
//! session.logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod session;

pub use config::ClientConfig;
pub use dispatch::{Reply, ASYNC_PREFIX};
pub use session::{ApiVersion, Session, SessionState};

pub use xenapi_core::{
    codes, xen_enum, xen_record, ErrorKind, Fault, Record, RecordOpt, Ref, TypeDescriptor, TypedValue, Value,
    XenEnum, XenMap, XenSet, XenType,
};
pub use xenapi_transport::{ScriptedTransport, Transport, TransportError};
#[cfg(feature = "http")]
pub use xenapi_transport::HttpTransport;
