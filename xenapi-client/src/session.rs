use std::fmt;
use tracing::{debug, info, warn};
use xenapi_core::{DecodeContext, Fault, Ref, TypeDescriptor, TypedValue, Value, XenType};
use xenapi_transport::Transport;

use crate::api::session::SessionRecord;
use crate::api::task::Task;
use crate::config::ClientConfig;
use crate::dispatch::{async_method, decode_reply, encode_params, invoke, Reply};

const LOGIN_METHOD: &str = "session.login_with_password";
const LOGOUT_METHOD: &str = "session.logout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    LoggedOut,
}

/// Server API version, as reported by the host the session is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: i64,
    pub minor: i64,
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// An authenticated connection to a pool.
///
/// Every call takes `&self` and returns its own `Result`, so independent
/// calls may be in flight at once. Only [`Session::logout`] needs exclusive
/// access.
pub struct Session<T: Transport> {
    transport: T,
    reference: Option<Ref<SessionRecord>>,
}

impl<T: Transport> Session<T> {
    /// Authenticate against the server and open a new session.
    pub async fn login_with_password(
        transport: T,
        config: &ClientConfig,
        username: &str,
        password: &str,
    ) -> Result<Self, Fault> {
        let params = encode_params(
            None,
            &[
                TypedValue::string(username),
                TypedValue::string(password),
                TypedValue::string(&config.api_version),
                TypedValue::string(&config.originator),
            ],
        )?;

        let payload = match invoke(&transport, LOGIN_METHOD, params).await {
            Ok(payload) => payload,
            Err(fault) => {
                warn!(user = %username, %fault, "login failed");
                return Err(fault);
            }
        };

        let reference = Ref::<SessionRecord>::from_wire(&payload, &mut DecodeContext::new())?;
        info!(user = %username, originator = %config.originator, "session established");

        Ok(Self {
            transport,
            reference: Some(reference),
        })
    }

    /// Wrap a session reference obtained elsewhere.
    pub fn from_reference(transport: T, reference: Ref<SessionRecord>) -> Self {
        Self {
            transport,
            reference: Some(reference),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.reference {
            Some(_) => SessionState::Authenticated,
            None => SessionState::LoggedOut,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The server-side session handle.
    pub fn reference(&self) -> Result<&Ref<SessionRecord>, Fault> {
        self.reference.as_ref().ok_or(Fault::NotAuthenticated)
    }

    /// Invoke `method` and decode the result as `R`.
    ///
    /// Soft faults are logged and dropped; use
    /// [`Session::typed_call_with_diagnostics`] to inspect them.
    pub async fn typed_call<R: XenType>(&self, method: &str, params: &[TypedValue]) -> Result<R, Fault> {
        Ok(self.typed_call_with_diagnostics(method, params).await?.value)
    }

    pub async fn typed_call_with_diagnostics<R: XenType>(
        &self,
        method: &str,
        params: &[TypedValue],
    ) -> Result<Reply<R>, Fault> {
        self.call_raw(method, params, &R::descriptor())
            .await?
            .try_map(R::from_value)
    }

    /// Invoke `method` and decode the result against an explicit descriptor.
    pub async fn call_raw(
        &self,
        method: &str,
        params: &[TypedValue],
        descriptor: &TypeDescriptor,
    ) -> Result<Reply<Value>, Fault> {
        let payload = self.dispatch(method, params).await?;
        decode_reply(method, &payload, descriptor)
    }

    /// Invoke a method whose result is discarded.
    pub async fn typed_call_void(&self, method: &str, params: &[TypedValue]) -> Result<(), Fault> {
        self.dispatch(method, params).await.map(|_| ())
    }

    /// Start `method` as a server-side task and return its handle.
    pub async fn typed_call_async(&self, method: &str, params: &[TypedValue]) -> Result<Ref<Task>, Fault> {
        let task: Ref<Task> = self.typed_call(&async_method(method), params).await?;
        debug!(method, task = %task, "task started");
        Ok(task)
    }

    /// Reported API version of the host this session is connected to.
    pub async fn api_version(&self) -> Result<ApiVersion, Fault> {
        let host = crate::api::session::get_this_host(self).await?;
        let major = crate::api::host::get_api_version_major(self, &host).await?;
        let minor = crate::api::host::get_api_version_minor(self, &host).await?;
        Ok(ApiVersion { major, minor })
    }

    /// End the session on the server.
    ///
    /// The local handle is dropped whatever the outcome; later calls fail
    /// with [`Fault::NotAuthenticated`].
    pub async fn logout(&mut self) -> Result<(), Fault> {
        let result = self.typed_call_void(LOGOUT_METHOD, &[]).await;
        self.reference = None;
        match &result {
            Ok(()) => info!("session closed"),
            Err(fault) => warn!(%fault, "logout failed; session discarded locally"),
        }
        result
    }

    async fn dispatch(&self, method: &str, params: &[TypedValue]) -> Result<xenapi_core::WireValue, Fault> {
        let token = self.reference()?.as_str();
        let wire = encode_params(Some(token), params)?;
        invoke(&self.transport, method, wire).await
    }
}

impl<T: Transport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The session reference is a bearer credential.
        f.debug_struct("Session").field("state", &self.state()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xenapi_core::{Envelope, WireValue};
    use xenapi_transport::ScriptedTransport;

    #[tokio::test]
    async fn test_login_sends_credentials_without_token() {
        let transport = ScriptedTransport::queued(vec![Ok(Envelope::success(WireValue::from("OpaqueRef:s1")))]);
        let session = Session::login_with_password(transport.clone(), &ClientConfig::default(), "root", "pw")
            .await
            .unwrap();

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.reference().unwrap().as_str(), "OpaqueRef:s1");

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, "session.login_with_password");
        assert_eq!(
            request.params,
            vec![
                WireValue::from("root"),
                WireValue::from("pw"),
                WireValue::from("1.0"),
                WireValue::from("xenapi-rs")
            ]
        );
    }

    #[tokio::test]
    async fn test_calls_carry_session_token_first() {
        let transport = ScriptedTransport::queued(vec![Ok(Envelope::success(WireValue::from("u-1")))]);
        let session = Session::from_reference(transport.clone(), Ref::new("OpaqueRef:s2"));

        let uuid: String = session
            .typed_call("VM.get_uuid", &[TypedValue::string("OpaqueRef:vm")])
            .await
            .unwrap();
        assert_eq!(uuid, "u-1");

        let request = transport.last_request().unwrap();
        assert_eq!(request.params[0], WireValue::from("OpaqueRef:s2"));
        assert_eq!(request.params[1], WireValue::from("OpaqueRef:vm"));
    }

    #[test]
    fn test_debug_hides_reference() {
        let session = Session::from_reference(ScriptedTransport::unreachable(), Ref::new("OpaqueRef:secret"));
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("Authenticated"));
    }

    #[test]
    fn test_api_version_ordering() {
        let old = ApiVersion { major: 1, minor: 9 };
        let new = ApiVersion { major: 2, minor: 0 };
        assert!(old < new);
        assert_eq!(new.to_string(), "2.0");
    }
}
