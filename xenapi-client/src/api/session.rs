use chrono::{DateTime, Utc};
use xenapi_core::{xen_record, Fault, Ref, TypedValue, XenMap};
use xenapi_transport::Transport;

use super::host::Host;
use crate::Session;

xen_record! {
    /// A login session as the server sees it.
    pub struct SessionRecord : "session" {
        uuid: String => "uuid",
        this_host: Ref<Host> => "this_host",
        last_active: DateTime<Utc> => "last_active",
        pool: bool => "pool",
        is_local_superuser: bool => "is_local_superuser",
        auth_user_name: String => "auth_user_name",
        originator: String => "originator",
        other_config: XenMap<String, String> => "other_config",
    }
}

/// Host this session is connected to.
pub async fn get_this_host<T: Transport>(session: &Session<T>) -> Result<Ref<Host>, Fault> {
    let this = session.reference()?.clone();
    session.typed_call("session.get_this_host", &[TypedValue::of(&this)]).await
}

pub async fn get_uuid<T: Transport>(session: &Session<T>) -> Result<String, Fault> {
    let this = session.reference()?.clone();
    session.typed_call("session.get_uuid", &[TypedValue::of(&this)]).await
}

pub async fn get_record<T: Transport>(session: &Session<T>) -> Result<SessionRecord, Fault> {
    let this = session.reference()?.clone();
    session.typed_call("session.get_record", &[TypedValue::of(&this)]).await
}
