use xenapi_core::{xen_record, Fault, Ref, TypedValue, XenMap, XenSet};
use xenapi_transport::Transport;

use super::vm::Vm;
use crate::Session;

xen_record! {
    /// A physical host in the pool.
    pub struct Host : "host" {
        uuid: String => "uuid",
        name_label: String => "name_label",
        name_description: String => "name_description",
        hostname: String => "hostname",
        address: String => "address",
        enabled: bool => "enabled",
        api_version_major: i64 => "API_version_major",
        api_version_minor: i64 => "API_version_minor",
        api_version_vendor: String => "API_version_vendor",
        memory_overhead: i64 => "memory_overhead",
        resident_vms: XenSet<Ref<Vm>> => "resident_VMs",
        software_version: XenMap<String, String> => "software_version",
        tags: XenSet<String> => "tags",
        other_config: XenMap<String, String> => "other_config",
    }
}

pub async fn get_record<T: Transport>(session: &Session<T>, host: &Ref<Host>) -> Result<Host, Fault> {
    session.typed_call("host.get_record", &[TypedValue::of(host)]).await
}

pub async fn get_by_uuid<T: Transport>(session: &Session<T>, uuid: &str) -> Result<Ref<Host>, Fault> {
    session.typed_call("host.get_by_uuid", &[TypedValue::string(uuid)]).await
}

pub async fn get_all<T: Transport>(session: &Session<T>) -> Result<XenSet<Ref<Host>>, Fault> {
    session.typed_call("host.get_all", &[]).await
}

pub async fn get_name_label<T: Transport>(session: &Session<T>, host: &Ref<Host>) -> Result<String, Fault> {
    session.typed_call("host.get_name_label", &[TypedValue::of(host)]).await
}

pub async fn set_name_label<T: Transport>(session: &Session<T>, host: &Ref<Host>, label: &str) -> Result<(), Fault> {
    session
        .typed_call_void("host.set_name_label", &[TypedValue::of(host), TypedValue::string(label)])
        .await
}

pub async fn get_api_version_major<T: Transport>(session: &Session<T>, host: &Ref<Host>) -> Result<i64, Fault> {
    session.typed_call("host.get_API_version_major", &[TypedValue::of(host)]).await
}

pub async fn get_api_version_minor<T: Transport>(session: &Session<T>, host: &Ref<Host>) -> Result<i64, Fault> {
    session.typed_call("host.get_API_version_minor", &[TypedValue::of(host)]).await
}

pub async fn get_resident_vms<T: Transport>(session: &Session<T>, host: &Ref<Host>) -> Result<XenSet<Ref<Vm>>, Fault> {
    session.typed_call("host.get_resident_VMs", &[TypedValue::of(host)]).await
}
