use xenapi_core::{xen_enum, xen_record, Fault, RecordOpt, Ref, TypedValue, XenMap, XenSet};
use xenapi_transport::Transport;

use super::host::Host;
use super::task::Task;
use crate::Session;

xen_enum! {
    pub enum VmPowerState : "vm_power_state" {
        Halted => "Halted",
        Paused => "Paused",
        Running => "Running",
        Suspended => "Suspended",
    }
}

xen_record! {
    /// A guest.
    ///
    /// `resident_on` arrives as a bare handle from `get_record`, or inline
    /// when the server expands it.
    pub struct Vm : "VM" {
        uuid: String => "uuid",
        name_label: String => "name_label",
        name_description: String => "name_description",
        power_state: VmPowerState => "power_state",
        is_a_template: bool => "is_a_template",
        is_control_domain: bool => "is_control_domain",
        resident_on: RecordOpt<Host> => "resident_on",
        memory_static_max: i64 => "memory_static_max",
        vcpus_max: i64 => "VCPUs_max",
        tags: XenSet<String> => "tags",
        other_config: XenMap<String, String> => "other_config",
    }
}

pub async fn get_record<T: Transport>(session: &Session<T>, vm: &Ref<Vm>) -> Result<Vm, Fault> {
    session.typed_call("VM.get_record", &[TypedValue::of(vm)]).await
}

pub async fn get_by_uuid<T: Transport>(session: &Session<T>, uuid: &str) -> Result<Ref<Vm>, Fault> {
    session.typed_call("VM.get_by_uuid", &[TypedValue::string(uuid)]).await
}

pub async fn get_by_name_label<T: Transport>(session: &Session<T>, label: &str) -> Result<XenSet<Ref<Vm>>, Fault> {
    session.typed_call("VM.get_by_name_label", &[TypedValue::string(label)]).await
}

pub async fn get_uuid<T: Transport>(session: &Session<T>, vm: &Ref<Vm>) -> Result<String, Fault> {
    session.typed_call("VM.get_uuid", &[TypedValue::of(vm)]).await
}

pub async fn get_power_state<T: Transport>(session: &Session<T>, vm: &Ref<Vm>) -> Result<VmPowerState, Fault> {
    session.typed_call("VM.get_power_state", &[TypedValue::of(vm)]).await
}

pub async fn get_resident_on<T: Transport>(session: &Session<T>, vm: &Ref<Vm>) -> Result<Ref<Host>, Fault> {
    session.typed_call("VM.get_resident_on", &[TypedValue::of(vm)]).await
}

pub async fn get_all<T: Transport>(session: &Session<T>) -> Result<XenSet<Ref<Vm>>, Fault> {
    session.typed_call("VM.get_all", &[]).await
}

/// Every VM record keyed by its server handle.
pub async fn get_all_records<T: Transport>(session: &Session<T>) -> Result<XenMap<Ref<Vm>, Vm>, Fault> {
    session.typed_call("VM.get_all_records", &[]).await
}

pub async fn set_name_label<T: Transport>(session: &Session<T>, vm: &Ref<Vm>, label: &str) -> Result<(), Fault> {
    session
        .typed_call_void("VM.set_name_label", &[TypedValue::of(vm), TypedValue::string(label)])
        .await
}

pub async fn start<T: Transport>(session: &Session<T>, vm: &Ref<Vm>, start_paused: bool, force: bool) -> Result<(), Fault> {
    session
        .typed_call_void("VM.start", &[TypedValue::of(vm), TypedValue::of(&start_paused), TypedValue::of(&force)])
        .await
}

pub async fn async_start<T: Transport>(
    session: &Session<T>,
    vm: &Ref<Vm>,
    start_paused: bool,
    force: bool,
) -> Result<Ref<Task>, Fault> {
    session
        .typed_call_async("VM.start", &[TypedValue::of(vm), TypedValue::of(&start_paused), TypedValue::of(&force)])
        .await
}

pub async fn clean_shutdown<T: Transport>(session: &Session<T>, vm: &Ref<Vm>) -> Result<(), Fault> {
    session.typed_call_void("VM.clean_shutdown", &[TypedValue::of(vm)]).await
}

pub async fn async_clean_shutdown<T: Transport>(session: &Session<T>, vm: &Ref<Vm>) -> Result<Ref<Task>, Fault> {
    session.typed_call_async("VM.clean_shutdown", &[TypedValue::of(vm)]).await
}

pub async fn destroy<T: Transport>(session: &Session<T>, vm: &Ref<Vm>) -> Result<(), Fault> {
    session.typed_call_void("VM.destroy", &[TypedValue::of(vm)]).await
}
