// Session and dispatcher tests
// Drives Session over a ScriptedTransport that plays a small pool.

use futures::future::join_all;
use std::collections::HashMap;
use xenapi_client::api::{host, task, vm};
use xenapi_client::api::task::TaskStatusType;
use xenapi_client::api::vm::VmPowerState;
use xenapi_client::logging::init_test_logging;
use xenapi_client::{
    codes, xen_record, ClientConfig, ErrorKind, Fault, Ref, ScriptedTransport, Session, SessionState,
    TransportError, TypeDescriptor, TypedValue, Value, XenType,
};
use xenapi_core::{Envelope, WireValue};

xen_record! {
    pub struct Widget : "widget" {
        uuid: String => "uuid",
        name_label: String => "name_label",
    }
}

const SESSION: &str = "OpaqueRef:session-1";

fn success(value: impl Into<WireValue>) -> Result<WireValue, TransportError> {
    Ok(Envelope::success(value.into()).to_wire())
}

fn failure(description: &[&str]) -> Result<WireValue, TransportError> {
    Ok(Envelope::failure(description.iter().copied()).to_wire())
}

fn arg(params: &[WireValue], index: usize) -> &str {
    params.get(index).and_then(WireValue::as_str).unwrap_or("")
}

/// A pool with one host and two VMs. Logins succeed for bob/secret.
fn pool() -> ScriptedTransport {
    let uuids: HashMap<&str, &str> = [("OpaqueRef:w1", "4b2f-widget"), ("OpaqueRef:vm1", "vm-uuid-1")]
        .into_iter()
        .collect();

    ScriptedTransport::new(move |request| {
        let params = &request.params;
        match request.method.as_str() {
            "session.login_with_password" => {
                if arg(params, 0) == "bob" && arg(params, 1) == "secret" {
                    success(SESSION)
                } else {
                    failure(&[codes::SESSION_AUTHENTICATION_FAILED, arg(params, 0), "Authentication failure"])
                }
            }
            _ if arg(params, 0) != SESSION => failure(&[codes::SESSION_INVALID, arg(params, 0)]),
            "session.logout" => success(""),
            "session.get_this_host" => success("OpaqueRef:host1"),
            "host.get_API_version_major" => success(WireValue::Int(2)),
            "host.get_API_version_minor" => success(WireValue::from("21")),
            "Widget.get_uuid" | "VM.get_uuid" => match uuids.get(arg(params, 1)) {
                Some(uuid) => success(*uuid),
                None => failure(&[codes::HANDLE_INVALID, "widget", arg(params, 1)]),
            },
            "VM.get_power_state" => success("Paused"),
            "VM.get_all" => success(vec![WireValue::from("OpaqueRef:vm1"), WireValue::from("OpaqueRef:vm2")]),
            "VM.get_record" => success(WireValue::structure([
                ("uuid", WireValue::from("vm-uuid-1")),
                ("name_label", WireValue::from("web")),
                ("power_state", WireValue::from("Running")),
                ("resident_on", WireValue::from("OpaqueRef:host1")),
                ("tags", WireValue::Array(vec![WireValue::from("prod")])),
                ("other_config", WireValue::structure([("owner", WireValue::from("ops"))])),
                ("VCPUs_max", WireValue::from("4")),
                ("field_from_the_future", WireValue::Bool(true)),
            ])),
            "VM.get_all_records" => success(WireValue::structure([
                (
                    "OpaqueRef:vm1",
                    WireValue::structure([
                        ("uuid", WireValue::from("vm-uuid-1")),
                        ("power_state", WireValue::from("Halted")),
                    ]),
                ),
                (
                    "OpaqueRef:vm2",
                    WireValue::structure([
                        ("uuid", WireValue::from("vm-uuid-2")),
                        ("power_state", WireValue::from("Migrating")),
                    ]),
                ),
            ])),
            "VM.start" => failure(&[codes::VM_BAD_POWER_STATE, arg(params, 1), "halted", "running"]),
            "VM.clean_shutdown" | "VM.set_name_label" => success(""),
            "Async.VM.start" | "Async.VM.clean_shutdown" => success("OpaqueRef:task-7"),
            "task.get_status" => success("success"),
            "task.get_progress" => success(WireValue::Double(1.0)),
            "task.get_record" => success(WireValue::structure([
                ("uuid", WireValue::from("task-uuid-7")),
                ("status", WireValue::from("failure")),
                ("progress", WireValue::Double(1.0)),
                ("created", WireValue::DateTime("20240301T10:15:00Z".into())),
                (
                    "error_info",
                    WireValue::Array(vec![WireValue::from(codes::VM_BAD_POWER_STATE), WireValue::from("halted")]),
                ),
            ])),
            other => failure(&[codes::MESSAGE_METHOD_UNKNOWN, other]),
        }
    })
}

async fn login(transport: ScriptedTransport) -> Session<ScriptedTransport> {
    Session::login_with_password(transport, &ClientConfig::default(), "bob", "secret")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_and_typed_call() {
    init_test_logging();
    let session = login(pool()).await;
    assert_eq!(session.state(), SessionState::Authenticated);

    let widget: Ref<Widget> = Ref::new("OpaqueRef:w1");
    let uuid: String = session
        .typed_call("Widget.get_uuid", &[TypedValue::of(&widget)])
        .await
        .unwrap();
    assert_eq!(uuid, "4b2f-widget");
}

#[tokio::test]
async fn test_bad_credentials() {
    let err = Session::login_with_password(pool(), &ClientConfig::default(), "bob", "wrong")
        .await
        .unwrap_err();
    assert!(err.is_remote(codes::SESSION_AUTHENTICATION_FAILED));
}

#[tokio::test]
async fn test_stale_handle_reports_remote_failure() {
    let session = login(pool()).await;
    let stale: Ref<Widget> = Ref::new("OpaqueRef:gone");

    let mut out: Option<String> = None;
    match session.typed_call("Widget.get_uuid", &[TypedValue::of(&stale)]).await {
        Ok(uuid) => out = Some(uuid),
        Err(fault) => {
            assert_eq!(fault.kind(), ErrorKind::RemoteFailure);
            assert_eq!(
                fault,
                Fault::remote(codes::HANDLE_INVALID, vec!["widget".into(), "OpaqueRef:gone".into()])
            );
        }
    }
    assert!(out.is_none());

    // A failed call does not poison the session.
    let ok: String = session
        .typed_call("Widget.get_uuid", &[TypedValue::string("OpaqueRef:w1")])
        .await
        .unwrap();
    assert_eq!(ok, "4b2f-widget");
}

#[tokio::test]
async fn test_transport_failure_leaves_no_result() {
    let session = Session::from_reference(ScriptedTransport::unreachable(), Ref::new(SESSION));
    let result: Result<String, Fault> = session
        .typed_call("Widget.get_uuid", &[TypedValue::string("OpaqueRef:w1")])
        .await;

    let fault = result.unwrap_err();
    assert_eq!(fault.kind(), ErrorKind::TransportFailure);
    assert!(fault.is_retryable());
}

#[tokio::test]
async fn test_async_call_targets_async_namespace() {
    let transport = pool();
    let session = login(transport.clone()).await;
    let target: Ref<vm::Vm> = Ref::new("OpaqueRef:vm1");

    let started = vm::async_start(&session, &target, false, false).await.unwrap();
    assert_eq!(started.as_str(), "OpaqueRef:task-7");

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, "Async.VM.start");
    assert_eq!(
        request.params,
        vec![
            WireValue::from(SESSION),
            WireValue::from("OpaqueRef:vm1"),
            WireValue::Bool(false),
            WireValue::Bool(false)
        ]
    );

    let status = task::get_status(&session, &started).await.unwrap();
    assert_eq!(status, TaskStatusType::Success);
    assert!(status.is_finished());
}

#[tokio::test]
async fn test_sync_call_failure_is_remote_fault() {
    let session = login(pool()).await;
    let err = vm::start(&session, &Ref::new("OpaqueRef:vm1"), false, false)
        .await
        .unwrap_err();
    assert!(err.is_remote(codes::VM_BAD_POWER_STATE));
    match err {
        Fault::RemoteFailure { params, .. } => assert_eq!(params, vec!["OpaqueRef:vm1", "halted", "running"]),
        other => panic!("expected remote failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let transport = pool();
    let mut session = login(transport.clone()).await;
    session.logout().await.unwrap();
    assert_eq!(session.state(), SessionState::LoggedOut);
    assert_eq!(transport.last_request().unwrap().method, "session.logout");

    let sent = transport.request_count();
    let err = vm::get_all(&session).await.unwrap_err();
    assert_eq!(err, Fault::NotAuthenticated);
    assert_eq!(transport.request_count(), sent, "no request after logout");
}

#[tokio::test]
async fn test_record_decode_through_session() {
    let session = login(pool()).await;
    let record = vm::get_record(&session, &Ref::new("OpaqueRef:vm1")).await.unwrap();

    assert_eq!(record.uuid, "vm-uuid-1");
    assert_eq!(record.handle.as_str(), "vm-uuid-1");
    assert_eq!(record.power_state, VmPowerState::Running);
    assert_eq!(record.resident_on.handle().map(|h| h.as_str()), Some("OpaqueRef:host1"));
    assert!(!record.resident_on.is_record());
    assert_eq!(record.tags.as_slice(), ["prod".to_string()]);
    assert_eq!(record.other_config.get(&"owner".to_string()).map(String::as_str), Some("ops"));
    assert_eq!(record.vcpus_max, 4);
    // Missing fields take their defaults.
    assert_eq!(record.name_description, "");
    assert!(!record.is_a_template);
}

#[tokio::test]
async fn test_unknown_enumerant_is_soft_fault() {
    let session = login(pool()).await;

    let reply = session
        .typed_call_with_diagnostics::<xenapi_client::XenMap<Ref<vm::Vm>, vm::Vm>>("VM.get_all_records", &[])
        .await
        .unwrap();

    assert_eq!(reply.value.len(), 2);
    let second = reply.value.get(&Ref::new("OpaqueRef:vm2")).unwrap();
    assert_eq!(second.power_state, VmPowerState::Undefined);
    assert_eq!(reply.soft_faults, vec![Fault::unknown_enumerant("vm_power_state", "Migrating")]);

    // The plain call still succeeds.
    let all = vm::get_all_records(&session).await.unwrap();
    assert_eq!(
        all.get(&Ref::new("OpaqueRef:vm1")).map(|v| v.power_state),
        Some(VmPowerState::Halted)
    );
}

#[tokio::test]
async fn test_call_raw_with_explicit_descriptor() {
    let session = login(pool()).await;
    let reply = session
        .call_raw("VM.get_all", &[], &TypeDescriptor::set_of(TypeDescriptor::Reference("VM")))
        .await
        .unwrap();
    assert_eq!(
        reply.value,
        Value::Set(vec![Value::Ref("OpaqueRef:vm1".into()), Value::Ref("OpaqueRef:vm2".into())])
    );

    // The same payload against the wrong shape is a hard failure.
    let err = session
        .call_raw("VM.get_all", &[], &TypeDescriptor::string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[tokio::test]
async fn test_task_record() {
    let session = login(pool()).await;
    let record = task::get_record(&session, &Ref::new("OpaqueRef:task-7")).await.unwrap();

    assert_eq!(record.status, TaskStatusType::Failure);
    assert_eq!(record.error_info.len(), 2);
    assert_eq!(record.error_info[0], codes::VM_BAD_POWER_STATE);
    assert_eq!(record.created.to_rfc3339(), "2024-03-01T10:15:00+00:00");
    assert_eq!(record.handle.as_str(), "task-uuid-7");
}

#[tokio::test]
async fn test_api_version() {
    let session = login(pool()).await;
    let version = session.api_version().await.unwrap();
    assert_eq!((version.major, version.minor), (2, 21));
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let transports: Vec<ScriptedTransport> = (0..4).map(|_| pool()).collect();
    let sessions = join_all(transports.iter().cloned().map(login)).await;

    let target: Ref<vm::Vm> = Ref::new("OpaqueRef:vm1");
    let calls = sessions.iter().map(|session| vm::get_power_state(session, &target));
    let states = join_all(calls).await;
    assert!(states.iter().all(|s| matches!(s, Ok(VmPowerState::Paused))));

    // A failure on one session leaves the others untouched.
    let mixed = join_all(sessions.iter().enumerate().map(|(i, session)| async move {
        let target = if i == 0 { "OpaqueRef:gone" } else { "OpaqueRef:vm1" };
        vm::get_uuid(session, &Ref::new(target)).await
    }))
    .await;
    assert!(mixed[0].as_ref().unwrap_err().is_remote(codes::HANDLE_INVALID));
    assert!(mixed[1..].iter().all(|r| r.as_deref() == Ok("vm-uuid-1")));

    for transport in &transports {
        assert_eq!(transport.request_count(), 3);
    }
}

#[tokio::test]
async fn test_params_encode_in_order() {
    let transport = pool();
    let session = login(transport.clone()).await;
    vm::set_name_label(&session, &Ref::new("OpaqueRef:vm1"), "renamed")
        .await
        .unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, "VM.set_name_label");
    assert_eq!(
        request.params,
        vec![WireValue::from(SESSION), WireValue::from("OpaqueRef:vm1"), WireValue::from("renamed")]
    );
    assert_eq!(host::get_all(&session).await.unwrap_err().kind(), ErrorKind::RemoteFailure);
}

#[tokio::test]
async fn test_typed_value_of_record_handle() {
    let widget = Widget {
        uuid: "w".into(),
        ..Default::default()
    };
    // Records encode as structs; the handle never reaches the wire.
    let wire = TypedValue::of(&widget).encode().unwrap();
    assert!(wire.get("handle").is_none());
    assert_eq!(Widget::from_value(widget.to_value()).unwrap().handle.as_str(), "w");
}
