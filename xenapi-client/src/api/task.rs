use chrono::{DateTime, Utc};
use xenapi_core::{xen_enum, xen_record, Fault, Ref, TypedValue, XenMap, XenSet};
use xenapi_transport::Transport;

use super::host::Host;
use crate::Session;

xen_enum! {
    pub enum TaskStatusType : "task_status_type" {
        Pending => "pending",
        Success => "success",
        Failure => "failure",
        Cancelling => "cancelling",
        Cancelled => "cancelled",
    }
}

impl TaskStatusType {
    /// The task will not change state again.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Cancelled)
    }
}

xen_record! {
    /// A long-running server-side operation.
    pub struct Task : "task" {
        uuid: String => "uuid",
        name_label: String => "name_label",
        name_description: String => "name_description",
        created: DateTime<Utc> => "created",
        finished: DateTime<Utc> => "finished",
        status: TaskStatusType => "status",
        resident_on: Ref<Host> => "resident_on",
        progress: f64 => "progress",
        result: String => "result",
        error_info: XenSet<String> => "error_info",
        other_config: XenMap<String, String> => "other_config",
        subtasks: XenSet<Ref<Task>> => "subtasks",
    }
}

pub async fn get_record<T: Transport>(session: &Session<T>, task: &Ref<Task>) -> Result<Task, Fault> {
    session.typed_call("task.get_record", &[TypedValue::of(task)]).await
}

pub async fn get_by_uuid<T: Transport>(session: &Session<T>, uuid: &str) -> Result<Ref<Task>, Fault> {
    session.typed_call("task.get_by_uuid", &[TypedValue::string(uuid)]).await
}

pub async fn get_status<T: Transport>(session: &Session<T>, task: &Ref<Task>) -> Result<TaskStatusType, Fault> {
    session.typed_call("task.get_status", &[TypedValue::of(task)]).await
}

/// Completion fraction in `0.0..=1.0`.
pub async fn get_progress<T: Transport>(session: &Session<T>, task: &Ref<Task>) -> Result<f64, Fault> {
    session.typed_call("task.get_progress", &[TypedValue::of(task)]).await
}

pub async fn get_result<T: Transport>(session: &Session<T>, task: &Ref<Task>) -> Result<String, Fault> {
    session.typed_call("task.get_result", &[TypedValue::of(task)]).await
}

pub async fn get_error_info<T: Transport>(session: &Session<T>, task: &Ref<Task>) -> Result<XenSet<String>, Fault> {
    session.typed_call("task.get_error_info", &[TypedValue::of(task)]).await
}

pub async fn get_all<T: Transport>(session: &Session<T>) -> Result<XenSet<Ref<Task>>, Fault> {
    session.typed_call("task.get_all", &[]).await
}

pub async fn cancel<T: Transport>(session: &Session<T>, task: &Ref<Task>) -> Result<(), Fault> {
    session.typed_call_void("task.cancel", &[TypedValue::of(task)]).await
}

pub async fn destroy<T: Transport>(session: &Session<T>, task: &Ref<Task>) -> Result<(), Fault> {
    session.typed_call_void("task.destroy", &[TypedValue::of(task)]).await
}
