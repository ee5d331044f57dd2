// Response envelope.
//
// Every method response is a struct with a `Status` member. Success carries
// the payload in `Value`; failure carries `ErrorDescription`, a list whose
// head is the error code.

use crate::error::Fault;
use crate::wire::WireValue;

pub const STATUS: &str = "Status";
pub const VALUE: &str = "Value";
pub const ERROR_DESCRIPTION: &str = "ErrorDescription";
pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_FAILURE: &str = "Failure";

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(WireValue),
    Failure(Vec<String>),
}

impl Envelope {
    pub fn success(value: WireValue) -> Self {
        Envelope::Success(value)
    }

    pub fn failure<I, S>(description: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Envelope::Failure(description.into_iter().map(Into::into).collect())
    }

    pub fn from_wire(wire: WireValue) -> Result<Self, Fault> {
        let mut members = match wire {
            WireValue::Struct(members) => members,
            other => return Err(Fault::type_mismatch("response envelope", other.type_name())),
        };

        let status = members.get(STATUS).and_then(WireValue::as_str).map(str::to_owned);
        match status.as_deref() {
            Some(STATUS_SUCCESS) => {
                // Void methods may leave the value out entirely.
                let value = members
                    .shift_remove(VALUE)
                    .unwrap_or_else(|| WireValue::String(String::new()));
                Ok(Envelope::Success(value))
            }
            Some(STATUS_FAILURE) => {
                let description = match members.shift_remove(ERROR_DESCRIPTION) {
                    Some(WireValue::Array(items)) => items.iter().map(description_text).collect(),
                    Some(other) => vec![description_text(&other)],
                    None => Vec::new(),
                };
                Ok(Envelope::Failure(description))
            }
            Some(other) => Err(Fault::type_mismatch("response envelope", format!("status '{}'", other))),
            None => Err(Fault::type_mismatch("response envelope", "struct without Status")),
        }
    }

    pub fn to_wire(&self) -> WireValue {
        match self {
            Envelope::Success(value) => {
                WireValue::structure([(STATUS, WireValue::from(STATUS_SUCCESS)), (VALUE, value.clone())])
            }
            Envelope::Failure(description) => WireValue::structure([
                (STATUS, WireValue::from(STATUS_FAILURE)),
                (
                    ERROR_DESCRIPTION,
                    WireValue::Array(description.iter().map(|s| WireValue::from(s.as_str())).collect()),
                ),
            ]),
        }
    }

    pub fn into_result(self) -> Result<WireValue, Fault> {
        match self {
            Envelope::Success(value) => Ok(value),
            Envelope::Failure(description) => Err(Fault::from_error_description(description)),
        }
    }
}

fn description_text(item: &WireValue) -> String {
    match item {
        WireValue::String(s) | WireValue::DateTime(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}
