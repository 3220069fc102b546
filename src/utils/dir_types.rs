// This file contains the user directory record structs and related definitions.
#![forbid(unsafe_code)]

use poem_openapi::Object;
use serde_json::Value;

// ---------------------------------------------------------------------------
// User:
// ---------------------------------------------------------------------------
/// A stored directory record.  The id is assigned by the directory and never
/// changes.  Every other attribute is any JSON value the client sent, stored
/// as-is, and may be absent.
#[derive(Object, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    #[oai(skip_serializing_if_is_none)]
    pub name: Option<Value>,
    #[oai(skip_serializing_if_is_none)]
    pub email: Option<Value>,
    #[oai(skip_serializing_if_is_none)]
    pub phone: Option<Value>,
    #[oai(skip_serializing_if_is_none)]
    pub age: Option<Value>,
    #[oai(skip_serializing_if_is_none)]
    pub gender: Option<Value>,
    #[oai(skip_serializing_if_is_none)]
    pub address: Option<Value>,
}

// ---------------------------------------------------------------------------
// UserInput:
// ---------------------------------------------------------------------------
/// The client supplied portion of a record, used by both create and update.
/// Any id sent by the client is not part of this type and is dropped.
#[derive(Object, Debug, Clone, Default, PartialEq)]
pub struct UserInput {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub age: Option<Value>,
    pub gender: Option<Value>,
    pub address: Option<Value>,
}

// ---------------------------------------------------------------------------
// text:
// ---------------------------------------------------------------------------
/// The string content of an attribute.  Absent and non-string values have none.
pub fn text(field: &Option<Value>) -> Option<&str> {
    field.as_ref().and_then(Value::as_str)
}

impl User {
    /// Bind an input record to an id.  Nothing from a previous version of
    /// the record survives.
    pub fn from_input(id: String, input: UserInput) -> User {
        User {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            age: input.age,
            gender: input.gender,
            address: input.address,
        }
    }

    /// True if the lowercased query occurs in the name, email, phone or
    /// address.  Phone numbers are compared as-is; only string values match.
    pub fn matches(&self, query_lc: &str) -> bool {
        let contains_lc = |field: &Option<Value>| {
            text(field)
                 .map(|v| v.to_lowercase().contains(query_lc))
                 .unwrap_or(false)
        };

        contains_lc(&self.name)
            || contains_lc(&self.email)
            || text(&self.phone).map(|p| p.contains(query_lc)).unwrap_or(false)
            || contains_lc(&self.address)
    }
}

impl UserInput {
    pub fn new(
        name: &str,
        email: &str,
        phone: &str,
        age: i64,
        gender: &str,
        address: &str,
    )
    -> UserInput {
        UserInput {
            name: Some(Value::from(name)),
            email: Some(Value::from(email)),
            phone: Some(Value::from(phone)),
            age: Some(Value::from(age)),
            gender: Some(Value::from(gender)),
            address: Some(Value::from(address)),
        }
    }
}
