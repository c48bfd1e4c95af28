//! ID generation utilities.

use uuid::Uuid;

/// Generate a new UUID v4.
pub fn uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generate an invocation ID for one conversational turn.
pub fn invocation_id() -> String {
    format!("e-{}", Uuid::new_v4())
}

/// Generate an ID for a model function call that arrived without one.
pub fn function_call_id() -> String {
    format!("call-{}", Uuid::new_v4().simple())
}
