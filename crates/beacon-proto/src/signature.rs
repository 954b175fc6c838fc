//! Per-method argument signatures.
//!
//! Every handler declares the shape of its argument list up front; dispatch
//! validates incoming arguments against the declaration before the handler
//! runs, so a malformed invocation fails with `ARGUMENT_MISMATCH` instead of
//! somewhere inside handler logic.

use serde_json::Value;

use crate::errors::HubError;

/// Accepted kind for one positional argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    /// JSON string.
    String,
    /// JSON number (integer or float).
    Number,
    /// JSON boolean.
    Bool,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// Any value, including `null`.
    Any,
}

impl ArgKind {
    /// Whether `value` is of this kind. `null` only matches [`ArgKind::Any`].
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    /// Kind name used in mismatch messages.
    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

/// Kind name of a received value, for mismatch messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declared argument-list shape for one method.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    kinds: Vec<ArgKind>,
}

impl Signature {
    /// Declare a signature from an ordered list of kinds.
    pub fn new(kinds: impl Into<Vec<ArgKind>>) -> Self {
        Self {
            kinds: kinds.into(),
        }
    }

    /// Declare a zero-argument signature.
    pub fn empty() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Number of declared arguments.
    pub fn arity(&self) -> usize {
        self.kinds.len()
    }

    /// Validate an argument list against this signature.
    pub fn check(&self, args: &[Value]) -> Result<(), HubError> {
        if args.len() != self.kinds.len() {
            return Err(HubError::ArgumentMismatch {
                message: format!(
                    "expected {} argument(s), got {}",
                    self.kinds.len(),
                    args.len()
                ),
            });
        }
        for (index, (kind, arg)) in self.kinds.iter().zip(args).enumerate() {
            if !kind.matches(arg) {
                return Err(HubError::ArgumentMismatch {
                    message: format!(
                        "argument {index}: expected {}, got {}",
                        kind.name(),
                        kind_of(arg)
                    ),
                });
            }
        }
        Ok(())
    }
}
