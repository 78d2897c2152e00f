//! Action payloads: the unit of work routed through a dispatch cycle.

use crate::error::PayloadError;
use serde_json::Value;

/// One action occurrence: a namespace, an action name, and the caller's
/// arguments in order.
///
/// A payload is immutable once constructed and is the sole value routed
/// through a dispatch cycle. Construction rejects empty namespaces and names
/// (see [`PayloadError`]); every payload a callback observes is therefore
/// well formed.
#[derive(Debug, Clone)]
pub struct ActionPayload {
    namespace: String,
    name: String,
    args: Vec<Value>,
}

impl ActionPayload {
    /// Build a payload, validating the namespace and name.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<Self, PayloadError> {
        let namespace = namespace.into();
        let name = name.into();
        if namespace.is_empty() {
            return Err(PayloadError::EmptyNamespace);
        }
        if name.is_empty() {
            return Err(PayloadError::EmptyName);
        }
        Ok(Self {
            namespace,
            name,
            args,
        })
    }

    /// The namespace this action belongs to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The action name within its namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The caller's arguments, in call order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

impl std::fmt::Display for ActionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}
