// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{ContactId, ReplaceError};

/// A contact record. Everything beyond the id is an opaque attribute carried
/// through unchanged (name, timezone, ...); the core never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Contact {
    #[must_use]
    pub fn new(id: ContactId) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(id: ContactId, attributes: BTreeMap<String, Value>) -> Self {
        Self { id, attributes }
    }

    /// Uniform-apply `replace` target. The id is immutable; every other
    /// field writes into the attribute bag.
    pub fn apply_replace(&mut self, field: &str, value: &Value) -> Result<(), ReplaceError> {
        if field == "id" {
            return Err(ReplaceError::ImmutableId);
        }
        self.attributes.insert(field.to_string(), value.clone());
        Ok(())
    }
}
