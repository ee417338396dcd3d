// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{ChannelType, MediumId, ReplaceError};

/// A notification delivery channel owned by exactly one contact once
/// linked. The known attributes are optional on purpose: an attribute the
/// source document omitted stays absent instead of defaulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    pub id: MediumId,
    #[serde(rename = "type")]
    pub channel: ChannelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollup_threshold: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Medium {
    #[must_use]
    pub fn new(id: MediumId, channel: ChannelType) -> Self {
        Self {
            id,
            channel,
            address: None,
            interval: None,
            rollup_threshold: None,
            extra: BTreeMap::new(),
        }
    }

    /// Uniform-apply `replace` target for patch operations. The typed
    /// fields coerce their value; anything unrecognized goes into the
    /// residual bag so dynamic attributes stay writable.
    pub fn apply_replace(&mut self, field: &str, value: &Value) -> Result<(), ReplaceError> {
        match field {
            "id" => Err(ReplaceError::ImmutableId),
            "type" => {
                let name = value.as_str().ok_or(ReplaceError::InvalidValue {
                    field: "type",
                    expected: "string",
                })?;
                self.channel = ChannelType::from_name(name);
                Ok(())
            }
            "address" => {
                let address = value.as_str().ok_or(ReplaceError::InvalidValue {
                    field: "address",
                    expected: "string",
                })?;
                self.address = Some(address.to_string());
                Ok(())
            }
            "interval" => {
                let interval = value.as_i64().ok_or(ReplaceError::InvalidValue {
                    field: "interval",
                    expected: "integer",
                })?;
                self.interval = Some(interval);
                Ok(())
            }
            "rollup_threshold" => {
                let threshold = value.as_i64().ok_or(ReplaceError::InvalidValue {
                    field: "rollup_threshold",
                    expected: "integer",
                })?;
                self.rollup_threshold = Some(threshold);
                Ok(())
            }
            other => {
                self.extra.insert(other.to_string(), value.clone());
                Ok(())
            }
        }
    }
}
