// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Typed records for the signalpost data model: contacts and the
//! notification media they own. Attribute maps are loosely typed at the
//! wire boundary; the known fields are explicit and everything else rides
//! in a residual attribute bag.

mod channel;
mod contact;
mod ids;
mod medium;

use std::fmt::{Display, Formatter};

pub const CRATE_NAME: &str = "signalpost-model";

pub use channel::ChannelType;
pub use contact::Contact;
pub use ids::{ContactId, MediumId, ParseError, ID_MAX_LEN};
pub use medium::Medium;

/// Failure applying a `replace` patch operation to a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReplaceError {
    UnknownField(String),
    ImmutableId,
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },
}

impl Display for ReplaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(name) => write!(f, "no such field: {name}"),
            Self::ImmutableId => f.write_str("id cannot be replaced"),
            Self::InvalidValue { field, expected } => {
                write!(f, "{field} expects a {expected} value")
            }
        }
    }
}

impl std::error::Error for ReplaceError {}
