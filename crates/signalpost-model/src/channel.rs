// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Delivery channel discriminator. Unknown channel names pass through
/// unchanged rather than failing decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ChannelType {
    Email,
    Sms,
    Jabber,
    Pagerduty,
    Sns,
    Other(String),
}

impl ChannelType {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "email" => Self::Email,
            "sms" => Self::Sms,
            "jabber" => Self::Jabber,
            "pagerduty" => Self::Pagerduty,
            "sns" => Self::Sns,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Jabber => "jabber",
            Self::Pagerduty => "pagerduty",
            Self::Sns => "sns",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChannelType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_channels_round_trip_by_name() {
        for name in ["email", "sms", "jabber", "pagerduty", "sns"] {
            assert_eq!(ChannelType::from_name(name).as_str(), name);
        }
    }

    #[test]
    fn unknown_channel_passes_through() {
        let channel = ChannelType::from_name("carrier_pigeon");
        assert_eq!(channel, ChannelType::Other("carrier_pigeon".to_string()));
        assert_eq!(channel.as_str(), "carrier_pigeon");
    }

    #[test]
    fn serializes_as_bare_string() {
        let json = serde_json::to_string(&ChannelType::Sms).expect("serialize");
        assert_eq!(json, "\"sms\"");
        let back: ChannelType = serde_json::from_str("\"email\"").expect("deserialize");
        assert_eq!(back, ChannelType::Email);
    }
}
