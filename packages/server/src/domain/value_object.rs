//! Value objects shared by the domain entities.
//!
//! Identifiers are opaque non-empty strings. Generated identifiers are UUID v4,
//! while user identifiers come from the verified token subject.

use std::{fmt, str::FromStr};

use rand::RngCore;
use serde::{Deserialize, Serialize, Serializer};
use tablesync_shared::time::timestamp_to_rfc3339;

use super::error::ValueObjectError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, rejecting blank values.
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValueObjectError::EmptyIdentifier(stringify!($name)));
                }
                if trimmed.len() == value.len() {
                    Ok(Self(value))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_id!(
    /// Session identifier
    SessionId
);
define_id!(
    /// User identifier (token subject)
    UserId
);
define_id!(ParticipantId);
define_id!(TabId);
define_id!(LogId);
define_id!(PlaceId);
define_id!(PatternId);
define_id!(SceneId);
define_id!(StepId);
define_id!(BoardId);
define_id!(TokenId);

/// Identifier of a live realtime connection. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in milliseconds, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&timestamp_to_rfc3339(self.0))
    }
}

/// Participant role within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Participant => "participant",
        }
    }
}

impl FromStr for Role {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "owner" => Ok(Role::Owner),
            "participant" => Ok(Role::Participant),
            other => Err(ValueObjectError::UnknownRole(other.to_string())),
        }
    }
}

/// Who may discover a session without being a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionVisibility {
    #[default]
    Private,
    Link,
    Public,
}

impl SessionVisibility {
    /// Unknown or missing values fall back to `Private`.
    pub fn normalize(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("link") => SessionVisibility::Link,
            Some("public") => SessionVisibility::Public,
            _ => SessionVisibility::Private,
        }
    }

    /// Non-members may read session metadata.
    pub fn is_discoverable(&self) -> bool {
        matches!(self, SessionVisibility::Link | SessionVisibility::Public)
    }
}

/// Opaque secret granting join rights to a `link` session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinToken(String);

impl JoinToken {
    /// 16 random bytes, hex encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, candidate: &str) -> bool {
        !candidate.is_empty() && self.0 == candidate
    }
}

/// Kind of a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Chat,
    Dice,
    Redacted,
}

impl MessageKind {
    /// Clients may only post `chat` or `dice`; anything else is `chat`.
    pub fn from_request(value: Option<&str>) -> Self {
        match value {
            Some("dice") => MessageKind::Dice,
            _ => MessageKind::Chat,
        }
    }
}

/// Who is speaking in a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerType {
    #[default]
    Account,
    Character,
    Custom,
    Kp,
}

impl SpeakerType {
    pub fn normalize(value: Option<&str>) -> Self {
        match value {
            Some("character") => SpeakerType::Character,
            Some("custom") => SpeakerType::Custom,
            Some("kp") => SpeakerType::Kp,
            _ => SpeakerType::Account,
        }
    }
}

/// Non-empty display name (sessions, tabs, places, patterns, scenes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyName);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Name {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
