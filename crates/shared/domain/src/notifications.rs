use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// What happened to the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Follow,
    Like,
    Comment,
    Mention,
    Reply,
}

impl Verb {
    pub const ALL: [Self; 5] = [Self::Follow, Self::Like, Self::Comment, Self::Mention, Self::Reply];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Mention => "mention",
            Self::Reply => "reply",
        }
    }

    /// Human readable sentence shown to the recipient.
    #[must_use]
    pub fn message(self, actor: &str) -> String {
        match self {
            Self::Follow => format!("{actor} started following you"),
            Self::Like => format!("{actor} liked your post"),
            Self::Comment => format!("{actor} commented on your post"),
            Self::Mention => format!("{actor} mentioned you"),
            Self::Reply => format!("{actor} replied to your comment"),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known [`Verb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerb(pub String);

impl fmt::Display for UnknownVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown notification verb '{}'", self.0)
    }
}

impl std::error::Error for UnknownVerb {}

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|verb| verb.as_str() == s).ok_or_else(|| UnknownVerb(s.to_owned()))
    }
}

/// Kind of record a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Post,
    Comment,
}

impl TargetType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl FromStr for TargetType {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            other => Err(UnknownVerb(other.to_owned())),
        }
    }
}

bitflags! {
    /// The verbs a recipient wants to be notified about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct VerbSet: u32 {
        const FOLLOW = 1 << 0;
        const LIKE = 1 << 1;
        const COMMENT = 1 << 2;
        const MENTION = 1 << 3;
        const REPLY = 1 << 4;

        const ALL = Self::FOLLOW.bits()
            | Self::LIKE.bits()
            | Self::COMMENT.bits()
            | Self::MENTION.bits()
            | Self::REPLY.bits();
    }
}

impl From<Verb> for VerbSet {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Follow => Self::FOLLOW,
            Verb::Like => Self::LIKE,
            Verb::Comment => Self::COMMENT,
            Verb::Mention => Self::MENTION,
            Verb::Reply => Self::REPLY,
        }
    }
}

impl From<&str> for VerbSet {
    fn from(s: &str) -> Self {
        match s {
            "all" | "*" => Self::ALL,
            other => other.parse::<Verb>().map_or_else(|_| Self::empty(), Self::from),
        }
    }
}

impl VerbSet {
    /// Whether notifications for `verb` are enabled.
    #[must_use]
    pub fn allows(self, verb: Verb) -> bool {
        self.contains(Self::from(verb))
    }
}

impl Serialize for VerbSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for VerbSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
