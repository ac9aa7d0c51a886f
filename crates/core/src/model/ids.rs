use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name).to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Unique identifier for a Question
    QuestionId
);
define_id!(
    /// Identifier for a subject (e.g. mathematics, physics)
    SubjectId
);
define_id!(
    /// Identifier for a topic within a subject
    TopicId
);
define_id!(
    /// Identifier for a sub-topic within a topic
    SubTopicId
);
define_id!(
    /// Backend-issued identifier bracketing one practice run
    TestSessionId
);

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_id_display() {
        let id = QuestionId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "QuestionId(42)");
    }

    #[test]
    fn subject_id_from_str_trims() {
        let id: SubjectId = " 3 ".parse().unwrap();
        assert_eq!(id, SubjectId::new(3));
    }

    #[test]
    fn topic_id_from_str_invalid() {
        let err = "not-a-number".parse::<TopicId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse TopicId from string");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&TestSessionId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: TestSessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(), 7);
    }
}
