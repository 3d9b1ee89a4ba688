use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Title given to sessions created without an explicit name
pub const DEFAULT_SESSION_TITLE: &str = "New Chat Session";

/// Author of a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed by the user
    User,
    /// Returned by the backend (or an error rendered in its place)
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Bot => write!(f, "bot"),
        }
    }
}

/// A single line of a chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Who wrote it
    pub sender: Sender,
    /// Message text
    pub text: String,
}

impl ChatEntry {
    /// Creates a user entry
    ///
    /// # Examples
    ///
    /// ```
    /// use vapor::storage::{ChatEntry, Sender};
    ///
    /// let entry = ChatEntry::user("hi");
    /// assert_eq!(entry.sender, Sender::User);
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// Creates a bot entry
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

/// Persisted metadata for one session; the id is the key it is stored under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// User-visible title
    pub title: String,
    /// When the session was minted
    pub created_at: DateTime<Utc>,
    /// Last time the session was written to
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A record stamped with the current time
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A session as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// 32 hex characters
    pub id: String,
    /// User-visible title
    pub title: String,
    /// When the session was minted
    pub created_at: DateTime<Utc>,
    /// Last time the session was written to
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn from_record(id: &str, record: &SessionRecord) -> Self {
        Self {
            id: id.to_string(),
            title: record.title.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// The sessions belonging to one workspace
///
/// Once initialised, `current` always keys into `sessions` and `sessions`
/// is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSessionSet {
    /// Id of the active session
    pub current: String,
    /// All sessions by id
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionRecord>,
}

impl WorkspaceSessionSet {
    /// A set holding a single session, which is also current
    pub fn with_session(id: String, record: SessionRecord) -> Self {
        let mut sessions = BTreeMap::new();
        sessions.insert(id.clone(), record);
        Self {
            current: id,
            sessions,
        }
    }

    /// The active session id
    pub fn current_session_id(&self) -> &str {
        &self.current
    }

    /// The id of the most recently updated session, if any
    pub fn most_recent(&self) -> Option<&str> {
        self.sessions
            .iter()
            .max_by_key(|(_, record)| record.updated_at)
            .map(|(id, _)| id.as_str())
    }

    /// Sessions ordered by `updated_at`, newest first
    pub fn sorted(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .map(|(id, record)| Session::from_record(id, record))
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }
}

/// Row shown in a session picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// The session
    #[serde(flatten)]
    pub session: Session,
    /// Whether it is the workspace's active session
    pub is_current: bool,
}
