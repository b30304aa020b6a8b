use thiserror::Error;

/// Entities a chat operation can fail to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Listing,
    Room,
    Member,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Listing => write!(f, "listing"),
            Entity::Room => write!(f, "chat room"),
            Entity::Member => write!(f, "member"),
        }
    }
}

/// Chat domain errors
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Login required")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Only participants of this chat room can view it")]
    Forbidden,

    #[error("Not a participant of this chat room")]
    NotParticipant,

    #[error("Cannot open a chat room on your own listing")]
    SelfChat,

    #[error("Message content must not be empty")]
    EmptyMessage,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ChatError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::Unauthenticated => 401,
            ChatError::NotFound(_) | ChatError::NotParticipant => 404,
            ChatError::Forbidden => 403,
            ChatError::SelfChat | ChatError::EmptyMessage => 400,
            ChatError::Storage(_) => 500,
        }
    }

    /// `<status>-<n>` code carried in the response envelope
    pub fn result_code(&self) -> &'static str {
        match self {
            ChatError::Unauthenticated => "401-1",
            ChatError::NotFound(Entity::Listing) => "404-1",
            ChatError::NotFound(Entity::Member) => "404-3",
            ChatError::NotFound(Entity::Room) => "404-4",
            ChatError::NotParticipant => "404-5",
            ChatError::Forbidden => "403-1",
            ChatError::EmptyMessage => "400-1",
            ChatError::SelfChat => "400-2",
            ChatError::Storage(_) => "500-1",
        }
    }
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        ChatError::Storage(err.into())
    }
}
