use std::fmt;

/// Errors from the store boundary (C: persisted messages/users/presence).
#[derive(Debug)]
pub enum StoreError {
    Deadline,
    Sqlite(rusqlite::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Deadline => write!(f, "store call exceeded its deadline"),
            StoreError::Sqlite(e) => write!(f, "sqlite error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

/// Errors from the event bus adapter (C5).
#[derive(Debug)]
pub enum BusError {
    Disconnected,
    Publish(String),
    Subscribe(String),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Disconnected => write!(f, "bus is disconnected from the broker"),
            BusError::Publish(msg) => write!(f, "publish error: {msg}"),
            BusError::Subscribe(msg) => write!(f, "subscribe error: {msg}"),
        }
    }
}

impl std::error::Error for BusError {}

/// Errors from an AI provider call (C9).
#[derive(Debug)]
pub enum ProviderError {
    Deadline,
    Transport(String),
    BadResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Deadline => write!(f, "provider call exceeded its deadline"),
            ProviderError::Transport(msg) => write!(f, "provider transport error: {msg}"),
            ProviderError::BadResponse(msg) => write!(f, "provider returned a bad response: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors terminal to one session (C1). Never propagate beyond the session's own tasks.
#[derive(Debug)]
pub enum SessionError {
    Closed,
    FrameTooLarge(usize),
    Decode(String),
    Io(String),
    Timeout,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Closed => write!(f, "connection closed"),
            SessionError::FrameTooLarge(n) => write!(f, "frame of {n} bytes exceeds the size limit"),
            SessionError::Decode(msg) => write!(f, "failed to decode frame: {msg}"),
            SessionError::Io(msg) => write!(f, "transport io error: {msg}"),
            SessionError::Timeout => write!(f, "read deadline exceeded"),
        }
    }
}

impl std::error::Error for SessionError {}
