use crate::errors::CoreError;

/// Durable string-keyed storage the preference store persists into.
///
/// Mirrors the browser `localStorage` contract: synchronous, values are
/// plain strings, and the data survives a restart of the application.
/// Implementations report failures through `CoreError`; callers that must
/// never fail (the preference store) log and carry on.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`, `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), CoreError>;
}
