//! Identifier aliases and sentinel values.

/// Forum message identifier.
pub type MessageId = u32;

/// Registered user identifier.
pub type UserId = u32;

/// Attachment file identifier.
pub type FileId = u32;

/// Id of a message that is not (yet) known to the server.
pub const UNKNOWN_MESSAGE_ID: MessageId = 0;

/// Id of the invisible root message every section hangs off.
pub const ROOT_MESSAGE_ID: MessageId = 1;

/// Id of an unknown user, e.g. a request without a session.
pub const UNKNOWN_USER_ID: UserId = 0;

/// Id standing in for the anonymous guest account.
pub const GUEST_USER_ID: UserId = u32::MAX;

/// True if the id belongs to a real registered user, i.e. is neither of
/// the sentinel ids. Vote state is only tracked for registered users.
pub fn is_registered_user(id: UserId) -> bool {
    id != UNKNOWN_USER_ID && id != GUEST_USER_ID
}
