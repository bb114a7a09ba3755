// ABOUTME: Shared utility functions for Vitrine
// ABOUTME: ID generation and text helpers

/// Generate a unique message ID
pub fn generate_message_id() -> String {
    nanoid::nanoid!(12)
}

/// Truncate a string to at most `max_chars` characters, respecting char boundaries
pub fn truncate(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
