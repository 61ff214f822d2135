//! Resource tag constants for cloudseed
//!
//! Principals created by cloudseed are tagged at creation time so they can be
//! found later. Tags are never rewritten after the create call.
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `cloudseed:tool` | Static identifier ("cloudseed") |
//! | `cloudseed:created-at` | RFC 3339 creation timestamp |

/// Tag key for tool identification
pub const TAG_TOOL: &str = "cloudseed:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "cloudseed";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "cloudseed:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}
