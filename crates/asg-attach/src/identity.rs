//! Local attachment identities
//!
//! The service has no attachment object, so the handle given back to callers
//! is synthesized here: `"{group}-"` followed by a UTC timestamp (to 1/10000 s)
//! and an 8-digit hex counter. It is never sent to AWS.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Opaque, locally unique handle for a created attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    /// Generate a fresh identity for an attachment on `group_name`
    pub fn generate(group_name: &str) -> Self {
        Self::generate_at(group_name, Utc::now())
    }

    fn generate_at(group_name: &str, now: DateTime<Utc>) -> Self {
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        let ten_thousandths = now.timestamp_subsec_nanos() / 100_000;
        Self(format!(
            "{}{}{:04}{:08x}",
            Self::prefix(group_name),
            now.format("%Y%m%d%H%M%S"),
            ten_thousandths,
            counter
        ))
    }

    /// Prefix every identity for `group_name` starts with
    pub fn prefix(group_name: &str) -> String {
        format!("{group_name}-")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AttachmentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prefixed_by_group_name() {
        let id = AttachmentId::generate("asg-1");
        assert!(id.as_str().starts_with("asg-1-"), "got {id}");
    }

    #[test]
    fn suffix_layout() {
        let now = Utc
            .with_ymd_and_hms(2024, 3, 5, 7, 9, 11)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(123_400))
            .unwrap();
        let id = AttachmentId::generate_at("asg-1", now);
        let suffix = id.as_str().strip_prefix("asg-1-").unwrap();

        assert_eq!(suffix.len(), 26);
        assert_eq!(&suffix[..18], "202403050709111234");
        assert!(suffix[18..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identities_are_unique_within_a_tick() {
        let now = Utc::now();
        let a = AttachmentId::generate_at("asg-1", now);
        let b = AttachmentId::generate_at("asg-1", now);
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AttachmentId::from("asg-1-abc".to_string());
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""asg-1-abc""#);
    }
}
