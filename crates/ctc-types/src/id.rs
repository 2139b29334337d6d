use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Wall-clock timestamp carried by every record (RFC 3339 on the wire).
pub type Timestamp = DateTime<Utc>;

/// Generate a record id.
///
/// UUID v7: millisecond time prefix plus random bits, rendered as 32 hex
/// characters. Ids sort roughly by creation time. They are not secrets.
pub fn generate_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Apply a signed delta to an unsigned counter, clamping at zero.
pub fn apply_delta(value: u64, delta: i64) -> u64 {
    value.saturating_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_hex() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn delta_clamps_at_zero() {
        assert_eq!(apply_delta(0, -1), 0);
        assert_eq!(apply_delta(3, -1), 2);
        assert_eq!(apply_delta(3, 2), 5);
    }
}
