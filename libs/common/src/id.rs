use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = signal_common::id::prefixed_ulid("cn");
/// assert!(id.starts_with("cn_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Returns true if `id` looks like something `prefixed_ulid(prefix)` produced.
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|ulid| Ulid::from_string(ulid).is_ok())
}

/// Marker trait for types that represent a prefixed ID.
pub trait PrefixedId: Sized {
    const PREFIX: &'static str;

    fn from_raw(raw: String) -> Self;

    fn generate() -> Self {
        Self::from_raw(prefixed_ulid(Self::PREFIX))
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const CONNECTION: &str = "cn";
    pub const ROOM: &str = "room";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_ulid_format() {
        let id = prefixed_ulid("cn");
        assert!(id.starts_with("cn_"));
        // ULID is 26 chars, plus prefix + underscore
        assert_eq!(id.len(), 3 + 26);
    }

    #[test]
    fn test_uniqueness() {
        let a = prefixed_ulid("cn");
        let b = prefixed_ulid("cn");
        assert_ne!(a, b);
    }

    #[test]
    fn test_has_prefix() {
        let id = prefixed_ulid(prefix::ROOM);
        assert!(has_prefix(&id, prefix::ROOM));
        assert!(!has_prefix(&id, prefix::CONNECTION));
        assert!(!has_prefix("room_not-a-ulid", prefix::ROOM));
        assert!(!has_prefix("roomless", prefix::ROOM));
    }
}
