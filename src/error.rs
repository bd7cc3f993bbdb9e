use thiserror::Error;

/// The error returned when a lookup requires a key that is not present.
///
/// Lookups that may legitimately miss, such as [`AvlMap::get`](crate::AvlMap::get), return
/// `Option` instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key not found")]
pub struct KeyError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(KeyError.to_string(), "key not found");
    }
}
