//! Conversion between text and UID vectors.
//!
//! Each character is the UID with the same numeric value, so a string stored
//! in a space is simply a content vector in the character plane.

use crate::error::{Result, SpaceError};
use crate::id::Uid;

/// Encode text as one UID per character.
pub fn string_to_uid_vector(text: &str) -> Vec<Uid> {
    text.chars().map(Uid::from).collect()
}

/// Decode a UID vector back into text.
///
/// Fails on the first UID that is not a Unicode scalar value.
pub fn uid_vector_to_string(uids: &[Uid]) -> Result<String> {
    uids.iter()
        .map(|&uid| uid.as_char().ok_or(SpaceError::Encoding(uid)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NIL;

    #[test]
    fn test_roundtrip() {
        let text = "naïve 漢字 🦀";
        let uids = string_to_uid_vector(text);
        assert_eq!(uids.len(), text.chars().count());
        assert_eq!(uid_vector_to_string(&uids).unwrap(), text);
    }

    #[test]
    fn test_empty() {
        assert!(string_to_uid_vector("").is_empty());
        assert_eq!(uid_vector_to_string(&[]).unwrap(), "");
    }

    #[test]
    fn test_rejects_non_characters() {
        let err = uid_vector_to_string(&[Uid::from('a'), NIL]).unwrap_err();
        assert!(matches!(err, SpaceError::Encoding(uid) if uid == NIL));

        let surrogate = Uid::new(0xDC00);
        assert!(matches!(
            uid_vector_to_string(&[surrogate]),
            Err(SpaceError::Encoding(_))
        ));
    }
}
