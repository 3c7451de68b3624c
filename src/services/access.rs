//! Ownership checks
//!
//! Every mutation of an owned resource (articles, comments) goes through
//! [`ensure_owner`]. Only the owner may change or delete what they wrote;
//! there is no moderator override.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("user {subject_id} does not own this resource (owner {owner_id})")]
pub struct NotOwner {
    pub subject_id: i64,
    pub owner_id: i64,
}

/// Succeeds only when the requesting subject is the resource's owner
pub fn ensure_owner(subject_id: i64, owner_id: i64) -> Result<(), NotOwner> {
    if subject_id == owner_id {
        Ok(())
    } else {
        Err(NotOwner {
            subject_id,
            owner_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_owner_allowed() {
        assert!(ensure_owner(7, 7).is_ok());
    }

    #[test]
    fn test_stranger_rejected() {
        assert_eq!(
            ensure_owner(1, 2),
            Err(NotOwner {
                subject_id: 1,
                owner_id: 2
            })
        );
    }

    proptest! {
        #[test]
        fn allowed_iff_ids_match(subject in any::<i64>(), owner in any::<i64>()) {
            prop_assert_eq!(ensure_owner(subject, owner).is_ok(), subject == owner);
        }
    }
}
