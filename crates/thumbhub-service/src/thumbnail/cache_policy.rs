//! Cache-validity decision for prepared thumbnail metadata.
//!
//! Whether stored bytes may be served depends on six booleans with several
//! asymmetric carve-outs. They are evaluated as an ordered rule table
//! (first match wins) over [`CacheFacts`].

/// Observations about one prepared thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheFacts {
    /// The rendering settings changed after the metadata was written, or
    /// there are no settings.
    pub dirty: bool,
    /// The thumbnail store holds bytes for the metadata.
    pub exists_on_disk: bool,
    /// The session may not write data for this pixel set.
    pub critical: bool,
    /// The metadata belongs to the session user.
    pub is_mine: bool,
    /// The session user is the user thumbnails are prepared for.
    pub session_is_target: bool,
    /// The metadata belongs to the user thumbnails are prepared for.
    pub target_is_owner: bool,
}

/// What to do with the stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheVerdict {
    /// Bytes are current; serve them.
    Fresh,
    /// Bytes are stale but the best the session may get; serve them.
    StaleAccepted,
    /// Bytes must be rendered again.
    Regenerate,
    /// The metadata promises bytes the session is not allowed to produce.
    Unwritable,
}

impl CacheVerdict {
    /// Whether stored bytes may be served.
    pub fn is_cached(self) -> bool {
        matches!(self, Self::Fresh | Self::StaleAccepted)
    }
}

type Rule = (fn(&CacheFacts) -> bool, CacheVerdict);

/// Ordered rules; the first matching rule decides.
const RULES: &[Rule] = &[
    (|f: &CacheFacts| !f.dirty && f.exists_on_disk, CacheVerdict::Fresh),
    (
        |f: &CacheFacts| !f.dirty && !f.exists_on_disk && f.critical,
        CacheVerdict::Unwritable,
    ),
    // Owners never get another user's stale bytes for their own thumbnail.
    (
        |f: &CacheFacts| {
            f.dirty && f.exists_on_disk && !f.is_mine && f.session_is_target && !f.target_is_owner
        },
        CacheVerdict::Regenerate,
    ),
    (
        |f: &CacheFacts| f.dirty && f.exists_on_disk && !f.is_mine,
        CacheVerdict::StaleAccepted,
    ),
    (
        |f: &CacheFacts| f.dirty && f.exists_on_disk && f.critical && f.target_is_owner,
        CacheVerdict::Regenerate,
    ),
    (
        |f: &CacheFacts| f.dirty && f.exists_on_disk && f.critical,
        CacheVerdict::StaleAccepted,
    ),
];

/// Decide what to do with the bytes of a prepared thumbnail.
pub fn decide(facts: &CacheFacts) -> CacheVerdict {
    RULES
        .iter()
        .find(|(matches, _)| matches(facts))
        .map_or(CacheVerdict::Regenerate, |(_, verdict)| *verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> CacheFacts {
        CacheFacts {
            is_mine: true,
            session_is_target: true,
            target_is_owner: true,
            ..CacheFacts::default()
        }
    }

    #[test]
    fn test_clean_on_disk_is_fresh() {
        let f = CacheFacts {
            exists_on_disk: true,
            ..facts()
        };
        assert_eq!(decide(&f), CacheVerdict::Fresh);

        let f = CacheFacts {
            critical: true,
            is_mine: false,
            ..f
        };
        assert_eq!(decide(&f), CacheVerdict::Fresh);
    }

    #[test]
    fn test_clean_missing_bytes() {
        assert_eq!(decide(&facts()), CacheVerdict::Regenerate);

        let f = CacheFacts {
            critical: true,
            ..facts()
        };
        assert_eq!(decide(&f), CacheVerdict::Unwritable);
    }

    #[test]
    fn test_dirty_foreign_bytes_for_target_session() {
        // The session user views their own thumbnail but got someone else's
        // metadata: regenerate.
        let f = CacheFacts {
            dirty: true,
            exists_on_disk: true,
            is_mine: false,
            session_is_target: true,
            target_is_owner: false,
            critical: false,
        };
        assert_eq!(decide(&f), CacheVerdict::Regenerate);
    }

    #[test]
    fn test_dirty_foreign_bytes_otherwise_stale_accepted() {
        let f = CacheFacts {
            dirty: true,
            exists_on_disk: true,
            is_mine: false,
            session_is_target: false,
            target_is_owner: false,
            critical: false,
        };
        assert_eq!(decide(&f), CacheVerdict::StaleAccepted);

        let f = CacheFacts {
            session_is_target: true,
            target_is_owner: true,
            ..f
        };
        assert_eq!(decide(&f), CacheVerdict::StaleAccepted);
    }

    #[test]
    fn test_dirty_own_bytes_when_critical() {
        let f = CacheFacts {
            dirty: true,
            exists_on_disk: true,
            critical: true,
            ..facts()
        };
        assert_eq!(decide(&f), CacheVerdict::Regenerate);

        let f = CacheFacts {
            target_is_owner: false,
            session_is_target: false,
            ..f
        };
        assert_eq!(decide(&f), CacheVerdict::StaleAccepted);
    }

    #[test]
    fn test_dirty_own_bytes_is_regenerated() {
        let f = CacheFacts {
            dirty: true,
            exists_on_disk: true,
            ..facts()
        };
        assert_eq!(decide(&f), CacheVerdict::Regenerate);
        assert!(!decide(&f).is_cached());
    }

    #[test]
    fn test_dirty_without_bytes_is_regenerated() {
        let f = CacheFacts {
            dirty: true,
            critical: true,
            is_mine: false,
            ..facts()
        };
        assert_eq!(decide(&f), CacheVerdict::Regenerate);
    }
}
