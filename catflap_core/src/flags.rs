//! Transfer flags attached to sync entries.

use crate::entry::{SyncEntry, TransferMode};
use std::fmt;

/// Transfer options requested for an object.
///
/// Decoded once from the compact token form (`i`, `r`, `P`, `f`) used on the
/// command line and in scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncFlags {
    /// `i`: leave files that already exist at the destination alone.
    pub ignore_existing: bool,
    /// `r`: replace the destination object instead of merging into it.
    pub replace: bool,
    /// `P`: delete destination files that are not in the source.
    pub purge: bool,
    /// `f`: let the transfer look for similar files as delta bases.
    pub fuzzy: bool,
}

impl SyncFlags {
    /// Decode a token string. Unknown characters are ignored.
    pub fn parse(tokens: &str) -> Self {
        let mut flags = Self::default();
        for c in tokens.chars() {
            match c {
                'i' => flags.ignore_existing = true,
                'r' => flags.replace = true,
                'P' => flags.purge = true,
                'f' => flags.fuzzy = true,
                other => tracing::debug!(token = %other, "ignoring unknown sync flag"),
            }
        }
        flags
    }

    /// Rewrite the flag fields of an entry.
    ///
    /// Every flag field is cleared first and set again only if requested, so
    /// flags dropped since the last revision do not linger.
    pub fn apply(&self, entry: &mut SyncEntry) {
        entry.ignore_existing = self.ignore_existing.then_some(true);
        entry.mode = self.replace.then_some(TransferMode::Replace);
        entry.purge = self.purge.then_some(true);
        entry.fuzzy = self.fuzzy.then_some(true);
    }

    /// Read the flags currently recorded on an entry.
    pub fn from_entry(entry: &SyncEntry) -> Self {
        Self {
            ignore_existing: entry.ignore_existing.unwrap_or(false),
            replace: entry.mode == Some(TransferMode::Replace),
            purge: entry.purge.unwrap_or(false),
            fuzzy: entry.fuzzy.unwrap_or(false),
        }
    }
}

impl fmt::Display for SyncFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = [
            (self.ignore_existing, 'i'),
            (self.replace, 'r'),
            (self.purge, 'P'),
            (self.fuzzy, 'f'),
        ];
        for (set, token) in tokens {
            if set {
                write!(f, "{}", token)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_tokens() {
        let flags = SyncFlags::parse("iP");
        assert!(flags.ignore_existing);
        assert!(flags.purge);
        assert!(!flags.replace);
        assert!(!flags.fuzzy);

        assert_eq!(SyncFlags::parse(""), SyncFlags::default());
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        // Lowercase p and uppercase R, I, F are not flags
        assert_eq!(SyncFlags::parse("pRIF"), SyncFlags::default());
    }

    #[test]
    fn test_apply_sets_requested_flags() {
        let mut entry = SyncEntry::new("obj");
        SyncFlags::parse("irPf").apply(&mut entry);

        assert_eq!(entry.ignore_existing, Some(true));
        assert_eq!(entry.mode, Some(TransferMode::Replace));
        assert_eq!(entry.purge, Some(true));
        assert_eq!(entry.fuzzy, Some(true));
    }

    #[test]
    fn test_apply_clears_unrequested_flags() {
        let mut entry = SyncEntry::new("obj");
        entry.purge = Some(true);
        entry.mode = Some(TransferMode::Replace);
        entry.ignore_existing = Some(false);

        SyncFlags::parse("f").apply(&mut entry);

        assert_eq!(entry.purge, None);
        assert_eq!(entry.mode, None);
        assert_eq!(entry.ignore_existing, None);
        assert_eq!(entry.fuzzy, Some(true));
    }

    #[test]
    fn test_display() {
        assert_eq!(SyncFlags::parse("fPri").to_string(), "irPf");
        assert_eq!(SyncFlags::default().to_string(), "");
    }

    proptest! {
        /// Applying flags then reading them back is lossless, whatever the entry held before.
        #[test]
        fn prop_apply_from_entry(tokens in "[irPfxyz]{0,8}", prior in "[irPf]{0,4}") {
            let mut entry = SyncEntry::new("obj");
            SyncFlags::parse(&prior).apply(&mut entry);

            let flags = SyncFlags::parse(&tokens);
            flags.apply(&mut entry);
            prop_assert_eq!(SyncFlags::from_entry(&entry), flags);
        }
    }
}
