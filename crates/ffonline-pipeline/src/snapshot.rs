//! Engine filesystem snapshots.
//!
//! A snapshot is the set of names one listing call returns. Produced files are
//! `post \ pre`; names that were already present never count, even when the
//! engine rewrote them.

use std::collections::BTreeSet;

use ffonline_core::MediaEngine;

use crate::error::{PipelineError, PipelineResult};

/// Set of file names present in the engine filesystem at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    names: BTreeSet<String>,
}

impl Snapshot {
    /// List `path` and record every entry except the `.` and `..` pseudo-entries.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Snapshot`] if the engine cannot list the path.
    pub async fn capture(engine: &dyn MediaEngine, path: &str) -> PipelineResult<Self> {
        let listing = engine
            .list_directory(path)
            .await
            .map_err(|source| PipelineError::Snapshot {
                path: path.to_string(),
                source,
            })?;
        Ok(Self::from_names(listing))
    }

    /// Build a snapshot from names.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| name != "." && name != "..")
                .collect(),
        }
    }

    /// Names present in `post` but absent from `pre`.
    #[must_use]
    pub fn diff(pre: &Self, post: &Self) -> BTreeSet<String> {
        post.names.difference(&pre.names).cloned().collect()
    }

    /// Whether `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffonline_test_support::MemoryEngine;

    type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

    #[test]
    fn diff_is_post_minus_pre() {
        let pre = Snapshot::from_names(["input.mp4", "old.gif"]);
        let post = Snapshot::from_names(["input.mp4", "old.gif", "new.gif", "."]);
        let produced = Snapshot::diff(&pre, &post);
        assert_eq!(produced.into_iter().collect::<Vec<_>>(), vec!["new.gif"]);
    }

    #[test]
    fn unchanged_listing_produces_nothing() {
        let pre = Snapshot::from_names(["a", "b"]);
        assert!(Snapshot::diff(&pre, &pre.clone()).is_empty());
    }

    #[test]
    fn deletions_are_not_reconciled() {
        let pre = Snapshot::from_names(["a", "b"]);
        let post = Snapshot::from_names(["b", "c"]);
        let produced = Snapshot::diff(&pre, &post);
        assert_eq!(produced.into_iter().collect::<Vec<_>>(), vec!["c"]);
    }

    #[tokio::test]
    async fn capture_skips_pseudo_entries() -> TestResult<()> {
        let engine = MemoryEngine::new().with_file("input.mp4", Vec::new());
        engine.load().await?;
        let snapshot = Snapshot::capture(&engine, ".").await?;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains("input.mp4"));
        assert!(!snapshot.contains("."));
        Ok(())
    }

    #[tokio::test]
    async fn capture_failure_names_the_path() -> TestResult<()> {
        let engine = MemoryEngine::new();
        engine.load().await?;
        let err = Snapshot::capture(&engine, "/missing").await;
        assert!(matches!(err, Err(PipelineError::Snapshot { path, .. }) if path == "/missing"));
        Ok(())
    }
}
