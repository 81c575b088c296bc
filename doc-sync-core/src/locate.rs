use crate::config::Repository;
use crate::contract::Location;

/// Resolves repository-relative document paths to fetchable locations.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    raw_base_url: String,
}

impl SourceLocator {
    pub fn new(raw_base_url: impl Into<String>) -> Self {
        Self {
            raw_base_url: raw_base_url.into(),
        }
    }

    /// Co-located repositories resolve to a path on disk, everything else to
    /// `{raw_base}/{org}/{repo}/{branch}/{path}`.
    pub fn locate(&self, repo: &Repository, source_path: &str) -> Location {
        let relative = source_path.trim_start_matches("./").trim_start_matches('/');
        match &repo.local_path {
            Some(root) => Location::Local(root.join(relative)),
            None => Location::Remote(format!(
                "{}/{}/{}/{}",
                self.raw_base_url.trim_end_matches('/'),
                repo.slug.trim_matches('/'),
                repo.branch,
                relative
            )),
        }
    }
}
