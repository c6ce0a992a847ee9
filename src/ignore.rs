use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Paths skipped by `proggraph batch`: gitignore rules of the source root,
/// virtualenvs and build output, plus configured excludes.
pub struct IgnoreFilter {
    inner: Gitignore,
}

const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/",
    "target/",
    "build/",
    "out/",
    "dist/",
    "venv/",
    ".venv/",
    "env/",
    "__pycache__/",
    ".tox/",
    ".mypy_cache/",
    "site-packages/",
    "*.egg-info/",
    ".gradle/",
    ".idea/",
    ".vscode/",
];

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        let patterns = DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(extra_excludes.iter().map(String::as_str));
        for pattern in patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("invalid exclude pattern {:?}: {}", pattern, e);
            }
        }

        let inner = builder.build().unwrap_or_else(|e| {
            tracing::warn!("falling back to an empty ignore list: {}", e);
            Gitignore::empty()
        });
        Self { inner }
    }

    /// Whether `path` or one of its parent directories is excluded
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched_path_or_any_parents(path, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let filter = IgnoreFilter::new(dir.path(), &[]);
        assert!(filter.is_ignored(&dir.path().join("venv/lib/site.py"), false));
        assert!(filter.is_ignored(&dir.path().join("pkg/__pycache__"), true));
        assert!(!filter.is_ignored(&dir.path().join("pkg/mod.py"), false));
    }

    #[test]
    fn test_gitignore_and_extra_excludes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
        let filter = IgnoreFilter::new(dir.path(), &["*_test.java".to_string()]);
        assert!(filter.is_ignored(&dir.path().join("generated/Stub.java"), false));
        assert!(filter.is_ignored(&dir.path().join("src/FooTest_test.java"), false));
        assert!(!filter.is_ignored(&dir.path().join("src/Foo.java"), false));
    }
}
