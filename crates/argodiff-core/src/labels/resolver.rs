//! Decide which applications a changeset touches

use crate::labels::extractor::read_tracking_label;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Whether any changed file carries `tracking_key: app_name`
///
/// Paths are read as given. Stops at the first matching file; unreadable or
/// unparseable files never match.
pub fn is_affected<P: AsRef<Path>>(changed_files: &[P], app_name: &str, tracking_key: &str) -> bool {
    changed_files.iter().any(|file| {
        read_tracking_label(file.as_ref(), tracking_key).as_deref() == Some(app_name)
    })
}

/// Per-run memo of the tracking label found in each changed file
///
/// Every file is read at most once no matter how many applications are checked.
#[derive(Debug)]
pub struct LabelIndex {
    root: PathBuf,
    tracking_key: String,
    labels: HashMap<String, Option<String>>,
}

impl LabelIndex {
    /// Create an empty index resolving paths against `root`
    pub fn new(root: impl Into<PathBuf>, tracking_key: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            tracking_key: tracking_key.into(),
            labels: HashMap::new(),
        }
    }

    /// Tracking label of a changed file, reading it on first access
    pub fn label_for(&mut self, file: &str) -> Option<&str> {
        let root = &self.root;
        let key = &self.tracking_key;
        self.labels
            .entry(file.to_string())
            .or_insert_with(|| read_tracking_label(&root.join(file), key))
            .as_deref()
    }

    /// Whether any changed file belongs to `app_name`
    pub fn is_affected(&mut self, changed_files: &[String], app_name: &str) -> bool {
        info!("Checking if changed files are part of app: {}", app_name);
        let affected = changed_files.iter().any(|file| {
            let matched = self.label_for(file) == Some(app_name);
            if matched {
                debug!("{} belongs to {}", file, app_name);
            }
            matched
        });
        info!("App {} affected: {}", app_name, affected);
        affected
    }

    /// Number of files read so far
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no file has been read yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const KEY: &str = "argocd.argoproj.io/instance";

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn manifest(app: &str) -> String {
        format!("metadata:\n  labels:\n    {}: {}\n", KEY, app)
    }

    #[test]
    fn test_empty_changeset_is_not_affected() {
        let files: Vec<PathBuf> = Vec::new();
        assert!(!is_affected(&files, "web", KEY));

        let mut index = LabelIndex::new(".", KEY);
        assert!(!index.is_affected(&[], "web"));
    }

    #[test]
    fn test_free_function_matches_any_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", &manifest("api"));
        write(dir.path(), "b.yaml", &manifest("web"));

        let files = vec![dir.path().join("a.yaml"), dir.path().join("b.yaml")];
        assert!(is_affected(&files, "web", KEY));
        assert!(is_affected(&files, "api", KEY));
        assert!(!is_affected(&files, "worker", KEY));
    }

    #[test]
    fn test_bad_files_do_not_abort_evaluation() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.yaml", "metadata: [labels: {");
        write(dir.path(), "apps/web/deploy.yaml", &manifest("web"));

        let mut index = LabelIndex::new(dir.path(), KEY);
        let files = vec![
            "deleted.yaml".to_string(),
            "broken.yaml".to_string(),
            "README.md".to_string(),
            "apps/web/deploy.yaml".to_string(),
        ];
        assert!(index.is_affected(&files, "web"));
    }

    #[test]
    fn test_label_index_reads_each_file_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "web.yaml", &manifest("web"));
        write(dir.path(), "api.yaml", &manifest("api"));

        let files = vec!["web.yaml".to_string(), "api.yaml".to_string()];
        let mut index = LabelIndex::new(dir.path(), KEY);

        assert!(index.is_affected(&files, "api"));
        assert_eq!(index.len(), 2);

        // Content changes after the first read are not observed
        write(dir.path(), "web.yaml", &manifest("other"));
        assert!(index.is_affected(&files, "web"));
        assert_eq!(index.len(), 2);
        assert_eq!(index.label_for("web.yaml"), Some("web"));
    }

    #[test]
    fn test_short_circuits_on_first_match() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "web.yaml", &manifest("web"));
        write(dir.path(), "api.yaml", &manifest("api"));

        let files = vec!["web.yaml".to_string(), "api.yaml".to_string()];
        let mut index = LabelIndex::new(dir.path(), KEY);
        assert!(index.is_affected(&files, "web"));
        assert_eq!(index.len(), 1);
    }
}
