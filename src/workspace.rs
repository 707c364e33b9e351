//! Per-request temporary file slots
//!
//! Every request gets its own token and three paths derived from it. Files are
//! removed on `close`, and again on drop if `close` was never reached.

use std::path::{Path, PathBuf};

/// Isolated set of temporary artifacts for one request
#[derive(Debug)]
pub struct Workspace {
    token: String,
    pub input: PathBuf,
    pub segmented: PathBuf,
    pub output: PathBuf,
    closed: bool,
}

impl Workspace {
    /// Allocate a fresh session under `root`. No files are created.
    pub fn open(root: &Path) -> Self {
        let token = uuid::Uuid::new_v4().simple().to_string();
        Self {
            input: root.join(format!("{}-input", token)),
            segmented: root.join(format!("{}-segmented.png", token)),
            output: root.join(format!("{}-output.png", token)),
            token,
            closed: false,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn paths(&self) -> [&Path; 3] {
        [
            self.input.as_path(),
            self.segmented.as_path(),
            self.output.as_path(),
        ]
    }

    /// Remove whichever slot files exist. Safe to call repeatedly; only the
    /// first completed call does any work, and it never fails.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        for path in self.paths() {
            log_removal(path, tokio::fs::remove_file(path).await);
        }
        self.closed = true;
        tracing::debug!("Workspace {} closed", self.token);
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!("Removed {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {:?}: {}", path, e),
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::debug!("Workspace {} dropped without close, cleaning up", self.token);
        for path in self.paths() {
            log_removal(path, std::fs::remove_file(path));
        }
        self.closed = true;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fresh empty directory for a test
    pub(crate) fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cutout-api-test-{}-{}",
            label,
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub(crate) fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn sessions_never_share_paths() {
        let root = scratch_dir("ws-unique");
        let a = Workspace::open(&root);
        let b = Workspace::open(&root);
        assert_ne!(a.token(), b.token());
        for pa in a.paths() {
            assert!(pa.starts_with(&root));
            for pb in b.paths() {
                assert_ne!(pa, pb);
            }
        }
        let [input, segmented, output] = a.paths();
        assert_ne!(input, segmented);
        assert_ne!(segmented, output);
    }

    #[test]
    fn open_creates_nothing() {
        let root = scratch_dir("ws-open");
        let ws = Workspace::open(&root);
        for path in ws.paths() {
            assert!(!path.exists());
        }
        assert_eq!(file_count(&root), 0);
    }

    #[tokio::test]
    async fn close_removes_existing_files_and_tolerates_missing_ones() {
        let root = scratch_dir("ws-close");
        let mut ws = Workspace::open(&root);
        std::fs::write(&ws.input, b"in").unwrap();
        std::fs::write(&ws.output, b"out").unwrap();

        ws.close().await;
        assert_eq!(file_count(&root), 0);

        // second close is a no-op
        ws.close().await;
        assert_eq!(file_count(&root), 0);
    }

    #[tokio::test]
    async fn close_leaves_other_sessions_alone() {
        let root = scratch_dir("ws-isolated");
        let mut a = Workspace::open(&root);
        let b = Workspace::open(&root);
        std::fs::write(&a.input, b"a").unwrap();
        std::fs::write(&b.input, b"b").unwrap();

        a.close().await;
        assert!(!a.input.exists());
        assert_eq!(std::fs::read(&b.input).unwrap(), b"b");
    }

    #[test]
    fn drop_cleans_up_unclosed_workspace() {
        let root = scratch_dir("ws-drop");
        {
            let ws = Workspace::open(&root);
            std::fs::write(&ws.input, b"in").unwrap();
            std::fs::write(&ws.segmented, b"seg").unwrap();
        }
        assert_eq!(file_count(&root), 0);
    }

    #[tokio::test]
    async fn interrupted_close_is_finished_by_drop() {
        let root = scratch_dir("ws-interrupted");
        {
            let mut ws = Workspace::open(&root);
            std::fs::write(&ws.input, b"in").unwrap();
            std::fs::write(&ws.output, b"out").unwrap();
            // never driven to completion
            let close = ws.close();
            drop(close);
        }
        assert_eq!(file_count(&root), 0);
    }
}
