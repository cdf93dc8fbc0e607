//! Config-driven workspace catalog.
//!
//! Workspace ids must stay stable across restarts so mobile bookmarks keep
//! working; they are derived from the workspace path, not assigned at
//! startup.

use std::path::Path;

use sha2::{Digest, Sha256};

use tether_config::WorkspaceEntry;
use tether_relay::{Workspace, WorkspaceCatalog};

/// Catalog built from the `[[workspace]]` entries in config.toml.
pub struct ConfigCatalog {
    workspaces: Vec<Workspace>,
}

impl ConfigCatalog {
    pub fn new(entries: &[WorkspaceEntry]) -> Self {
        let workspaces = entries
            .iter()
            .map(|entry| Workspace {
                id: workspace_id(&entry.path),
                name: entry.name.clone(),
                path: entry.path.clone(),
                branch: read_git_branch(&entry.path),
                is_worktree: entry.path.join(".git").is_file(),
                sessions: 0,
            })
            .collect();
        Self { workspaces }
    }
}

impl WorkspaceCatalog for ConfigCatalog {
    fn list(&self) -> Vec<Workspace> {
        self.workspaces.clone()
    }
}

/// Stable id for a workspace: `ws-` plus the first 8 hex chars of the
/// path's SHA-256.
fn workspace_id(path: &Path) -> String {
    let digest = Sha256::digest(path.display().to_string().as_bytes());
    let hex: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("ws-{hex}")
}

/// Current git branch, read from `.git/HEAD`. `None` outside a repository
/// or on a detached HEAD.
fn read_git_branch(path: &Path) -> Option<String> {
    let git = path.join(".git");
    let head_path = if git.is_file() {
        // Linked worktree: `.git` is a file pointing at the real git dir.
        let content = std::fs::read_to_string(&git).ok()?;
        let gitdir = content.strip_prefix("gitdir:")?.trim();
        Path::new(gitdir).join("HEAD")
    } else {
        git.join("HEAD")
    };

    let head = std::fs::read_to_string(head_path).ok()?;
    head.trim()
        .strip_prefix("ref: refs/heads/")
        .map(|branch| branch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(name: &str, path: &Path) -> WorkspaceEntry {
        WorkspaceEntry {
            name: name.into(),
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn workspace_ids_are_stable_and_distinct() {
        let a1 = workspace_id(Path::new("/srv/api"));
        let a2 = workspace_id(Path::new("/srv/api"));
        let b = workspace_id(Path::new("/srv/web"));
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(a1.starts_with("ws-"));
        assert_eq!(a1.len(), 11);
    }

    #[test]
    fn catalog_lists_entries_with_ids() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ConfigCatalog::new(&[entry("api", dir.path())]);

        let workspaces = catalog.list();
        assert_eq!(workspaces.len(), 1);
        assert_eq!(workspaces[0].name, "api");
        assert_eq!(workspaces[0].path, dir.path());
        assert!(workspaces[0].branch.is_none());
        assert!(!workspaces[0].is_worktree);

        // Lookup by derived id works.
        let found = catalog.get(&workspaces[0].id).unwrap();
        assert_eq!(found.name, "api");
        assert!(catalog.get("ws-ffffffff").is_none());
    }

    #[test]
    fn reads_branch_from_git_head() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        std::fs::create_dir(&git_dir).unwrap();
        std::fs::write(git_dir.join("HEAD"), "ref: refs/heads/feature/login\n").unwrap();

        assert_eq!(
            read_git_branch(dir.path()).as_deref(),
            Some("feature/login")
        );
    }

    #[test]
    fn detached_head_has_no_branch() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        std::fs::create_dir(&git_dir).unwrap();
        std::fs::write(git_dir.join("HEAD"), "a1b2c3d4e5f6a7b8c9d0\n").unwrap();

        assert!(read_git_branch(dir.path()).is_none());
    }

    #[test]
    fn worktree_is_detected_and_branch_resolved() {
        let root = tempfile::tempdir().unwrap();

        // The real git dir, as laid out for a linked worktree.
        let real_git = root.path().join("repo-git");
        std::fs::create_dir_all(&real_git).unwrap();
        std::fs::write(real_git.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        // The worktree checkout with a `.git` file.
        let worktree = root.path().join("checkout");
        std::fs::create_dir_all(&worktree).unwrap();
        std::fs::write(
            worktree.join(".git"),
            format!("gitdir: {}\n", real_git.display()),
        )
        .unwrap();

        let catalog = ConfigCatalog::new(&[entry("api", &worktree)]);
        let workspaces = catalog.list();
        assert!(workspaces[0].is_worktree);
        assert_eq!(workspaces[0].branch.as_deref(), Some("main"));
    }

    #[test]
    fn missing_directory_still_lists() {
        // A configured workspace whose directory is gone stays listed; the
        // bridge will refuse to spawn sessions in it.
        let catalog = ConfigCatalog::new(&[entry("gone", &PathBuf::from("/no/such/dir"))]);
        assert_eq!(catalog.list().len(), 1);
        assert!(catalog.list()[0].branch.is_none());
    }
}
