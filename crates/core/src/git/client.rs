//! Local Git repository operations via `git2`.

use std::path::{Path, PathBuf};

use git2::{Delta, ObjectType, Repository, Tree};
use tracing::{debug, info};

use crate::errors::GitError;
use crate::models::{ChangeStatus, ChangedFile};

use super::RepoSource;

/// Git-backed [`RepoSource`] wrapping a `git2::Repository`.
///
/// Change enumeration uses the merge base of HEAD and the base ref, the
/// `base...HEAD` semantics of `git diff --name-status`. Rename detection
/// stays off, so a rename surfaces as a deletion plus an addition.
pub struct GitClient {
    repo: Repository,
    repo_path: PathBuf,
}

impl GitClient {
    /// Open an existing Git repository at `repo_path`.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::discover(path)
            .map_err(|_| GitError::RepositoryNotFound(path.display().to_string()))?;
        let repo_path = path.to_path_buf();
        Ok(Self { repo, repo_path })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Resolve a ref name to the tree of the commit it points at.
    fn tree_at(&self, reference: &str) -> Result<Tree<'_>, GitError> {
        let object = self
            .repo
            .revparse_single(reference)
            .map_err(|_| GitError::RefNotFound(reference.to_string()))?;
        let commit = object
            .peel_to_commit()
            .map_err(|_| GitError::RefNotFound(reference.to_string()))?;
        Ok(commit.tree()?)
    }
}

impl RepoSource for GitClient {
    fn changed_paths(&self, base_ref: &str) -> Result<Vec<ChangedFile>, GitError> {
        let base_commit = self
            .repo
            .revparse_single(base_ref)
            .and_then(|o| o.peel_to_commit())
            .map_err(|_| GitError::RefNotFound(base_ref.to_string()))?;
        let head_commit = self.repo.head()?.peel_to_commit()?;

        let merge_base = self.repo.merge_base(base_commit.id(), head_commit.id())?;
        let base_tree = self.repo.find_commit(merge_base)?.tree()?;
        let head_tree = head_commit.tree()?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)?;

        let mut changed = Vec::new();
        for delta in diff.deltas() {
            let status = match delta.status() {
                Delta::Added => ChangeStatus::Added,
                Delta::Modified => ChangeStatus::Modified,
                Delta::Deleted => ChangeStatus::Deleted,
                _ => continue,
            };
            let file = match status {
                ChangeStatus::Deleted => delta.old_file(),
                _ => delta.new_file(),
            };
            if let Some(path) = file.path().and_then(|p| p.to_str()) {
                changed.push(ChangedFile::new(status, path));
            }
        }
        debug!(base = base_ref, count = changed.len(), "enumerated changed files");
        Ok(changed)
    }

    fn list_paths(&self, reference: &str) -> Result<Vec<String>, GitError> {
        let tree = self.tree_at(reference)?;
        let mut paths = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    paths.push(format!("{}{}", root, name));
                }
            }
            git2::TreeWalkResult::Ok
        })?;
        debug!(reference, count = paths.len(), "listed tree paths");
        Ok(paths)
    }

    fn read_at(&self, reference: &str, path: &str) -> Result<String, GitError> {
        let tree = self.tree_at(reference)?;
        let entry = tree
            .get_path(Path::new(path))
            .map_err(|_| GitError::PathNotFound {
                revision: reference.to_string(),
                path: path.to_string(),
            })?;
        let object = entry.to_object(&self.repo)?;
        let blob = object.peel_to_blob().map_err(|_| GitError::PathNotFound {
            revision: reference.to_string(),
            path: path.to_string(),
        })?;
        Ok(String::from_utf8_lossy(blob.content()).into_owned())
    }

    fn read_worktree(&self, path: &str) -> Result<String, GitError> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| GitError::BareRepository(self.repo_path.display().to_string()))?;
        Ok(std::fs::read_to_string(workdir.join(path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{IndexAddOption, Signature};

    fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();
        let tree_oid = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_oid).unwrap();
        let sig = Signature::now("Test", "test@test.com").unwrap();
        let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn write_file(dir: &Path, rel: &str, content: &str) {
        let full = dir.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    #[test]
    fn test_open_not_found() {
        assert!(matches!(
            GitClient::open("/nonexistent"),
            Err(GitError::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn test_changed_paths_added_modified_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        write_file(dir.path(), "rules/a.xml", "<rule id=\"100001\"/>");
        write_file(dir.path(), "rules/b.xml", "<rule id=\"100002\"/>");
        let base_oid = commit_all(&repo, "base");
        repo.branch("base", &repo.find_commit(base_oid).unwrap(), false)
            .unwrap();

        write_file(dir.path(), "rules/a.xml", "<rule id=\"100001\" level=\"5\"/>");
        write_file(dir.path(), "rules/c.xml", "<rule id=\"100003\"/>");
        std::fs::remove_file(dir.path().join("rules/b.xml")).unwrap();
        commit_all(&repo, "change set");

        let client = GitClient::open(dir.path()).unwrap();
        let mut changed = client.changed_paths("base").unwrap();
        changed.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(
            changed,
            vec![
                ChangedFile::new(ChangeStatus::Modified, "rules/a.xml"),
                ChangedFile::new(ChangeStatus::Deleted, "rules/b.xml"),
                ChangedFile::new(ChangeStatus::Added, "rules/c.xml"),
            ]
        );
    }

    #[test]
    fn test_list_paths_and_read_at() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write_file(dir.path(), "rules/a.xml", "<rule id=\"100001\"/>");
        write_file(dir.path(), "README.md", "docs");
        let oid = commit_all(&repo, "base");
        repo.branch("base", &repo.find_commit(oid).unwrap(), false)
            .unwrap();

        let client = GitClient::open(dir.path()).unwrap();
        let mut paths = client.list_paths("base").unwrap();
        paths.sort();
        assert_eq!(paths, vec!["README.md", "rules/a.xml"]);

        let content = client.read_at("base", "rules/a.xml").unwrap();
        assert_eq!(content, "<rule id=\"100001\"/>");
    }

    #[test]
    fn test_read_at_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write_file(dir.path(), "rules/a.xml", "<rule id=\"100001\"/>");
        let oid = commit_all(&repo, "base");
        repo.branch("base", &repo.find_commit(oid).unwrap(), false)
            .unwrap();

        let client = GitClient::open(dir.path()).unwrap();
        let err = client.read_at("base", "rules/missing.xml").unwrap_err();
        assert!(matches!(err, GitError::PathNotFound { .. }));
    }

    #[test]
    fn test_read_at_unknown_ref() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write_file(dir.path(), "f.txt", "x");
        commit_all(&repo, "init");

        let client = GitClient::open(dir.path()).unwrap();
        assert!(matches!(
            client.read_at("no-such-ref", "f.txt"),
            Err(GitError::RefNotFound(_))
        ));
    }

    #[test]
    fn test_read_worktree() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        write_file(dir.path(), "rules/a.xml", "<rule id=\"100001\"/>");

        let client = GitClient::open(dir.path()).unwrap();
        assert_eq!(
            client.read_worktree("rules/a.xml").unwrap(),
            "<rule id=\"100001\"/>"
        );
        assert!(matches!(
            client.read_worktree("rules/missing.xml"),
            Err(GitError::IoError(_))
        ));
    }
}
