//! Common test utilities for image-builder integration tests

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// A source repository whose `main` branch the binary clones
pub struct TestRepo {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("source");
        let repo = Repository::init(&path).expect("Failed to init repository");
        repo.set_head("refs/heads/main").expect("Failed to point HEAD at main");
        Self { temp, path, repo }
    }

    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Commit `files` on top of whatever is already in the work tree.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Oid {
        for (path, content) in files {
            let file_path = self.path.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent directory");
            }
            fs::write(&file_path, content).expect("Failed to write file");
        }

        let mut index = self.repo.index().expect("Failed to open index");
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .expect("Failed to stage files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let sig = Signature::now("Test", "test@example.com").expect("Failed to create signature");
        let parent = self.repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to commit")
    }
}

/// A scratch directory holding config files and standing in for `$HOME`
pub struct TestHome {
    pub temp: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }
}

/// Two services and a docs folder, with the latest commit touching only `svc/api`
#[allow(dead_code)]
pub fn monorepo() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit(
        &[
            ("svc/api/Dockerfile", "FROM scratch\nCOPY main.go /\n"),
            ("svc/api/main.go", "package main\n"),
            ("svc/web/Dockerfile", "FROM scratch\n"),
            ("svc/web/index.html", "<html></html>\n"),
            ("docs/readme.md", "# docs\n"),
        ],
        "initial",
    );
    repo.commit(&[("svc/api/main.go", "package main\n\nfunc main() {}\n")], "api change");
    repo
}
