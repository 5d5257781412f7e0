use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rstest::fixture;

/// A uniquely named directory under the system temp dir, removed on drop
pub struct TmpDir {
    path: PathBuf,
}

impl TmpDir {
    pub fn new() -> Self {
        let path = random_temp_path();
        fs::create_dir_all(&path).expect("failed to create temp directory");
        Self { path }
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Write `content` to `name` below the directory, creating parents
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let file = self.path.join(name);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories");
        }
        fs::write(&file, content).expect("failed to write temp file");
        file
    }
}

impl Drop for TmpDir {
    fn drop(&mut self) {
        _ = fs::remove_dir_all(&self.path);
    }
}

pub(crate) fn random_temp_path() -> PathBuf {
    let suffix: u64 = rand::thread_rng().gen();
    env::temp_dir().join(format!("reposeed-test-{:016x}", suffix))
}

#[fixture]
pub fn tmp_dir() -> TmpDir {
    TmpDir::new()
}
