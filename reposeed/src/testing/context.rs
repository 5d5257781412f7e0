use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use mockall::mock;
use rstest::fixture;

use super::temp::random_temp_path;
use crate::config::Config;
use crate::Context;

#[fixture]
pub fn tmp_context() -> TestContext {
    TestContext::default()
}

#[fixture]
pub fn mock_context() -> MockContext {
    MockContext::new()
}

/// A [Context] rooted in a fresh temporary directory that never looks at the
/// real environment
pub struct TestContext {
    base_dir: PathBuf,
    env: HashMap<String, String>,
    config: Option<Config>,
}

impl TestContext {
    pub fn set_env<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) -> &mut Self {
        self.env.insert(key.as_ref().into(), value.as_ref().into());
        self
    }

    pub fn set_config(&mut self, content: &str) -> &mut Self {
        let path = self.base_dir.join("config").join("reposeed.toml");
        self.config = Some(Config::from_str(&path, content).expect("valid test config"));
        self
    }

    /// Write a file relative to the base directory, creating parents as needed
    pub fn create_file(&self, relative: &str, content: &str) -> PathBuf {
        let file = self.base_dir.join(relative);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).expect("creating parent dirs");
        }
        fs::write(&file, content).expect("writing test file");
        file
    }

    pub fn to_abs<P: AsRef<Path> + ?Sized>(&self, path: &P) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        _ = fs::remove_dir_all(&self.base_dir);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        let base_dir = random_temp_path();
        fs::create_dir_all(&base_dir).expect("failed to create test dir");

        Self {
            base_dir,
            env: HashMap::new(),
            config: None,
        }
    }
}

impl Context for TestContext {
    fn maybe_get_env(&self, key: &str) -> Option<String> {
        self.env.get(key).map(String::from)
    }

    fn get_user_config_dir(&self) -> crate::Result<PathBuf> {
        Ok(self.base_dir.join("config"))
    }

    fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>> {
        Ok(self.config.as_ref())
    }
}

mock! {
    pub Context {

    }

    impl crate::Context for Context {
        fn maybe_get_env(&self, key: &str) -> Option<String>;
        fn get_package_name(&self) -> String;
        fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>>;
    }
}
