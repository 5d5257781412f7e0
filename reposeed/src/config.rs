use std::fmt::Display;
use std::path::Path;
use std::{borrow::Cow, path::PathBuf};
use toml::{Table, Value};

use crate::utils::{path_lossy, read_file};

#[derive(Debug)]
pub enum Error {
    InvalidType,
    MissingKey,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::InvalidType => "InvalidType",
                Self::MissingKey => "MissingKey",
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct ConfigMap<'c> {
    path: &'c Path,
    name: Option<Cow<'c, str>>,
    table: &'c Table,
}

#[derive(Clone, Debug)]
pub struct Config {
    path: PathBuf,
    base: Table,
}

impl Config {
    pub fn parse(source: &Path) -> crate::Result<Self> {
        let as_str = read_file(source)?;
        Self::from_str(source, &as_str)
    }

    /// Parse already loaded content, `source` is only used for error messages
    pub fn from_str(source: &Path, content: &str) -> crate::Result<Self> {
        let base: Table = match toml::from_str(content) {
            Ok(v) => v,
            Err(e) => return Err(crate::Error::new_cfg(source, &e)),
        };
        Ok(Self {
            base,
            path: PathBuf::from(source),
        })
    }

    pub fn get_map(&self) -> ConfigMap {
        ConfigMap {
            name: None,
            path: &self.path,
            table: &self.base,
        }
    }
}

impl<'c> ConfigMap<'c> {
    fn get_full_path<'a>(&'a self) -> Option<&'a str> {
        self.name.as_ref().map(|it| it.as_ref())
    }

    fn key_path<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self.get_full_path() {
            None => Cow::Borrowed(key),
            Some(v) => Cow::Owned(format!("{}.{}", v, key)),
        }
    }

    /// Helper to create a crate::Error for an invalid key
    pub fn invalid_key(&self, key: &str, expected: &str) -> crate::Error {
        let path = self.key_path(key);
        crate::Error::InvalidConfig(
            path_lossy(self.path).into(),
            format!(
                "invalid value for key: {} (expected type: {})",
                path, expected
            ),
        )
    }

    fn get(&self, key: &str) -> Option<&'c Value> {
        self.table.get(key)
    }

    pub fn maybe_get_int(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            Some(v) => match v.as_integer() {
                Some(v) => Ok(Some(v)),
                None => Err(Error::InvalidType),
            },
            None => Ok(None),
        }
    }

    pub fn maybe_get_int_typecheck(&self, key: &str) -> crate::Result<Option<i64>> {
        self.maybe_get_int(key)
            .map_err(|_| self.invalid_key(key, "int"))
    }

    pub fn maybe_get_str(&self, key: &str) -> Result<Option<&'c str>> {
        match self.get(key) {
            Some(v) => match v.as_str() {
                Some(v) => Ok(Some(v)),
                None => Err(Error::InvalidType),
            },
            None => Ok(None),
        }
    }

    pub fn maybe_get_str_typecheck(&self, key: &str) -> crate::Result<Option<&'c str>> {
        self.maybe_get_str(key)
            .map_err(|_| self.invalid_key(key, "string"))
    }

    /// Get an array where every element has to be a string
    pub fn maybe_get_str_array(&self, key: &str) -> Result<Option<Vec<&'c str>>> {
        let arr = match self.get(key) {
            Some(v) => v.as_array().ok_or(Error::InvalidType)?,
            None => return Ok(None),
        };
        arr.iter()
            .map(|it| it.as_str().ok_or(Error::InvalidType))
            .collect::<Result<Vec<&'c str>>>()
            .map(Some)
    }

    pub fn maybe_get_str_array_typecheck(&self, key: &str) -> crate::Result<Option<Vec<&'c str>>> {
        self.maybe_get_str_array(key)
            .map_err(|_| self.invalid_key(key, "array of strings"))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)
            .ok_or(Error::MissingKey)?
            .as_bool()
            .ok_or(Error::InvalidType)
    }

    pub fn maybe_get_bool_typecheck(&self, key: &str) -> crate::Result<Option<bool>> {
        match self.get_bool(key) {
            Ok(v) => Ok(Some(v)),
            Err(Error::MissingKey) => Ok(None),
            Err(Error::InvalidType) => Err(self.invalid_key(key, "bool")),
        }
    }

    pub fn maybe_get_map(&'c self, key: &'c str) -> Result<Option<ConfigMap<'c>>> {
        match self.get(key) {
            Some(v) => match v.as_table() {
                Some(table) => {
                    let name = match &self.get_full_path() {
                        Some(parents) => Cow::Owned(format!("{parents}.{key}")),
                        None => Cow::Borrowed(key),
                    };
                    Ok(Some(Self {
                        name: Some(name),
                        path: self.path,
                        table,
                    }))
                }
                None => Err(Error::InvalidType),
            },
            None => Ok(None),
        }
    }

    pub fn maybe_get_map_typecheck(&'c self, key: &'c str) -> crate::Result<Option<ConfigMap<'c>>> {
        self.maybe_get_map(key)
            .map_err(|_| self.invalid_key(key, "table"))
    }
}

#[cfg(test)]
mod test {

    use crate::testing::{tmp_dir, TmpDir};
    use std::path::PathBuf;

    use super::*;
    use rstest::*;

    #[fixture]
    fn cfg_file(tmp_dir: TmpDir) -> (TmpDir, PathBuf) {
        let content = r#"
package = "org.example.store"

[oem]
roots = ["/oem", "/vendor"]
strict = true

[bundled]
priority_base = 3
quux = { neato = true }
"#;

        let file = tmp_dir.create_file("reposeed.toml", content);
        (tmp_dir, file)
    }

    #[rstest]
    fn test_config(cfg_file: (TmpDir, PathBuf)) {
        let (_dir, path) = cfg_file;
        let cfg = Config::parse(&path).expect("parsing config");
        let base = cfg.get_map();
        assert_eq!(
            base.maybe_get_str_typecheck("package").unwrap(),
            Some("org.example.store")
        );
        assert_eq!(base.maybe_get_str_typecheck("ohno").unwrap(), None);

        let oem = base
            .maybe_get_map_typecheck("oem")
            .unwrap()
            .expect("getting oem");
        assert_eq!(
            oem.maybe_get_str_array_typecheck("roots").unwrap(),
            Some(vec!["/oem", "/vendor"])
        );
        assert_eq!(oem.maybe_get_bool_typecheck("strict").unwrap(), Some(true));
        assert_eq!(oem.maybe_get_bool_typecheck("missing").unwrap(), None);

        let bundled = base
            .maybe_get_map_typecheck("bundled")
            .unwrap()
            .expect("getting bundled");
        assert_eq!(bundled.maybe_get_int_typecheck("priority_base").unwrap(), Some(3));
        let quux = bundled
            .maybe_get_map_typecheck("quux")
            .unwrap()
            .expect("getting bundled.quux");
        assert_eq!(quux.maybe_get_bool_typecheck("neato").unwrap(), Some(true));
        match bundled.maybe_get_str_typecheck("quux") {
            Err(crate::Error::InvalidConfig(_, msg)) => {
                assert!(msg.contains("bundled.quux"), "{}", msg)
            }
            other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_types() {
        let path = PathBuf::from("inline.toml");
        let cfg = Config::from_str(&path, "[oem]\nroots = [1, 2]\nstrict = \"yes\"\n")
            .expect("valid toml");
        let base = cfg.get_map();
        let oem = base
            .maybe_get_map_typecheck("oem")
            .unwrap()
            .expect("getting oem");

        match oem.maybe_get_str_array_typecheck("roots") {
            Err(crate::Error::InvalidConfig(file, msg)) => {
                assert_eq!(file, "inline.toml");
                assert!(msg.contains("oem.roots"), "{}", msg);
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
        assert!(oem.maybe_get_bool_typecheck("strict").is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let path = PathBuf::from("broken.toml");
        assert!(matches!(
            Config::from_str(&path, "this is = = not toml"),
            Err(crate::Error::InvalidConfig(_, _))
        ));
    }
}
