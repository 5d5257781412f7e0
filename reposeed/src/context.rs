use blanket::blanket;
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;

use directories::BaseDirs;

use crate::config::Config;
use crate::Error;

/// Package name used when nothing else is configured
pub const DEFAULT_PACKAGE_NAME: &str = "org.fdroid.fdroid";

pub const PACKAGE_ENV: &str = "REPOSEED_PACKAGE";
pub const CONFIG_ENV: &str = "REPOSEED_CONFIG";
pub const OEM_ROOTS_ENV: &str = "REPOSEED_OEM_ROOTS";

/// Context is a trait for an object that can help standardize file locations
/// and lookup env vars.
///
/// Most methods on this trait have a default implementation that is perfectly
/// safe to leave unchanged.
#[blanket(derive(Ref, Box))]
pub trait Context: Send + Sync {
    fn maybe_get_env(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn has_env(&self, key: &str) -> bool {
        self.maybe_get_env(key).is_some()
    }

    fn get_env(&self, key: &str) -> crate::Result<String> {
        self.maybe_get_env(key)
            .ok_or_else(|| Error::MissingEnv(key.into()))
    }

    /// The application package whose repositories are being seeded
    fn get_package_name(&self) -> String {
        self.maybe_get_env(PACKAGE_ENV)
            .unwrap_or_else(|| String::from(DEFAULT_PACKAGE_NAME))
    }

    fn get_user_config_dir(&self) -> crate::Result<PathBuf> {
        let bd = BaseDirs::new().ok_or(Error::NoBaseDirs)?;
        Ok(bd.config_dir().join("reposeed"))
    }

    fn get_config_file(&self) -> crate::Result<PathBuf> {
        if let Some(path) = self.maybe_get_env(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        self.get_user_config_dir().map(|it| it.join("reposeed.toml"))
    }

    /// The parsed configuration file, `None` if there isn't one
    fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>>;
}

#[derive(Clone, Default)]
pub struct DefaultContext {
    config: OnceCell<Option<Config>>,
}

impl DefaultContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Context for DefaultContext {
    fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>> {
        let cfg = self
            .config
            .get_or_try_init(|| -> crate::Result<Option<Config>> {
                let path = self.get_config_file()?;
                if !path.exists() {
                    log::debug!("no config file at {}", path.display());
                    Ok(None)
                } else {
                    Ok(Some(Config::parse(&path)?))
                }
            })?;
        Ok(cfg.as_ref())
    }
}
