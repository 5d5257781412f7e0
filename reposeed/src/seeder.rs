use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::context::{OEM_ROOTS_ENV, PACKAGE_ENV};
use crate::parser::{RepoListParser, BUNDLED_CONTAINER, OEM_CONTAINER};
use crate::repo::{assign_priorities, flatten, RepoRecord};
use crate::{Context, Error};

/// The default repo list shipped with the application
pub const BUNDLED_DEFAULT_REPOS: &str = include_str!("../res/default_repos.xml");

pub const OEM_FILE_NAME: &str = "additional_repos.xml";
pub const DEFAULT_OEM_ROOTS: &[&str] = &["/oem"];

/// First priority handed out to the bundled repositories, vendor repositories
/// start at 0
pub const DEFAULT_BUNDLED_PRIORITY_BASE: u32 = 1;

/// Where the bundled repo list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundledSource {
    /// The list compiled into this library
    Builtin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub package: String,
    /// Vendor partitions searched for `etc/<package>/<oem_file_name>`, in order
    pub oem_roots: Vec<PathBuf>,
    pub oem_file_name: String,
    pub oem_container: String,
    /// Fail seeding when a vendor file is malformed instead of skipping it
    pub strict_oem: bool,
    pub bundled: BundledSource,
    pub bundled_container: String,
    pub bundled_priority_base: u32,
}

impl SeedConfig {
    pub fn new<S: Into<String>>(package: S) -> Self {
        Self {
            package: package.into(),
            oem_roots: DEFAULT_OEM_ROOTS.iter().map(PathBuf::from).collect(),
            oem_file_name: OEM_FILE_NAME.into(),
            oem_container: OEM_CONTAINER.into(),
            strict_oem: false,
            bundled: BundledSource::Builtin,
            bundled_container: BUNDLED_CONTAINER.into(),
            bundled_priority_base: DEFAULT_BUNDLED_PRIORITY_BASE,
        }
    }

    /// Build the configuration from the context's config file and environment
    ///
    /// Values from the environment take precedence over the config file.
    pub fn from_context(ctx: &dyn Context) -> crate::Result<Self> {
        let mut cfg = Self::new(ctx.get_package_name());

        if let Some(file) = ctx.get_config()? {
            cfg.apply_config(file)?;
        }

        if ctx.has_env(PACKAGE_ENV) {
            cfg.package = ctx.get_package_name();
        }

        if let Some(roots) = ctx.maybe_get_env(OEM_ROOTS_ENV) {
            cfg.oem_roots = env::split_paths(&roots).collect();
        }

        Ok(cfg)
    }

    pub fn apply_config(&mut self, config: &Config) -> crate::Result<()> {
        let base = config.get_map();

        if let Some(package) = base.maybe_get_str_typecheck("package")? {
            self.package = package.into();
        }

        if let Some(oem) = base.maybe_get_map_typecheck("oem")? {
            if let Some(roots) = oem.maybe_get_str_array_typecheck("roots")? {
                self.oem_roots = roots.into_iter().map(PathBuf::from).collect();
            }
            if let Some(name) = oem.maybe_get_str_typecheck("file_name")? {
                self.oem_file_name = name.into();
            }
            if let Some(container) = oem.maybe_get_str_typecheck("container")? {
                self.oem_container = container.into();
            }
            if let Some(strict) = oem.maybe_get_bool_typecheck("strict")? {
                self.strict_oem = strict;
            }
        }

        if let Some(bundled) = base.maybe_get_map_typecheck("bundled")? {
            if let Some(path) = bundled.maybe_get_str_typecheck("path")? {
                self.bundled = BundledSource::File(PathBuf::from(path));
            }
            if let Some(container) = bundled.maybe_get_str_typecheck("container")? {
                self.bundled_container = container.into();
            }
            if let Some(priority_base) = bundled.maybe_get_int_typecheck("priority_base")? {
                self.bundled_priority_base = u32::try_from(priority_base)
                    .map_err(|_| bundled.invalid_key("priority_base", "non-negative int"))?;
            }
        }

        Ok(())
    }
}

/// The ordered list of repositories to insert on first run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitialRepos {
    oem_count: usize,
    records: Vec<RepoRecord>,
}

impl InitialRepos {
    pub fn new(oem: Vec<RepoRecord>, bundled: Vec<RepoRecord>) -> Self {
        let oem_count = oem.len();
        let mut records = oem;
        records.extend(bundled);
        Self { oem_count, records }
    }

    pub fn records(&self) -> &[RepoRecord] {
        &self.records
    }

    pub fn oem_records(&self) -> &[RepoRecord] {
        &self.records[..self.oem_count]
    }

    pub fn bundled_records(&self) -> &[RepoRecord] {
        &self.records[self.oem_count..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flat fields, [crate::FIELDS_PER_RECORD] per repository
    pub fn to_fields(&self) -> Vec<String> {
        flatten(&self.records)
    }

    pub fn into_records(self) -> Vec<RepoRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a InitialRepos {
    type Item = &'a RepoRecord;
    type IntoIter = std::slice::Iter<'a, RepoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn number_repos(repos: &mut [RepoRecord], base: u32) -> crate::Result<()> {
    assign_priorities(repos, base).ok_or(Error::PriorityOverflow {
        base,
        count: repos.len(),
    })
}

/// Builds the initial repository list from vendor files and the bundled list
pub struct Seeder {
    cfg: SeedConfig,
}

impl Seeder {
    pub fn new(cfg: SeedConfig) -> Self {
        Self { cfg }
    }

    pub fn from_context(ctx: &dyn Context) -> crate::Result<Self> {
        Ok(Self::new(SeedConfig::from_context(ctx)?))
    }

    pub fn config(&self) -> &SeedConfig {
        &self.cfg
    }

    /// Every location a vendor repo list is looked for, in priority order
    pub fn oem_paths(&self) -> Vec<PathBuf> {
        self.cfg
            .oem_roots
            .iter()
            .map(|root| {
                root.join("etc")
                    .join(&self.cfg.package)
                    .join(&self.cfg.oem_file_name)
            })
            .collect()
    }

    /// Load the vendor provided repositories, with priorities starting at 0
    ///
    /// Missing or unreadable files are skipped. Malformed files are skipped as
    /// well unless the seeder is strict about them.
    pub fn load_oem_repos(&self) -> crate::Result<Vec<RepoRecord>> {
        let parser = RepoListParser::new(&self.cfg.oem_container);
        let mut repos = Vec::new();

        for path in self.oem_paths() {
            if !path.is_file() {
                log::debug!("no additional repos at {}", path.display());
                continue;
            }

            let result = parser.parse_file(&path);
            self.absorb_oem_result(&path, result, &mut repos)?;
        }

        number_repos(&mut repos, 0)?;
        Ok(repos)
    }

    /// Fold the outcome of reading one vendor file into `repos`, only errors
    /// that have to abort seeding are returned
    fn absorb_oem_result(
        &self,
        path: &Path,
        result: crate::Result<Vec<RepoRecord>>,
        repos: &mut Vec<RepoRecord>,
    ) -> crate::Result<()> {
        match result {
            Ok(found) => {
                log::info!(
                    "found {} additional repos in {}",
                    found.len(),
                    path.display()
                );
                repos.extend(found);
            }
            Err(Error::MissingFile(_)) => {
                log::debug!("no additional repos at {}", path.display());
            }
            Err(Error::IO(e)) => {
                log::warn!("unable to read {}: {}", path.display(), e);
            }
            Err(e @ Error::Parse(..)) if !self.cfg.strict_oem => {
                log::error!("ignoring additional repos: {}", e);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Load the bundled repositories in catalog order
    pub fn load_bundled_repos(&self) -> crate::Result<Vec<RepoRecord>> {
        let parser = RepoListParser::new(&self.cfg.bundled_container);

        let mut repos = match &self.cfg.bundled {
            BundledSource::Builtin => parser
                .parse_str(BUNDLED_DEFAULT_REPOS)
                .map_err(|e| Error::new_parse("built-in default_repos.xml", e))?,
            BundledSource::File(path) => parser.parse_file(path)?,
        };

        if repos.is_empty() {
            log::warn!("bundled repo list contains no repositories");
        }

        number_repos(&mut repos, self.cfg.bundled_priority_base)?;
        Ok(repos)
    }

    /// Vendor repositories first, then the bundled ones
    pub fn load_initial_repos(&self) -> crate::Result<InitialRepos> {
        let oem = self.load_oem_repos()?;
        let bundled = self.load_bundled_repos()?;
        Ok(InitialRepos::new(oem, bundled))
    }
}
