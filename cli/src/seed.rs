use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use reposeed::seeder::BundledSource;
use reposeed::{DefaultContext, SeedConfig, Seeder};

use crate::output::OutputArgs;
use crate::printer::Printer;

#[derive(Args)]
pub struct Seed {
    #[arg(short, long, help = "Package whose repositories are seeded")]
    package: Option<String>,

    /// Vendor partition to search, may be given multiple times. Replaces the
    /// configured roots.
    #[arg(short = 'r', long = "oem-root")]
    oem_roots: Vec<PathBuf>,

    #[arg(short, long, help = "Use this repo list instead of the built-in one")]
    bundled: Option<PathBuf>,

    #[arg(long, help = "Fail if a vendor repo list is malformed")]
    strict_oem: bool,

    #[command(flatten)]
    output: OutputArgs,
}

impl Seed {
    fn apply_overrides(&self, cfg: &mut SeedConfig) {
        if let Some(package) = &self.package {
            cfg.package = package.clone();
        }
        if !self.oem_roots.is_empty() {
            cfg.oem_roots = self.oem_roots.clone();
        }
        if let Some(bundled) = &self.bundled {
            cfg.bundled = BundledSource::File(bundled.clone());
        }
        if self.strict_oem {
            cfg.strict_oem = true;
        }
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let ctx = DefaultContext::new();
        let mut cfg = SeedConfig::from_context(&ctx).context("loading configuration")?;
        self.apply_overrides(&mut cfg);

        let seeder = Seeder::new(cfg);
        for path in seeder.oem_paths() {
            log::debug!("looking for additional repos in {}", path.display());
        }

        let initial = seeder
            .load_initial_repos()
            .context("building the initial repo list")?;
        self.output.print_initial(&Printer::new(), &initial)
    }
}
