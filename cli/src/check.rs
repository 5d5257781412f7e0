use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;

use reposeed::parser::OEM_CONTAINER;
use reposeed::repo::records_from_items;
use reposeed::RepoListParser;

use crate::printer::{color, Printer};

#[derive(Args)]
pub struct Check {
    /// The repo list XML file
    #[arg()]
    file: PathBuf,

    #[arg(
        short,
        long,
        help = "Name of the string-array holding the repositories",
        default_value = OEM_CONTAINER
    )]
    container: String,
}

impl Check {
    /// Fails only when the file is structurally broken, a list that yields no
    /// repositories is reported but still passes
    pub fn run(&self) -> anyhow::Result<()> {
        let printer = Printer::new();
        let file = File::open(&self.file)
            .with_context(|| format!("opening {}", self.file.display()))?;

        let parser = RepoListParser::new(&self.container);
        let items = match parser.harvest(BufReader::new(file)) {
            Ok(v) => v,
            Err(e) => {
                printer.println_colored(format!("{}: {}", self.file.display(), e), color::ERROR);
                bail!("{} is not a valid repo list", self.file.display());
            }
        };

        match records_from_items(items) {
            Ok(records) => printer.println_colored(
                format!(
                    "{}: {} repositories",
                    self.file.display(),
                    records.len()
                ),
                color::OK,
            ),
            Err(rejection) => printer.println_colored(
                format!(
                    "{}: no usable repositories ({})",
                    self.file.display(),
                    rejection
                ),
                color::YELLOW,
            ),
        }
        Ok(())
    }
}
