use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use reposeed::parser::OEM_CONTAINER;
use reposeed::RepoListParser;

use crate::output::OutputArgs;
use crate::printer::Printer;

#[derive(Args)]
pub struct Parse {
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

    #[command(flatten)]
    output: OutputArgs,
}

impl Parse {
    pub fn run(&self) -> anyhow::Result<()> {
        let parser = RepoListParser::new(&self.container);
        let records = parser
            .parse_file(&self.file)
            .with_context(|| format!("parsing {}", self.file.display()))?;
        log::info!("{} repositories in {}", records.len(), self.file.display());
        self.output.print_records(&Printer::new(), &records)
    }
}
