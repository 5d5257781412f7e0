use clap::Args;
use crossterm::style::Color;

use reposeed::repo::flatten;
use reposeed::{InitialRepos, RepoRecord};

use crate::printer::{color, Printer};

/// How records are written to stdout
#[derive(Args, Clone, Copy, Default)]
pub struct OutputArgs {
    #[arg(long, help = "Print the records as JSON", conflicts_with = "flat")]
    json: bool,

    #[arg(long, help = "Print the flat fields, one per line")]
    flat: bool,
}

pub fn record_line(record: &RepoRecord) -> String {
    let mut line = format!(
        "{:>3}  {}  {}  v{}",
        record.priority, record.name, record.address, record.version
    );
    if !record.enabled {
        line.push_str("  (disabled)");
    }
    line
}

impl OutputArgs {
    fn print_listing(&self, printer: &Printer, records: &[RepoRecord], enabled_color: Color) {
        for r in records {
            let color = if r.enabled {
                enabled_color
            } else {
                color::DISABLED
            };
            printer.println_colored(record_line(r), color);
        }
    }

    fn print_flat(&self, printer: &Printer, records: &[RepoRecord]) {
        for field in flatten(records) {
            printer.println(field);
        }
    }

    pub fn print_records(&self, printer: &Printer, records: &[RepoRecord]) -> anyhow::Result<()> {
        if self.json {
            printer.println(serde_json::to_string_pretty(records)?);
        } else if self.flat {
            self.print_flat(printer, records);
        } else {
            self.print_listing(printer, records, color::OEM);
        }
        Ok(())
    }

    pub fn print_initial(&self, printer: &Printer, initial: &InitialRepos) -> anyhow::Result<()> {
        if self.json {
            printer.println(serde_json::to_string_pretty(initial)?);
        } else if self.flat {
            self.print_flat(printer, initial.records());
        } else {
            self.print_listing(printer, initial.oem_records(), color::OEM);
            self.print_listing(printer, initial.bundled_records(), color::BUNDLED);
        }
        Ok(())
    }
}
