pub mod repo;
pub use repo::{PushRequests, RepoRecord, FIELDS_PER_RECORD};

pub mod parser;
pub use parser::{ParseError, RepoListParser};

pub mod seeder;
pub use seeder::{InitialRepos, SeedConfig, Seeder};

pub mod context;
pub use context::{Context, DefaultContext};

pub mod config;

pub mod errors;
pub use errors::{Error, Result};

pub mod utils;

#[cfg(test)]
pub mod testing;
