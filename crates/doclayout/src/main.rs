use crate::prelude::*;
use clap::Parser;

mod analyze;
mod candidates;
mod collections;
mod embeddings;
mod error;
mod pipeline;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Find the PDF sections that matter for a persona and their job to be done"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "DOCLAYOUT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Rank the sections of every PDF in a folder and write a JSON report
    Analyze(crate::analyze::AnalyzeOptions),

    /// Run collections defined in a configuration file
    Collections(crate::collections::CollectionsOptions),

    /// Show the heading candidates detected in one document
    Candidates(crate::candidates::CandidatesOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Analyze(options) => crate::analyze::run(options, app.global).await,
        SubCommands::Collections(options) => crate::collections::run(options, app.global).await,
        SubCommands::Candidates(options) => crate::candidates::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
