use std::path::PathBuf;

use colored::Colorize;
use doclayout_core::HeuristicConfig;

use crate::embeddings::EmbeddingOptions;
use crate::pipeline::{
    find_documents, run_analysis, write_report, DocumentRanker, RankerKind, RunParams,
};
use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct AnalyzeOptions {
    /// Folder containing PDF files (or JSON fragment dumps)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to save the output JSON file
    #[arg(short, long)]
    pub output: PathBuf,

    /// User persona (e.g. "Travel Planner")
    #[arg(short, long)]
    pub persona: String,

    /// Job to be done; also used as the ranking query
    #[arg(short, long)]
    pub job: String,

    /// Ranked headings kept per document
    #[arg(long, env = "DOCLAYOUT_TOP_K_MATCHES", default_value = "10")]
    pub top_k_matches: usize,

    /// Sections kept in the final report
    #[arg(long, env = "DOCLAYOUT_TOP_K", default_value = "20")]
    pub top_k: usize,

    /// Ranking backend
    #[arg(long, value_enum, env = "DOCLAYOUT_RANKER", default_value_t = RankerKind::Lexical)]
    pub ranker: RankerKind,

    /// Documents processed concurrently
    #[arg(long, env = "DOCLAYOUT_JOBS", default_value = "4")]
    pub jobs: usize,

    #[command(flatten)]
    pub embeddings: EmbeddingOptions,
}

pub async fn run(options: AnalyzeOptions, global: crate::Global) -> Result<()> {
    let documents = find_documents(&options.input)?;
    if documents.is_empty() {
        return Err(eyre!(Error::NoDocuments(
            options.input.display().to_string()
        )));
    }

    println!("Processing {} documents...", documents.len());
    println!("{}: {}", "Persona".green(), options.persona);
    println!("{}: {}", "Query".green(), options.job);
    if global.verbose {
        println!("{}: {:?}", "Ranker".green(), options.ranker);
        println!("{}: {}", "Top K matches".green(), options.top_k_matches);
        println!("{}: {}", "Top K output".green(), options.top_k);
        println!("{}: {}", "Jobs".green(), options.jobs);
    }

    let ranker = DocumentRanker::new(options.ranker, &options.embeddings);
    let params = RunParams {
        documents,
        persona: options.persona.clone(),
        job_to_be_done: options.job.clone(),
        query: options.job.clone(),
        top_k_matches: options.top_k_matches,
        top_k_output: options.top_k,
        jobs: options.jobs,
        heuristics: HeuristicConfig::default(),
    };

    let spinner = new_spinner()?;
    let output = run_analysis(params, &ranker, Some(&spinner)).await;
    spinner.finish_and_clear();
    let output = output?;

    write_report(&options.output, &output)?;

    println!(
        "{} {} sections ({} found) written to {}",
        "Done.".green().bold(),
        output.metadata.top_k_selected,
        output.metadata.total_sections_found,
        options.output.display().to_string().cyan()
    );
    if !output.failures.is_empty() {
        println!(
            "{}",
            f!("{} documents failed", output.failures.len()).yellow()
        );
    }

    Ok(())
}
