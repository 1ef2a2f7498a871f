use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use doclayout_core::config::{results_file_name, RunConfig};

use crate::embeddings::EmbeddingOptions;
use crate::pipeline::{
    find_documents, run_analysis, write_report, DocumentRanker, RankerKind, RunParams,
};
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct CollectionsOptions {
    /// Run configuration (TOML, or JSON by extension)
    #[arg(short, long, env = "DOCLAYOUT_CONFIG", default_value = "doclayout.toml")]
    pub config: PathBuf,

    /// Collection name, 1-based number, or "all". Prompts when omitted.
    pub selection: Option<String>,

    /// Ranking backend
    #[arg(long, value_enum, env = "DOCLAYOUT_RANKER", default_value_t = RankerKind::Lexical)]
    pub ranker: RankerKind,

    /// Documents processed concurrently
    #[arg(long, env = "DOCLAYOUT_JOBS", default_value = "4")]
    pub jobs: usize,

    #[command(flatten)]
    pub embeddings: EmbeddingOptions,
}

pub async fn run(options: CollectionsOptions, global: crate::Global) -> Result<()> {
    let config = RunConfig::load(&options.config)
        .wrap_err_with(|| f!("Failed to load '{}'", options.config.display()))?;
    let names: Vec<&str> = config.collection_names();

    if global.verbose {
        println!("{}: {}", "Config".green(), options.config.display());
        println!("{}: {}", "Output folder".green(), config.output.folder);
    }

    let selection = match options.selection {
        Some(selection) => selection,
        None => prompt_selection(&names)?,
    };
    let selected = resolve_selection(&selection, &names)?;

    let ranker = DocumentRanker::new(options.ranker, &options.embeddings);
    for name in &selected {
        if let Err(err) = process_collection(name, &config, &ranker, options.jobs).await {
            eprintln!("{} {}: {:#}", "Error".red().bold(), name, err);
        }
    }

    Ok(())
}

/// Interpret a selection typed by the user: `all`, a 1-based number, or an
/// exact collection name.
pub fn resolve_selection(input: &str, names: &[&str]) -> Result<Vec<String>, Error> {
    let choice = input.trim();

    if choice.eq_ignore_ascii_case("all") {
        return Ok(names.iter().map(|n| n.to_string()).collect());
    }

    if let Ok(number) = choice.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|idx| names.get(idx))
            .map(|name| vec![name.to_string()])
            .ok_or_else(|| Error::InvalidSelection(f!("no collection number {}", number)));
    }

    names
        .iter()
        .find(|name| **name == choice)
        .map(|name| vec![name.to_string()])
        .ok_or_else(|| Error::InvalidSelection(f!("unknown collection '{}'", choice)))
}

fn prompt_selection(names: &[&str]) -> Result<String> {
    println!("\n{}", "=".repeat(40).bright_cyan());
    println!("{}", "   doclayout - Collection Runner".bright_cyan().bold());
    println!("{}", "=".repeat(40).bright_cyan());
    for (i, name) in names.iter().enumerate() {
        println!("{}. {}", i + 1, name);
    }

    anstream::print!("\nSelect Collection (Number or 'all'): ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn process_collection(
    name: &str,
    config: &RunConfig,
    ranker: &DocumentRanker,
    jobs: usize,
) -> Result<()> {
    let collection = config.collection(name)?;
    let input = Path::new(&collection.input_folder);
    if !input.is_dir() {
        return Err(eyre!(Error::MissingInput(collection.input_folder.clone())));
    }

    println!("\n{} {} {}", "---".bright_black(), name.bold(), "---".bright_black());
    println!("{}: {}", "Goal".green(), collection.job_to_be_done);

    let documents = find_documents(input)?;
    if documents.is_empty() {
        return Err(eyre!(Error::NoDocuments(collection.input_folder.clone())));
    }

    let params = RunParams {
        documents,
        persona: collection.persona.clone(),
        job_to_be_done: collection.job_to_be_done.clone(),
        query: collection.query().to_string(),
        top_k_matches: config.output.top_k_matches,
        top_k_output: config.output.top_k_output,
        jobs,
        heuristics: config.heuristics.clone(),
    };

    let spinner = new_spinner()?;
    let output = run_analysis(params, ranker, Some(&spinner)).await;
    spinner.finish_and_clear();
    let output = output?;

    let out_path = Path::new(&config.output.folder).join(results_file_name(name));
    write_report(&out_path, &output)?;

    println!(
        "{} Output with Top {} saved to:",
        "Success!".green().bold(),
        config.output.top_k_output
    );
    println!("{}", out_path.display());
    Ok(())
}
