//! Batch orchestration shared by the `analyze` and `collections` commands.
//!
//! Each document is parsed and analyzed on the blocking pool, ranked, and
//! carved into sections. Documents run with bounded concurrency and a
//! failing document is recorded in the report without stopping the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;

use crate::embeddings::{EmbeddingClient, EmbeddingOptions};
use crate::prelude::{eprintln, *};
use doclayout_core::{
    analyze_pages, extract_sections, rank_candidates, AnalysisOutput, HeadingCandidate,
    HeuristicConfig, LexicalRanker, RankingError, Report, ScoredCandidate, Section, TextFragment,
};

/// Ranking backend selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RankerKind {
    /// Bag-of-words cosine similarity, fully offline
    #[default]
    Lexical,
    /// Cosine similarity of embeddings from an HTTP endpoint
    Embeddings,
}

pub enum DocumentRanker {
    Lexical(LexicalRanker),
    Embeddings(EmbeddingClient),
}

impl DocumentRanker {
    pub fn new(kind: RankerKind, options: &EmbeddingOptions) -> Self {
        match kind {
            RankerKind::Lexical => DocumentRanker::Lexical(LexicalRanker),
            RankerKind::Embeddings => DocumentRanker::Embeddings(EmbeddingClient::new(options)),
        }
    }

    pub async fn rank(
        &self,
        candidates: &[HeadingCandidate],
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredCandidate>, RankingError> {
        match self {
            DocumentRanker::Lexical(ranker) => rank_candidates(ranker, candidates, query, top_k),
            DocumentRanker::Embeddings(client) => {
                if candidates.is_empty() {
                    return Ok(Vec::new());
                }
                let texts: Vec<String> = candidates.iter().map(|c| c.text().to_string()).collect();
                let embeddings = client.precompute(&texts, query).await?;
                rank_candidates(&embeddings, candidates, query, top_k)
            }
        }
    }
}

/// Everything a batch run needs besides the ranker.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub documents: Vec<PathBuf>,
    pub persona: String,
    pub job_to_be_done: String,
    /// Ranking query; usually the job itself.
    pub query: String,
    pub top_k_matches: usize,
    pub top_k_output: usize,
    pub jobs: usize,
    pub heuristics: HeuristicConfig,
}

/// Extensions picked up from an input folder. `.json` files are fragment
/// dumps read by [`load_pages`].
const DOCUMENT_EXTENSIONS: [&str; 2] = ["pdf", "json"];

/// Documents directly inside `dir`, sorted by name.
pub fn find_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents: Vec<PathBuf> = std::fs::read_dir(dir)
        .wrap_err_with(|| f!("Failed to read input folder '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        DOCUMENT_EXTENSIONS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    })
        })
        .collect();
    documents.sort();
    Ok(documents)
}

pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load the pages of a PDF, or of a JSON fragment dump (`.json`).
pub fn load_pages(path: &Path) -> Result<Vec<Vec<TextFragment>>> {
    let is_dump = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_dump {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| f!("Failed to read '{}'", path.display()))?;
        return serde_json::from_str(&raw)
            .wrap_err_with(|| f!("Invalid fragment dump '{}'", path.display()));
    }

    pdf::extract_file(path).map_err(|e| eyre!(e))
}

/// Parse, analyze, rank and carve one document.
pub async fn process_document(
    path: PathBuf,
    ranker: &DocumentRanker,
    query: &str,
    top_k_matches: usize,
    heuristics: Arc<HeuristicConfig>,
) -> Result<Vec<Section>> {
    let name = document_name(&path);
    let blocking_config = Arc::clone(&heuristics);
    let (pages, analysis) = tokio::task::spawn_blocking(move || -> Result<_> {
        let pages = load_pages(&path)?;
        let analysis = analyze_pages(&pages, &blocking_config);
        Ok((pages, analysis))
    })
    .await??;

    log::info!(
        "{}: found {} structural candidates",
        name,
        analysis.candidates.len()
    );
    if analysis.candidates.is_empty() {
        return Ok(Vec::new());
    }

    let matches = ranker
        .rank(&analysis.candidates, query, top_k_matches)
        .await?;
    log::info!("{}: identified {} relevant sections", name, matches.len());

    Ok(extract_sections(&matches, &pages, &heuristics))
}

/// Run every document of a batch and aggregate the report.
pub async fn run_analysis(
    params: RunParams,
    ranker: &DocumentRanker,
    spinner: Option<&ProgressBar>,
) -> Result<AnalysisOutput> {
    let names: Vec<String> = params.documents.iter().map(|p| document_name(p)).collect();
    let heuristics = Arc::new(params.heuristics);
    let query = params.query.as_str();
    let top_k_matches = params.top_k_matches;

    let results: Vec<(String, Result<Vec<Section>>)> =
        stream::iter(params.documents.iter().cloned())
            .map(|path| {
                let heuristics = Arc::clone(&heuristics);
                async move {
                    let name = document_name(&path);
                    if let Some(s) = spinner {
                        s.set_message(f!("Scanning {}...", name));
                    }
                    let result =
                        process_document(path, ranker, query, top_k_matches, heuristics).await;
                    (name, result)
                }
            })
            .buffered(params.jobs.max(1))
            .collect()
            .await;

    let mut report = Report::new(
        names,
        params.persona.as_str(),
        params.job_to_be_done.as_str(),
        params.top_k_output,
    );

    for (name, result) in results {
        match result {
            Ok(sections) => {
                log::debug!("{}: {} sections", name, sections.len());
                for section in sections {
                    report.add_section(&name, section);
                }
            }
            Err(err) => {
                let message = f!("{:#}", err);
                log::warn!("{}: {}", name, message);
                if let Some(s) = spinner {
                    s.suspend(|| {
                        eprintln!("  {} {}: {}", "X".red().bold(), name, message);
                    });
                } else {
                    eprintln!("  {} {}: {}", "X".red().bold(), name, message);
                }
                report.add_failure(&name, message);
            }
        }
    }

    let timestamp = chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string();
    Ok(report.finish(timestamp))
}

/// Write the report as pretty JSON, creating the parent directory.
pub fn write_report(path: &Path, output: &AnalysisOutput) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| f!("Failed to create '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
    std::fs::write(path, json).wrap_err_with(|| f!("Failed to write '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclayout_core::{BBox, StyleFlags};

    fn fragment(text: &str, x0: f32, x1: f32, y: f32, size: f32, font: &str) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            font_name: font.to_string(),
            font_size: size,
            flags: StyleFlags::empty(),
            bbox: BBox::new(x0, y, x1, y + size),
            baseline: None,
            page_index: 0,
            page_width: 612.0,
        }
    }

    fn write_dump(dir: &Path, name: &str, headings: &[&str]) -> PathBuf {
        let mut page = Vec::new();
        let mut y = 60.0;
        for heading in headings {
            page.push(fragment(heading, 72.0, 260.0, y, 16.0, "Helvetica-Bold"));
            page.push(fragment(
                "details follow in this paragraph of body text.",
                72.0,
                500.0,
                y + 30.0,
                10.0,
                "Helvetica",
            ));
            y += 100.0;
        }
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(&vec![page]).unwrap()).unwrap();
        path
    }

    fn params(documents: Vec<PathBuf>) -> RunParams {
        RunParams {
            documents,
            persona: "Travel Planner".to_string(),
            job_to_be_done: "Find beaches and restaurants".to_string(),
            query: "beaches restaurants".to_string(),
            top_k_matches: 10,
            top_k_output: 3,
            jobs: 2,
            heuristics: HeuristicConfig::default(),
        }
    }

    #[test]
    fn test_find_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "dump.json"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<String> = find_documents(dir.path())
            .unwrap()
            .iter()
            .map(|p| document_name(p))
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "dump.json"]);
    }

    #[test]
    fn test_find_documents_missing_folder() {
        assert!(find_documents(Path::new("/nonexistent/doclayout/input")).is_err());
    }

    #[test]
    fn test_load_pages_from_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_dump(dir.path(), "guide.json", &["Beaches"]);
        let pages = load_pages(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0][0].text, "Beaches");
    }

    #[tokio::test]
    async fn test_run_analysis_aggregates_and_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let guide = write_dump(dir.path(), "guide.json", &["Beaches", "Museums", "Restaurants"]);
        let broken = dir.path().join("broken.pdf");
        std::fs::write(&broken, b"not a pdf").unwrap();

        let ranker = DocumentRanker::new(
            RankerKind::Lexical,
            &EmbeddingOptions {
                embeddings_url: String::new(),
                embeddings_model: String::new(),
                api_key: None,
            },
        );
        let output = run_analysis(params(vec![guide, broken]), &ranker, None)
            .await
            .unwrap();

        assert_eq!(
            output.metadata.input_documents,
            vec!["guide.json", "broken.pdf"]
        );
        assert_eq!(output.metadata.total_sections_found, 3);
        assert_eq!(output.metadata.top_k_selected, 3);
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].document, "broken.pdf");

        let top: Vec<&str> = output
            .extracted_sections
            .iter()
            .map(|s| s.section_title.as_str())
            .collect();
        assert_eq!(top.len(), 3);
        assert!(top[..2].contains(&"Beaches"));
        assert!(top[..2].contains(&"Restaurants"));
        assert_eq!(top[2], "Museums");
        assert_eq!(output.extracted_sections[0].importance_rank, 1);
    }

    #[test]
    fn test_write_report_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("report.json");
        let output = Report::new(vec![], "p", "j", 5).finish("now");
        write_report(&path, &output).unwrap();

        let written: AnalysisOutput =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, output);
    }
}
