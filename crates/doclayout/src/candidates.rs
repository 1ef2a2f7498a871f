use std::path::PathBuf;

use colored::Colorize;
use doclayout_core::config::RunConfig;
use doclayout_core::{
    analyze_pages, DocumentAnalysis, DocumentBaseline, HeadingReason, HeuristicConfig,
};
use serde::Serialize;

use crate::pipeline::{document_name, load_pages};
use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct CandidatesOptions {
    /// PDF file, or JSON fragment dump
    pub path: PathBuf,

    /// Take heuristic settings from a run configuration
    #[arg(short, long, env = "DOCLAYOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct CandidateRow {
    pub text: String,
    pub page_number: usize,
    pub y: f32,
    pub font_size: f32,
    pub font_name: String,
    pub reasons: Vec<HeadingReason>,
}

#[derive(Debug, Serialize)]
pub struct CandidatesOutput {
    pub document: String,
    pub line_count: usize,
    pub baseline: DocumentBaseline,
    pub candidates: Vec<CandidateRow>,
}

pub fn candidates_output(document: String, analysis: &DocumentAnalysis) -> CandidatesOutput {
    CandidatesOutput {
        document,
        line_count: analysis.lines.len(),
        baseline: analysis.baseline,
        candidates: analysis
            .candidates
            .iter()
            .map(|c| CandidateRow {
                text: c.text().to_string(),
                page_number: c.page_index() + 1,
                y: c.y(),
                font_size: c.line.font_size,
                font_name: c.line.fragment.font_name.clone(),
                reasons: c.reasons.clone(),
            })
            .collect(),
    }
}

pub async fn run(options: CandidatesOptions, global: crate::Global) -> Result<()> {
    let heuristics = match &options.config {
        Some(path) => RunConfig::load(path)?.heuristics,
        None => HeuristicConfig::default(),
    };
    if global.verbose {
        println!("{}: {:?}", "Heuristics".green(), heuristics);
    }

    let path = options.path.clone();
    let analysis = tokio::task::spawn_blocking(move || -> Result<_> {
        let pages = load_pages(&path)?;
        Ok(analyze_pages(&pages, &heuristics))
    })
    .await??;

    let output = candidates_output(document_name(&options.path), &analysis);

    if options.json {
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    print_table(&output);
    Ok(())
}

fn print_table(output: &CandidatesOutput) {
    println!(
        "\n{} {}",
        output.document.bright_cyan().bold(),
        f!(
            "({} lines, median font size {:.1}, width threshold {:.1})",
            output.line_count,
            output.baseline.median_font_size,
            output.baseline.width_threshold
        )
        .bright_black()
    );

    if output.candidates.is_empty() {
        println!("{}", "No heading candidates.".yellow());
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![b => "Page", "Y", "Size", "Reasons", "Text"]);
    for row in &output.candidates {
        let reasons: Vec<String> = row.reasons.iter().map(ToString::to_string).collect();
        table.add_row(prettytable::row![
            row.page_number,
            f!("{:.1}", row.y),
            f!("{:.1}", row.font_size),
            reasons.join(", "),
            row.text
        ]);
    }
    table.printstd();
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclayout_core::{BBox, StyleFlags, TextFragment};

    #[test]
    fn test_candidates_output_rows() {
        let pages = vec![
            vec![],
            vec![
                TextFragment {
                    text: "SUMMARY".to_string(),
                    font_name: "Arial-Bold".to_string(),
                    font_size: 18.0,
                    flags: StyleFlags::BOLD,
                    bbox: BBox::new(72.0, 50.0, 160.0, 68.0),
                    baseline: None,
                    page_index: 1,
                    page_width: 612.0,
                },
                TextFragment {
                    text: "body copy that runs across most of the page width here.".to_string(),
                    font_name: "Arial".to_string(),
                    font_size: 10.0,
                    flags: StyleFlags::empty(),
                    bbox: BBox::new(72.0, 90.0, 500.0, 100.0),
                    baseline: None,
                    page_index: 1,
                    page_width: 612.0,
                },
            ],
        ];
        let analysis = analyze_pages(&pages, &HeuristicConfig::default());
        let output = candidates_output("report.pdf".to_string(), &analysis);

        assert_eq!(output.line_count, 2);
        assert_eq!(output.candidates.len(), 1);
        let row = &output.candidates[0];
        assert_eq!(row.text, "SUMMARY");
        assert_eq!(row.page_number, 2);
        assert_eq!(row.font_name, "Arial-Bold");
        assert!(row.reasons.contains(&HeadingReason::Uppercase));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["candidates"][0]["reasons"][0], "Larger font");
    }
}
