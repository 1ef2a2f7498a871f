//! Cross-document aggregation of ranked sections into the final report.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::Section;

/// A section tagged with the document it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub document: String,
    pub heading: String,
    pub score: f32,
    pub content: String,
    pub page_number: usize,
}

/// A document that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
    pub total_sections_found: usize,
    pub top_k_selected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: usize,
}

/// Serialized shape of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub metadata: ReportMetadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DocumentFailure>,
}

/// Collects sections from every document of a run.
#[derive(Debug, Clone)]
pub struct Report {
    input_documents: Vec<String>,
    persona: String,
    job_to_be_done: String,
    top_k: usize,
    sections: Vec<SectionRecord>,
    failures: Vec<DocumentFailure>,
}

impl Report {
    pub fn new(
        input_documents: Vec<String>,
        persona: impl Into<String>,
        job_to_be_done: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            input_documents,
            persona: persona.into(),
            job_to_be_done: job_to_be_done.into(),
            top_k,
            sections: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn add_section(&mut self, document: &str, section: Section) {
        self.sections.push(SectionRecord {
            document: document.to_string(),
            heading: section.heading,
            score: section.score,
            content: section.content,
            page_number: section.page_number,
        });
    }

    pub fn add_failure(&mut self, document: &str, error: impl ToString) {
        self.failures.push(DocumentFailure {
            document: document.to_string(),
            error: error.to_string(),
        });
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn failures(&self) -> &[DocumentFailure] {
        &self.failures
    }

    /// Sort every section by descending score (stable), keep the top K and
    /// shape the output records. Ranks are 1-based.
    pub fn finish(self, processing_timestamp: impl Into<String>) -> AnalysisOutput {
        let total = self.sections.len();

        let mut sorted = self.sections;
        sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        sorted.truncate(self.top_k);

        let extracted_sections = sorted
            .iter()
            .enumerate()
            .map(|(i, s)| ExtractedSection {
                document: s.document.clone(),
                section_title: s.heading.clone(),
                importance_rank: i + 1,
                page_number: s.page_number,
            })
            .collect();

        let subsection_analysis = sorted
            .iter()
            .map(|s| SubsectionAnalysis {
                document: s.document.clone(),
                refined_text: s.content.clone(),
                page_number: s.page_number,
            })
            .collect();

        AnalysisOutput {
            metadata: ReportMetadata {
                input_documents: self.input_documents,
                persona: self.persona,
                job_to_be_done: self.job_to_be_done,
                processing_timestamp: processing_timestamp.into(),
                total_sections_found: total,
                top_k_selected: sorted.len(),
            },
            extracted_sections,
            subsection_analysis,
            failures: self.failures,
        }
    }
}
