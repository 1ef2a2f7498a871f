#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("No documents found in '{0}'")]
    NoDocuments(String),

    #[error("Input folder '{0}' does not exist")]
    MissingInput(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}
