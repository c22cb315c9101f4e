use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
}
