use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Fatal: without a catalog there is nothing to analyze.
    #[error("instrument catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("fetch failed for {instrument_id}: {cause}")]
    FetchFailed { instrument_id: String, cause: String },

    #[error("no data available for {0}")]
    NoDataAvailable(String),

    /// A provider page without a usable table. Local to that page only.
    #[error("malformed page {page} for {instrument_id}")]
    MalformedPage { instrument_id: String, page: u32 },

    #[error("failed to build the HTTP client: {0}")]
    ClientBuild(String),

    #[error("indicator setup failed: {0}")]
    Indicator(String),

    #[error("worker for {instrument_id} did not complete: {cause}")]
    WorkerAborted { instrument_id: String, cause: String },
}

pub type Result<T> = std::result::Result<T, Error>;
