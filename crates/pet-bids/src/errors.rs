use thiserror::Error;

#[derive(Debug, Error)]
pub enum BidsError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid tsv in {path}: {source}")]
    Tsv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("sidecar for {image} carries no usable `{keyword}` frame timing")]
    MissingFrameTiming { image: String, keyword: String },
}
