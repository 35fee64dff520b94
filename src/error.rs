use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    Args(#[from] pico_args::Error),

    #[error("invalid configuration document: {0}")]
    ConfigDocument(#[from] serde_json::Error),

    #[error("cannot read trace {path:?}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot allocate 2^{set_bits} sets of {ways} lines")]
    ResourceExhausted { set_bits: u32, ways: usize },

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("cannot write stats to {path:?}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
