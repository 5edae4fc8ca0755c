pub mod aggregator;
pub mod converter;
pub mod dedup;
pub mod emitter;

pub mod errors {
    use georec_io::IoError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error(transparent)]
        Io(#[from] IoError),
        #[error("{count} lines could not be decoded (strict mode)")]
        SkippedLines { count: usize },
    }
}
