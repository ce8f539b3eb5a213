use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Neither the per-run nor the averaged column set is present.
    #[error("CSV must have either columns (Run & TimeSec) or AverageTimeSec, found [{}]", found.join(", "))]
    Schema { found: Vec<String> },

    #[error("CSV is missing required column {0}")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid value {value:?} in column {column}")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("no measurements to plot")]
    NoData,

    #[error("failed to render plot: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, PlotError>;
