use thiserror::Error;

#[derive(Error, Debug)]
pub enum WrangleError {
    /// A line or row that cannot be read as its source format at all
    #[error("Malformed {source_name} input at {at}: {message}")]
    Format {
        source_name: String,
        at: String,
        message: String,
    },

    /// A value that is present but not convertible to its target type
    #[error("Cannot parse {field} from {value:?}: {message}")]
    Parse {
        field: String,
        value: String,
        message: String,
    },

    #[error("Table {table} is missing expected column {column}")]
    Schema { table: String, column: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WrangleError {
    pub fn parse(field: &str, value: &str, message: impl Into<String>) -> Self {
        WrangleError::Parse {
            field: field.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    pub fn schema(table: &str, column: &str) -> Self {
        WrangleError::Schema {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WrangleError>;
