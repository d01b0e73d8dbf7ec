use thiserror::Error;

#[derive(Debug, Error)]
pub enum HtmlError {
    #[error("data marker `{var} = ` not found in page")]
    MarkerNotFound { var: String },

    #[error("data blob `{var}` is not valid JSON: {source}")]
    MalformedBlob {
        var: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid data variable name `{0}`")]
    InvalidVarName(String),

    #[error("failed to serialize embedded data: {0}")]
    Serialize(#[from] serde_json::Error),
}
