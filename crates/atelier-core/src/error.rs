use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("http status {status} from {url}")]
    Http { status: u16, url: String },
    #[error("storage error: {0}")]
    Storage(String),
}

/// Renders an error followed by every `source()` in its chain.
pub fn format_error_chain<E: std::error::Error + ?Sized>(error: &E) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();

    while let Some(err) = source {
        chain.push(format!("  caused by: {}", err));
        source = err.source();
    }

    chain.join("\n")
}

/// Logs `error` with its full chain at error level.
pub fn log_error<E: std::error::Error + ?Sized>(context: &str, error: &E) {
    let error_chain = format_error_chain(error);
    tracing::error!(context = context, error = %error_chain, "error occurred");
}
