//! # tourguide-runner
//!
//! Tour files in YAML, played step by step against a real browser page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tourguide_runner::{Runner, TourConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> tourguide_runner::Result<()> {
//! let config = TourConfig::load("onboarding.yaml")?;
//! let mut runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config).await?;
//! println!("Success: {}", result.success);
//! # Ok(())
//! # }
//! ```

mod config;
mod page;
mod runner;

pub use config::{BrowserConfig, OnFailure, ParamDef, Params, TargetUrl, TourConfig, Viewport};
pub use page::PageDocument;
pub use runner::{RunResult, Runner};

/// Result type for tourguide-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or playing a tour file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("tour error: {0}")]
    Tour(#[from] tourguide::Error),

    #[error("step failed: {0}")]
    StepFailed(String),
}
