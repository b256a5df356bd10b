use crate::config::{BrowserConfig, TourConfig};
use crate::page::PageDocument;
use crate::{Error, Result};
use eoka::{Browser, Page};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast::{self, error::RecvError};
use tourguide::{Playback, PlaybackEngine, Tour, TourController, TourEvent, TourEventKind};
use tracing::{debug, info, warn};

/// Result of playing a tour.
#[derive(Debug)]
pub struct RunResult {
    /// Every step became ready and the tour completed.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Number of steps that were displayed.
    pub steps_shown: usize,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Plays tour files against a browser page, advancing as soon as each step is shown.
pub struct Runner {
    browser: Browser,
    page: Arc<Page>,
}

impl Runner {
    /// Launch a browser for running tours.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page: Arc::new(page),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Open the tour's target page and play every step.
    pub async fn run(&mut self, config: &TourConfig) -> Result<RunResult> {
        let start = Instant::now();
        info!("Navigating to: {}", config.target.url);
        self.page.goto(&config.target.url).await?;

        let document = Arc::new(PageDocument::new(self.page.clone()));
        let mut tours = TourController::new(PlaybackEngine::new(), document);
        let mut events = tours.engine().subscribe();

        tours.start(config.steps.iter().cloned(), &config.options);
        let Some(tour) = tours.session().cloned() else {
            return Err(Error::Config("tour did not start".into()));
        };

        let outcome = follow(&tour, &mut events).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(steps_shown) => {
                info!("Tour '{}' completed ({} steps)", config.name, steps_shown);
                Ok(RunResult {
                    success: true,
                    error: None,
                    steps_shown,
                    duration_ms,
                })
            }
            Err((steps_shown, e)) => {
                warn!("Tour '{}' failed: {}", config.name, e);
                tours.cancel();
                self.handle_failure(config).await;
                Ok(RunResult {
                    success: false,
                    error: Some(e.to_string()),
                    steps_shown,
                    duration_ms,
                })
            }
        }
    }

    async fn handle_failure(&self, config: &TourConfig) {
        let Some(path) = config
            .on_failure
            .as_ref()
            .and_then(|f| f.screenshot.as_ref())
        else {
            return;
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = path.replace("{timestamp}", &timestamp.to_string());
        info!("Saving failure screenshot to: {}", path);
        match self.page.screenshot().await {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    warn!("Failed to save screenshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to take screenshot: {}", e),
        }
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

/// Advance `tour` after every shown step until it completes.
///
/// Returns the number of steps shown, or that count with the error that ended the run.
async fn follow(
    tour: &Playback,
    events: &mut broadcast::Receiver<TourEvent>,
) -> std::result::Result<usize, (usize, Error)> {
    let mut shown = 0;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(n)) => {
                warn!("missed {} tour events", n);
                continue;
            }
            Err(RecvError::Closed) => {
                return Err((shown, Error::StepFailed("tour engine went away".into())));
            }
        };
        if event.tour != tour.id() {
            continue;
        }

        match event.kind {
            TourEventKind::Shown { index, step_id } => {
                shown += 1;
                info!(
                    "Step {}/{} ready: {}",
                    index + 1,
                    tour.len(),
                    step_id.as_deref().unwrap_or("-")
                );
                tour.next();
            }
            TourEventKind::Completed => return Ok(shown),
            TourEventKind::StepFailed { index, error } => {
                let label = tour
                    .step(index)
                    .and_then(|s| s.id.clone())
                    .unwrap_or_else(|| format!("#{}", index + 1));
                return Err((shown, Error::StepFailed(format!("step {}: {}", label, error))));
            }
            TourEventKind::Cancelled => {
                return Err((shown, Error::StepFailed("tour was cancelled".into())));
            }
        }
    }
}
