/// Receives crawl progress as a fraction in `[0.0, 1.0]`
///
/// Only the top-level call of a crawl reports progress; recursive sub-crawls
/// never see a sink. Within one crawl the reported values do not decrease,
/// except for a reset to `0.0` when a page fails.
pub trait ProgressSink: Send + Sync {
    fn report(&self, fraction: f32);
}

impl<F> ProgressSink for F
where
    F: Fn(f32) + Send + Sync,
{
    fn report(&self, fraction: f32) {
        self(fraction)
    }
}

/// Progress sink that writes each update to the log
#[derive(Debug, Clone)]
pub struct LogProgress {
    label: String,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressSink for LogProgress {
    fn report(&self, fraction: f32) {
        tracing::info!("{}: {:.0}%", self.label, fraction * 100.0);
    }
}
