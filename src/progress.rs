use harvest::{BatchObserver, BatchSummary, ItemReport};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over a scrape batch. Sized once the listing has been enumerated.
pub struct BatchProgress {
    enabled: bool,
    bar: Option<ProgressBar>,
    finished: bool,
}

impl BatchProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: None,
            finished: false,
        }
    }

    pub fn finish(&mut self, summary: &BatchSummary) {
        if std::mem::replace(&mut self.finished, true) {
            return;
        }

        if let Some(ref pb) = self.bar {
            pb.finish_with_message(format!(
                "✓ {} scraped, {} failed",
                summary.succeeded, summary.failed
            ));
        }
    }
}

impl BatchObserver for BatchProgress {
    fn started(&mut self, total: usize) {
        if !self.enabled {
            return;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cards ({eta}) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        self.bar = Some(pb);
    }

    fn item_finished(&mut self, report: &ItemReport<'_>) {
        if let Some(ref pb) = self.bar {
            let slug = report.url.rsplit('/').next().unwrap_or(report.url);
            pb.set_message(slug.to_string());
            pb.inc(1);
        }
    }
}

impl Drop for BatchProgress {
    fn drop(&mut self) {
        // A batch that errored out never reaches finish(); clear the bar instead of leaving it half drawn.
        if !self.finished {
            if let Some(ref pb) = self.bar {
                pb.finish_and_clear();
            }
        }
    }
}
