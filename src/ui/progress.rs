//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::scheduler::SchedulerEvent;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.is_interactive(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

#[derive(Clone)]
enum Display {
    Bar(ProgressBar),
    Lines,
    Hidden,
}

/// Counts finished builds against the total.
///
/// Draws an indicatif bar in interactive mode and one line per event
/// otherwise. Cheap to clone so a copy can live inside a scheduler observer.
#[derive(Clone)]
pub struct BuildProgress {
    display: Display,
}

impl BuildProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        if !ctx.is_interactive() {
            return Self {
                display: Display::Lines,
            };
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(template) = ProgressStyle::default_bar()
            .template("  {spinner:.cyan} Building  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
        {
            bar.set_style(
                template
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .progress_chars("━╸─"),
            );
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self {
            display: Display::Bar(bar),
        }
    }

    /// Progress that prints nothing, for machine-readable output
    pub fn hidden() -> Self {
        Self {
            display: Display::Hidden,
        }
    }

    pub fn on_event(&self, event: SchedulerEvent<'_>) {
        match (&self.display, event) {
            (Display::Hidden, _) => {}
            (Display::Bar(bar), SchedulerEvent::Launched(id)) => {
                bar.set_message(id.name().to_string());
            }
            (Display::Bar(bar), SchedulerEvent::Finished(record)) => {
                bar.inc(1);
                if !record.is_success() {
                    bar.println(format!(
                        "  {} {}",
                        style("✗").red(),
                        record.build_config.name()
                    ));
                }
            }
            (Display::Lines, SchedulerEvent::Launched(id)) => {
                println!("  {} {}", style("[START]").cyan(), id.short_name());
            }
            (Display::Lines, SchedulerEvent::Finished(record)) => {
                let tag = if record.is_success() {
                    style("[DONE]").green()
                } else {
                    style("[FAIL]").red()
                };
                println!("  {} {}", tag, record.build_config.short_name());
            }
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Display::Bar(bar) = &self.display {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::BuildStatus;
    use crate::resource::ResourceIdentity;
    use crate::scheduler::BuildRecord;
    use chrono::Utc;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Testing...");
        spinner.stop("Done");
    }

    #[test]
    fn build_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = BuildProgress::new(&ctx, 1);
        let bc = ResourceIdentity::new("tools", "bc", "app");
        let record = BuildRecord {
            build_config: bc.clone(),
            build: None,
            outcome: BuildStatus::Complete,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };
        progress.on_event(SchedulerEvent::Launched(&bc));
        progress.on_event(SchedulerEvent::Finished(&record));
        progress.finish();
        BuildProgress::hidden().on_event(SchedulerEvent::Launched(&bc));
    }
}
