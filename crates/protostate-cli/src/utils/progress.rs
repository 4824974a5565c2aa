use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use protostate::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Bar plus the titration bookkeeping needed to label it.
struct TitrationDisplay {
    bar: ProgressBar,
    phase: Option<&'static str>,
    points_done: u64,
}

impl TitrationDisplay {
    fn apply(&mut self, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                self.phase = Some(name);
                self.points_done = 0;
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.set_prefix(name);
                self.bar.set_message("");
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_length(total_steps);
                self.bar.set_style(grid_style());
            }
            Progress::EnvironmentEvaluated {
                ph,
                environment,
                total_protonation,
            } => {
                self.bar.set_message(format!(
                    "pH {:.2} {}: {:.2} H+",
                    ph, environment, total_protonation
                ));
            }
            Progress::PointComputed {
                ph,
                folding_free_energy,
            } => {
                self.points_done += 1;
                if let Some(dg) = folding_free_energy {
                    self.bar
                        .set_message(format!("pH {:.2} dG_fold {:+.2} kJ/mol", ph, dg));
                }
                self.bar.inc(1);
            }
            Progress::TaskFinish => {
                if let Some(length) = self.bar.length() {
                    self.bar.set_position(length);
                }
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let summary = match (self.phase.take(), self.points_done) {
                    (Some(phase), 0) => format!("✓ {}", phase),
                    (Some(phase), n) => format!("✓ {}: {} pH points", phase, n),
                    (None, _) => "✓ Done".to_string(),
                };
                self.bar.set_style(spinner_style());
                self.bar.finish_with_message(summary);
            }
            Progress::Message(msg) => {
                if self.bar.is_finished() {
                    self.bar.set_message(msg);
                } else {
                    self.bar.println(format!("  {}", msg));
                }
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
        .expect("spinner template is valid")
}

fn grid_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} pH points ({eta}) {msg}",
    )
    .expect("grid template is valid")
    .progress_chars("=> ")
}

/// Renders titration progress on stderr: a spinner per phase, a bar over the pH grid whose
/// message follows the environment being evaluated and the folding free energy.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<TitrationDisplay>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        bar.finish_and_clear();
        Self {
            display: Arc::new(Mutex::new(TitrationDisplay {
                bar,
                phase: None,
                points_done: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();
        Box::new(move |event: Progress| match display.lock() {
            Ok(mut display) => display.apply(event),
            Err(_) => warn!("Progress display mutex was poisoned; dropping event."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
