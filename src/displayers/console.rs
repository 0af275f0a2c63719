//! Console displayer: prints one panel per sensor kind
//!
//! Reads store snapshots on its own cadence; it never touches the sampler.

use log::debug;
use sens_capture_core::{SensorKind, SensorRegistry, SeriesView, StoreReader};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Renders the latest samples of every sensor as text panels
#[derive(Clone)]
pub struct ConsoleDisplayer {
    registry: Arc<SensorRegistry>,
    store: StoreReader,
}

impl ConsoleDisplayer {
    pub fn new(registry: Arc<SensorRegistry>, store: StoreReader) -> Self {
        Self { registry, store }
    }

    /// Latest value of every sensor, grouped into one panel per kind
    pub fn render(&self) -> String {
        let views = self.store.views(&self.registry);
        let mut out = String::new();

        for kind in SensorKind::ALL {
            let _ = writeln!(out, "{}", kind.panel_title());
            let mut any = false;
            for view in views.iter().filter(|v| v.descriptor.kind() == kind) {
                any = true;
                let value = view
                    .last()
                    .map(|v| format_value(kind, v))
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    out,
                    "  {:<36} {:>14}  [{} samples]",
                    view.descriptor.caption(),
                    value,
                    view.samples.len()
                );
            }
            if !any {
                let _ = writeln!(out, "  (no sensors)");
            }
        }

        out
    }

    /// Min, max and last value of every series
    pub fn summary(&self) -> String {
        let views = self.store.views(&self.registry);
        let mut out = String::new();

        for kind in SensorKind::ALL {
            let of_kind: Vec<&SeriesView> =
                views.iter().filter(|v| v.descriptor.kind() == kind).collect();
            if of_kind.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}", kind.panel_title());
            for view in of_kind {
                match (view.range(), view.last()) {
                    (Some((min, max)), Some(last)) => {
                        let _ = writeln!(
                            out,
                            "  {:<36} min {:>12}  max {:>12}  last {:>12}  ({} samples)",
                            view.descriptor.caption(),
                            format_value(kind, min),
                            format_value(kind, max),
                            format_value(kind, last),
                            view.samples.len()
                        );
                    }
                    _ => {
                        let _ = writeln!(out, "  {:<36} no samples", view.descriptor.caption());
                    }
                }
            }
        }

        out
    }

    /// Print [`ConsoleDisplayer::render`] every `interval` until `shutdown`
    /// becomes `true` or its sender is dropped
    pub async fn run(self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately, before anything has been sampled
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => println!("{}", self.render()),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Console displayer stopped");
                        break;
                    }
                }
            }
        }
    }
}

fn format_value(kind: SensorKind, value: f64) -> String {
    match kind {
        SensorKind::CpuFrequency => format!("{:.0}", value),
        SensorKind::Thermal | SensorKind::Regulator => format!("{:.3}", value),
    }
}
