use std::sync::Mutex;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::events::{EngineEvent, EventKind, EventSink};
use crate::models::RemovalSummary;
use crate::pipeline::PipelineOutcome;

struct Progress {
    bar: ProgressBar,
    total: usize,
    position: usize,
}

/// Colored, line-oriented rendering of engine events.
pub struct TerminalSink {
    quiet: bool,
    progress: Mutex<Option<Progress>>,
}

impl TerminalSink {
    pub fn new(quiet: bool) -> Self {
        TerminalSink {
            quiet,
            progress: Mutex::new(None),
        }
    }

    fn line(&self, text: String) {
        if self.quiet {
            return;
        }
        println!("{}", text);
    }

    fn start_removal(&self, total: usize) {
        if !self.quiet {
            println!();
        }
        let bar = if self.quiet || total == 0 {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(total as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar
        };

        if let Ok(mut progress) = self.progress.lock() {
            *progress = Some(Progress {
                bar,
                total,
                position: 0,
            });
        }
    }

    /// Print one per-app outcome above the progress bar, advancing it.
    fn app_outcome(&self, event: &EngineEvent) {
        let app = event.app_id.unwrap_or_default();
        let Ok(mut guard) = self.progress.lock() else {
            return;
        };
        let Some(progress) = guard.as_mut() else {
            return;
        };

        progress.position += 1;
        let prefix = format!("[{}/{}]", progress.position, progress.total);

        let text = match event.kind {
            EventKind::AppRemoved => format!("{} APP REMOVED: {}", prefix, app).green(),
            EventKind::AppSkipped => {
                format!("{} APP SKIPPED: {} is covered by a paid license", prefix, app).yellow()
            }
            _ => format!(
                "{} APP FAILED: {} - {}",
                prefix,
                app,
                event.detail.as_deref().unwrap_or("unknown")
            )
            .red(),
        };

        // Failures are printed even in quiet mode.
        if !self.quiet || event.kind == EventKind::AppFailed {
            if progress.bar.is_hidden() {
                println!("{}", text);
            } else {
                progress.bar.println(text.to_string());
            }
        }
        progress.bar.inc(1);

        if progress.position >= progress.total {
            progress.bar.finish_and_clear();
        }
    }
}

impl EventSink for TerminalSink {
    fn emit(&self, event: EngineEvent) {
        let package = event.package_id.unwrap_or_default();
        let detail = event.detail.as_deref().unwrap_or_default();

        match &event.kind {
            EventKind::LicenseAdded {
                payment_method,
                license_type,
            } => println!(
                "{}",
                format!(
                    "LICENSE ADDED: PackageID {} (PaymentMethod: {}, LicenseType: {})",
                    package, payment_method, license_type
                )
                .green()
            ),
            EventKind::LicenseRemoved {
                payment_method,
                license_type,
            } => println!(
                "{}",
                format!(
                    "LICENSE REMOVED: PackageID {} (PaymentMethod: {}, LicenseType: {})",
                    package, payment_method, license_type
                )
                .red()
            ),
            EventKind::Inventory {
                total,
                complimentary,
            } => {
                self.line(format!("Total licenses: {}", total));
                self.line(format!("Complimentary licenses: {}", complimentary));
                self.line(format!(
                    "Non-complimentary licenses: {}",
                    total.saturating_sub(*complimentary)
                ));
                if *complimentary == 0 {
                    self.line("No complimentary licenses to remove.".to_string());
                } else {
                    self.line(String::new());
                    self.line("Fetching package info...".to_string());
                }
            }
            EventKind::ChunkFetched {
                index,
                requested,
                returned,
            } => self.line(format!(
                "  {} chunk {}: {} of {} packages returned",
                "→".cyan(),
                index + 1,
                returned,
                requested
            )),
            EventKind::AppProtected => self.line(format!(
                "AppID {} protected: {}",
                event.app_id.unwrap_or_default(),
                detail
            )),
            EventKind::PackageSkipped => {
                self.line(format!("PackageID {} skipped: {}", package, detail))
            }
            EventKind::Resolved {
                candidate_apps,
                protected_apps,
            } => {
                self.line(String::new());
                self.line(format!("Apps in complimentary packages: {}", candidate_apps));
                self.line(format!(
                    "Protected apps (covered by paid licenses): {}",
                    protected_apps
                ));
                self.line(String::new());
            }
            EventKind::Cancelled => println!("Operation cancelled."),
            EventKind::RemovalPlanned { total } => self.start_removal(*total),
            EventKind::AppRemoved | EventKind::AppSkipped | EventKind::AppFailed => {
                self.app_outcome(&event)
            }
        }
    }
}

/// Render the final outcome of a sweep.
pub fn render_outcome(outcome: &PipelineOutcome, quiet: bool) {
    match outcome {
        PipelineOutcome::NothingToRemove | PipelineOutcome::Cancelled => {}
        PipelineOutcome::Completed(summary) if quiet => {
            println!(
                "Removed: {}  Skipped: {}  Failed: {}",
                summary.removed.to_string().green(),
                summary.skipped.to_string().yellow(),
                summary.failed.to_string().red(),
            );
        }
        PipelineOutcome::Completed(summary) => render_summary_table(summary),
    }
}

fn render_summary_table(summary: &RemovalSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Outcome").add_attribute(Attribute::Bold),
            Cell::new("Apps").add_attribute(Attribute::Bold),
        ]);

    let rows = [
        ("✓ removed", summary.removed, Color::Green),
        ("⚠ skipped", summary.skipped, Color::Yellow),
        ("✗ failed", summary.failed, Color::Red),
    ];
    for (label, count, color) in rows {
        table.add_row(vec![
            Cell::new(label).fg(color),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("\n {}\n", "SUMMARY".bold());
    println!("{}", table);
    println!(" {}", summary);
}
