//! Progress reporting for batch builds
//!
//! Workers send [`ProgressMessage`]s over a crossbeam channel; a reporter
//! thread advances the bar and tallies the outcome until every sender is
//! dropped.

use crate::ui::{theme, Icons};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Built {
        file: String,
        nodes: usize,
        edges: usize,
    },
    Failed {
        file: String,
        error: String,
    },
}

/// Totals of a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub built: usize,
    pub nodes: usize,
    pub edges: usize,
    /// `(file, error)` per failed file
    pub failures: Vec<(String, String)>,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} files, {} nodes, {} edges", self.built, self.nodes, self.edges)
    }
}

#[derive(Default)]
struct Tally {
    built: AtomicUsize,
    nodes: AtomicUsize,
    edges: AtomicUsize,
    failures: Mutex<Vec<(String, String)>>,
}

pub struct BatchProgress {
    bar: ProgressBar,
    tally: Arc<Tally>,
    handle: thread::JoinHandle<()>,
}

impl BatchProgress {
    pub fn new(total_files: usize) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let bar = if console::Term::stdout().is_term() {
            let bar = ProgressBar::new(total_files as u64).with_message("Building graphs");
            if let Ok(style) =
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
            {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let tally = Arc::new(Tally::default());
        let bar_clone = bar.clone();
        let tally_clone = Arc::clone(&tally);

        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Built { file, nodes, edges } => {
                        tally_clone.built.fetch_add(1, Ordering::Relaxed);
                        tally_clone.nodes.fetch_add(nodes, Ordering::Relaxed);
                        tally_clone.edges.fetch_add(edges, Ordering::Relaxed);
                        bar_clone.set_message(file);
                    }
                    ProgressMessage::Failed { file, error } => {
                        if let Ok(mut failures) = tally_clone.failures.lock() {
                            failures.push((file, error));
                        }
                    }
                }
                bar_clone.inc(1);
            }
        });

        (Self { bar, tally, handle }, tx)
    }

    /// Wait for all senders to hang up and print the totals
    pub fn finish(self, duration: Duration) -> BatchSummary {
        if self.handle.join().is_err() {
            tracing::warn!("progress reporter thread panicked");
        }
        self.bar.finish_and_clear();

        let summary = BatchSummary {
            built: self.tally.built.load(Ordering::Relaxed),
            nodes: self.tally.nodes.load(Ordering::Relaxed),
            edges: self.tally.edges.load(Ordering::Relaxed),
            failures: self
                .tally
                .failures
                .lock()
                .map(|f| f.clone())
                .unwrap_or_default(),
        };

        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!("  {}", summary.to_string().style(theme().info.clone()));
        summary
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stderr().is_term() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_tallies_messages() {
        let (progress, tx) = BatchProgress::new(3);
        let workers: Vec<_> = (0..3)
            .map(|i| {
                let tx = tx.clone();
                thread::spawn(move || {
                    let msg = if i == 2 {
                        ProgressMessage::Failed {
                            file: "bad.py".to_string(),
                            error: "parse error".to_string(),
                        }
                    } else {
                        ProgressMessage::Built {
                            file: format!("ok{}.py", i),
                            nodes: 10,
                            edges: 5,
                        }
                    };
                    tx.send(msg).unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        drop(tx);

        let summary = progress.finish(Duration::from_millis(5));
        assert_eq!(summary.built, 2);
        assert_eq!(summary.nodes, 20);
        assert_eq!(summary.edges, 10);
        assert_eq!(summary.failures, vec![("bad.py".to_string(), "parse error".to_string())]);
        assert_eq!(summary.to_string(), "2 files, 20 nodes, 10 edges");
    }
}
