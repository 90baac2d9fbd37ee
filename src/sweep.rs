// SPDX-License-Identifier: MIT
//!
//! Per-cell translation of a table into several languages
//!

use crate::error::{Error, Result};
use crate::language::{LanguageTable, LanguageTarget};
use crate::provider::Translate;
use crate::table::{self, Cell, Table};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Pause after every provider call
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

/// Source table, accepted languages and where results go
#[derive(Debug)]
pub struct TranslationJob {
    pub input: PathBuf,
    pub table: Table,
    pub targets: Vec<LanguageTarget>,
    pub output_dir: PathBuf,
}

impl TranslationJob {
    /// Resolve languages and load the input table
    ///
    /// Output goes next to the input unless `output_dir` is given.
    pub fn prepare<P: AsRef<Path>, S: AsRef<str>>(
        input: P,
        languages: &[S],
        output_dir: Option<&Path>,
        language_table: &LanguageTable,
    ) -> Result<Self> {
        let input = input.as_ref();
        let targets = language_table.resolve(languages).targets;
        if targets.is_empty() {
            return Err(Error::NoValidLanguages);
        }

        let table = Table::read(input)?;
        log::info!(
            "Read {:?}: {} columns, {} rows",
            input,
            table.column_count(),
            table.row_count()
        );

        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => match input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };

        Ok(Self {
            input: input.to_path_buf(),
            table,
            targets,
            output_dir,
        })
    }

    pub fn output_path(&self, target: &LanguageTarget) -> PathBuf {
        table::output_path(&self.input, &self.output_dir, target.code)
    }
}

/// Progress of a running job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressState {
    /// Index of the language being translated, equals completed languages
    pub language: usize,
    pub languages: usize,
    /// Cells translated so far in the current language
    pub translated: usize,
    /// Translatable cells in the current language
    pub total: usize,
}

impl ProgressState {
    pub fn language_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.translated as f64 / self.total as f64
        }
    }

    pub fn overall_fraction(&self) -> f64 {
        if self.languages == 0 {
            1.0
        } else {
            ((self.language as f64 + self.language_fraction()) / self.languages as f64).min(1.0)
        }
    }
}

/// Update sent to the front end
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    Status(String),
    Advance(ProgressState),
}

/// Outcome for one target language
#[derive(Debug)]
pub struct LanguageReport {
    pub target: LanguageTarget,
    pub translated: usize,
    pub failed: usize,
    /// Written file
    pub output: Result<PathBuf>,
}

#[derive(Debug, Default)]
pub struct JobReport {
    pub languages: Vec<LanguageReport>,
    /// Stop was requested before every language finished
    pub stopped: bool,
}

impl JobReport {
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.languages
            .iter()
            .filter_map(|l| l.output.as_ref().ok().map(PathBuf::as_path))
    }

    pub fn failed_languages(&self) -> usize {
        self.languages.iter().filter(|l| l.output.is_err()).count()
    }
}

/// Translates every text cell of a job, one language after another
pub struct TranslationSweep<'a, P: Translate + ?Sized> {
    provider: &'a P,
    delay: Duration,
    progress: Option<UnboundedSender<Progress>>,
    stop: Option<Arc<AtomicBool>>,
}

impl<'a, P: Translate + ?Sized> TranslationSweep<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            delay: DEFAULT_DELAY,
            progress: None,
            stop: None,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Channel receiving status lines and progress
    pub fn progress(mut self, tx: UnboundedSender<Progress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Flag checked between cells
    pub fn stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn send(&self, progress: Progress) {
        if let Some(tx) = &self.progress {
            // receiver may be gone, updates are best effort
            let _ = tx.send(progress);
        }
    }

    fn status(&self, message: String) {
        log::info!("{}", message);
        self.send(Progress::Status(message));
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map_or(false, |stop| stop.load(Ordering::Relaxed))
    }

    /// Run the job, one output file per target
    ///
    /// Only a missing language set or an uncreatable output directory fails
    /// the whole job; everything else is recorded in the report.
    pub async fn run(&self, job: &TranslationJob) -> Result<JobReport> {
        if job.targets.is_empty() {
            return Err(Error::NoValidLanguages);
        }
        if !job.output_dir.is_dir() {
            log::debug!("Create output directory {:?}", job.output_dir);
            std::fs::create_dir_all(&job.output_dir).map_err(|source| Error::OutputDir {
                path: job.output_dir.clone(),
                source,
            })?;
        }

        let columns = job.table.translatable_columns();
        let total = count_cells(&job.table, &columns);
        let languages = job.targets.len();
        let mut report = JobReport::default();

        for (index, target) in job.targets.iter().enumerate() {
            if self.stop_requested() {
                report.stopped = true;
                break;
            }
            self.status(format!("Translating to {}...", target));

            let mut state = ProgressState {
                language: index,
                languages,
                translated: 0,
                total,
            };
            self.send(Progress::Advance(state));

            let mut translated = job.table.clone();
            let mut failed = 0;
            if columns.is_empty() {
                log::info!("No text column, nothing to translate for {}", target.code);
            }

            'columns: for &col in &columns {
                self.status(format!(
                    "  Translating column: {}",
                    job.table.columns()[col].name()
                ));

                for (row, cell) in job.table.columns()[col].cells().iter().enumerate() {
                    let Some(text) = cell.translatable_text() else {
                        continue;
                    };
                    if self.stop_requested() {
                        report.stopped = true;
                        break 'columns;
                    }

                    match self.provider.translate(text, None, target.code).await {
                        Ok(result) => {
                            translated.set_cell(row, col, Cell::Text(result));
                            state.translated += 1;
                            self.send(Progress::Advance(state));
                        }
                        Err(err) => {
                            failed += 1;
                            log::error!("Error translating {:?} to {}: {}", text, target.code, err);
                            self.send(Progress::Status(format!(
                                "    Error translating '{}': {}",
                                text, err
                            )));
                        }
                    }

                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }

            if report.stopped {
                self.status(format!("Stopped, {} NOT saved", target.code));
                break;
            }

            let path = job.output_path(target);
            let output = match translated.write_over(&job.input, &path) {
                Ok(()) => {
                    self.status(format!("Saved translated file: {}", path.display()));
                    Ok(path)
                }
                Err(err) => {
                    log::error!("Can not save {:?} : {}", path, err);
                    self.send(Progress::Status(format!(
                        "Error saving {}: {}",
                        path.display(),
                        err
                    )));
                    Err(err)
                }
            };

            report.languages.push(LanguageReport {
                target: *target,
                translated: state.translated,
                failed,
                output,
            });
            self.send(Progress::Advance(ProgressState {
                language: index + 1,
                languages,
                translated: 0,
                total: 0,
            }));
        }

        Ok(report)
    }
}

/// Non-blank text cells in the given columns
fn count_cells(table: &Table, columns: &[usize]) -> usize {
    columns
        .iter()
        .map(|&col| {
            table.columns()[col]
                .cells()
                .iter()
                .filter(|c| c.translatable_text().is_some())
                .count()
        })
        .sum()
}
