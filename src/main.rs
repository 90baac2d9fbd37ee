use clap::{CommandFactory, Parser};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use xlsx_translate::{
    DeeplProvider, Error, JobReport, LanguageTable, Progress, ProgressState, Translate,
    TranslationJob, TranslationSweep, DEFAULT_DELAY,
};

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Translate text cells of a spreadsheet (.xlsx or .csv)
    Translate {
        /// Target languages, code or name (es, Spanish, spain, ...)
        #[arg(short, long, value_delimiter = ',', default_values = ["fr", "es", "de"])]
        languages: Vec<String>,
        /// Output directory, defaults to the input file directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Pause between two translation requests
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
        /// Input spreadsheet
        input: PathBuf,
    },
    /// List supported languages
    Languages,
    /// Translate single text
    Text {
        /// Target language, code or name
        #[arg(short, long)]
        to: Option<String>,
        /// Text to translate, asked on stdin if omitted
        text: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    // parse commandline
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> xlsx_translate::Result<ExitCode> {
    let language_table = LanguageTable::default();

    match cli.command {
        Some(Commands::Translate {
            languages,
            output,
            delay_ms,
            input,
        }) => {
            println!("Reading spreadsheet: {}", input.display());
            let job =
                TranslationJob::prepare(&input, &languages, output.as_deref(), &language_table)?;
            let provider = load_provider(cli.config.as_deref())?;
            let delay = request_delay(delay_ms, provider.configured_delay());

            let report = translate_job(job, provider, delay).await?;
            Ok(print_summary(&report))
        }
        Some(Commands::Languages) => {
            // Print alias table
            for lang in language_table.languages() {
                println!(
                    "{:<6} {:<22} {}",
                    lang.code,
                    lang.name,
                    lang.aliases.join(", ")
                );
            }
            println!("\nNote: 'uk' is Ukrainian. Use 'en' or 'british' for English.");
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Text { to, text }) => {
            let text = match text {
                Some(text) => text,
                None => prompt("Enter the text to translate: ")?,
            };
            let to = match to {
                Some(to) => to,
                None => prompt("Enter the target language (e.g. 'es' or 'Spanish'): ")?,
            };
            let target = language_table.lookup(&to).ok_or(Error::NoValidLanguages)?;
            let provider = load_provider(cli.config.as_deref())?;

            println!("\nTranslating...");
            match provider.translate(&text, None, target.code).await {
                Ok(translated) => {
                    println!("\nOriginal: {}", text);
                    println!("Translated ({}): {}", target.code, translated);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    println!("Error: {}", err);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        None => {
            // Print help
            Cli::command().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_provider(config: Option<&Path>) -> xlsx_translate::Result<DeeplProvider> {
    if let Some(cfg_file) = config {
        DeeplProvider::from_config_file(cfg_file)
    } else {
        DeeplProvider::from_default_config()
    }
}

/// Pause between requests: command line, then config file, then default
fn request_delay(delay_ms: Option<u64>, configured: Option<Duration>) -> Duration {
    delay_ms
        .map(Duration::from_millis)
        .or(configured)
        .unwrap_or(DEFAULT_DELAY)
}

/// Run the sweep on a worker task, print progress from here
async fn translate_job(
    job: TranslationJob,
    provider: DeeplProvider,
    delay: Duration,
) -> xlsx_translate::Result<JobReport> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let stop = Arc::new(AtomicBool::new(false));

    // Ctrl-C lets the current cell finish, then stops
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, stopping after current cell");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let worker = tokio::spawn(async move {
        TranslationSweep::new(&provider)
            .delay(delay)
            .progress(tx)
            .stop_flag(stop)
            .run(&job)
            .await
    });

    let mut printer = ProgressPrinter::default();
    while let Some(progress) = rx.recv().await {
        printer.show(&progress);
    }
    printer.finish();

    worker.await?
}

/// Renders progress on one rewritten line between status lines
#[derive(Default)]
struct ProgressPrinter {
    on_progress_line: bool,
}

impl ProgressPrinter {
    fn show(&mut self, progress: &Progress) {
        match progress {
            Progress::Status(message) => {
                self.finish();
                println!("{}", message);
            }
            Progress::Advance(state) => self.advance(state),
        }
    }

    fn advance(&mut self, state: &ProgressState) {
        if state.total == 0 {
            return;
        }
        let mut stdout = std::io::stdout();
        let _ = write!(
            stdout,
            "\r    {}/{} cells ({:.0}%), overall {:.0}%",
            state.translated,
            state.total,
            state.language_fraction() * 100.0,
            state.overall_fraction() * 100.0
        );
        let _ = stdout.flush();
        self.on_progress_line = true;
    }

    fn finish(&mut self) {
        if self.on_progress_line {
            println!();
            self.on_progress_line = false;
        }
    }
}

fn print_summary(report: &JobReport) -> ExitCode {
    println!();
    for lang in &report.languages {
        match &lang.output {
            Ok(path) => println!(
                "\u{2713} {}: {} cells translated, {} failed -> {}",
                lang.target,
                lang.translated,
                lang.failed,
                path.display()
            ),
            Err(err) => println!("\u{2718} {}: {}", lang.target, err),
        }
    }

    if report.stopped {
        println!("Stopped before all languages were translated.");
        ExitCode::from(130)
    } else if 0 < report.failed_languages() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn prompt(message: &str) -> std::io::Result<String> {
    print!("{}", message);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}
