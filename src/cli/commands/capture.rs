//! The `capture` command.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use console::style;

use crate::capture::{self, likes_url, CaptureJob, CaptureOutcome, StopLimit};
use crate::config::Settings;

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// JSON file with the session cookies
    pub cookie_file: PathBuf,

    /// Profile whose likes timeline is captured
    pub profile: String,

    /// Seconds one stop check may wait for new content
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Stop after this many scrolls
    #[arg(long)]
    pub max_scrolls: Option<u32>,

    /// Stop once a link to this href is on the page
    #[arg(long)]
    pub target_href: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Only save responses whose URL starts with this prefix
    #[arg(long)]
    pub url_prefix: Option<String>,

    /// Directory receiving response_<id>.json files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Extract once more after scrolling stops
    #[arg(long)]
    pub final_flush: bool,

    /// Connect to a running browser instead of launching one
    #[arg(long)]
    pub remote_url: Option<String>,
}

impl CaptureArgs {
    fn apply(&self, settings: &mut Settings) {
        if self.headless {
            settings.browser.headless = true;
        }
        if let Some(url) = &self.remote_url {
            settings.browser.remote_url = Some(url.clone());
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.capture.timeout_seconds = timeout;
        }
        if let Some(prefix) = &self.url_prefix {
            settings.capture.url_prefix = prefix.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.capture.output_dir = dir.clone();
        }
        if self.final_flush {
            settings.capture.final_flush = true;
        }
    }
}

/// Capture a likes timeline.
pub async fn cmd_capture(mut settings: Settings, args: CaptureArgs) -> anyhow::Result<()> {
    // Validate before any browser starts
    let limit = match StopLimit::from_options(args.max_scrolls, args.target_href.clone()) {
        Ok(limit) => limit,
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            std::process::exit(1);
        }
    };

    args.apply(&mut settings);
    let url = likes_url(&args.profile)?;

    let job = CaptureJob::new(
        url.to_string(),
        args.cookie_file.clone(),
        limit,
        &settings.capture,
    );

    report_start(&mut io::stderr().lock(), &job)?;
    let outcome = capture::capture(&job, &settings.browser).await?;
    report_outcome(&mut io::stderr().lock(), &outcome)?;

    Ok(())
}

// Progress goes to stderr; stdout is left to record output.
fn report_start<W: Write>(out: &mut W, job: &CaptureJob) -> io::Result<()> {
    writeln!(
        out,
        "{} Capturing {} into {}",
        style("→").cyan(),
        style(&job.url).bold(),
        job.output_dir.display()
    )
}

fn report_outcome<W: Write>(out: &mut W, outcome: &CaptureOutcome) -> io::Result<()> {
    writeln!(
        out,
        "{} Stopped ({}) after {} scrolls: {} responses seen, {} saved",
        style("✓").green(),
        outcome.reason,
        outcome.scrolls,
        outcome.responses_seen,
        style(outcome.artifacts_saved).bold()
    )
}
