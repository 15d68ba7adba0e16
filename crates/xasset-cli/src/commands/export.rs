//! Export command: write every selected asset to an output directory.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use owo_colors::OwoColorize;
use tracing::info;
use xasset_core::{AssetKind, ExtractConfig, Session, TitleSupport};

use super::{matches_filter, with_kinds};
use crate::shutdown::ShutdownSignal;
use crate::sink::FileSink;
use crate::source::SourceArgs;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

pub struct ExportOptions {
    pub output: PathBuf,
    pub kinds: Vec<AssetKind>,
    pub filter: Option<String>,
    pub packages: Option<PathBuf>,
    pub sound_banks: Vec<PathBuf>,
    pub workers: Option<usize>,
}

/// Run the export command
pub fn run(source: &SourceArgs, config: &ExtractConfig, options: &ExportOptions) -> Result<()> {
    let signal = ShutdownSignal::install_ctrlc()?;
    let mut config = with_kinds(config, &options.kinds);
    if let Some(workers) = options.workers {
        config.worker_count = workers;
    }

    source.with_target(|target| {
        let mut session = Session::attach(
            target.reader,
            Box::new(TitleSupport::new(target.spec)),
            target.mode,
            config,
        )?
        .with_running_flag(signal.flag());

        if let Some(path) = &options.packages {
            session.load_packages(path)?;
        }
        for bank in &options.sound_banks {
            let count = session.add_sound_bank(bank)?;
            info!("Opened sound bank {} ({} entries)", bank.display(), count);
        }

        let total = session.load_assets()?;
        let selection: Vec<_> = session
            .assets()
            .into_iter()
            .filter(|a| matches_filter(a, options.filter.as_deref()))
            .collect();
        info!("Selected {} of {} assets", selection.len(), total);

        let sink = FileSink::new(&options.output);
        let started = Instant::now();
        let summary = thread::scope(|scope| {
            let worker = scope.spawn(|| session.export(&selection, &sink));
            while !worker.is_finished() {
                eprint!("\r{}/{} assets", session.progress(), selection.len());
                thread::sleep(PROGRESS_INTERVAL);
            }
            eprintln!("\r{}/{} assets", session.progress(), selection.len());
            worker.join().map_err(|_| anyhow!("Export worker panicked"))
        })??;

        println!(
            "{} {} exported, {} skipped, {} failed in {:.1}s -> {}",
            if summary.cancelled {
                "Cancelled:".yellow().to_string()
            } else {
                "Done:".green().to_string()
            },
            summary.exported,
            summary.skipped,
            summary.failed,
            started.elapsed().as_secs_f32(),
            sink.root().display()
        );
        Ok(())
    })
}
