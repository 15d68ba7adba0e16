//! List command: enumerate assets of the enabled pools.

use anyhow::Result;
use owo_colors::OwoColorize;
use xasset_core::{AssetKind, ExtractConfig, Session, TitleSupport};

use super::{describe, matches_filter, with_kinds};
use crate::source::SourceArgs;

/// Run the list command
pub fn run(
    source: &SourceArgs,
    config: &ExtractConfig,
    kinds: &[AssetKind],
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = with_kinds(config, kinds);
    source.with_target(|target| {
        let session = Session::attach(
            target.reader,
            Box::new(TitleSupport::new(target.spec)),
            target.mode,
            config,
        )?;
        session.load_assets()?;

        let assets: Vec<_> = session
            .assets()
            .into_iter()
            .filter(|a| matches_filter(a, filter))
            .collect();

        if json {
            println!("{}", serde_json::to_string_pretty(&assets)?);
            return Ok(());
        }

        for asset in &assets {
            let line = format!(
                "{:<9} {:<48} {}",
                asset.kind().to_string(),
                asset.name,
                describe(&asset.detail)
            );
            if asset.is_placeholder() {
                println!("{}", line.dimmed());
            } else {
                println!("{}", line);
            }
        }
        eprintln!("{} assets", assets.len());
        Ok(())
    })
}
