mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use vodhub::server::{normalize_keyword, serve, sse_frame};
use vodhub::storage::FileStorage;
use vodhub::VodHub;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = FileStorage::new(cli.config.unwrap_or_else(FileStorage::default_path));
    let hub = VodHub::open(storage).await?;

    match cli.command {
        Commands::Search { keyword, sse } => {
            let Some(keyword) = normalize_keyword(Some(&keyword)) else { bail!("keyword is required") };
            let mut results = hub.search(keyword);
            let mut count = 0;
            while let Some(result) = results.next().await {
                count += 1;
                if sse {
                    print!("{}", sse_frame(&result)?);
                    continue;
                }
                println!("[{}] {} title(s)", result.source_name, result.titles.len());
                for t in &result.titles {
                    let first = t.episodes.first().map(|e| e.video_url.as_str()).unwrap_or_default();
                    println!("  {} ({} episode(s)) {}", t.name, t.episodes.len(), first);
                }
            }
            if count == 0 { eprintln!("No results for `{}`", keyword); }
        }
        Commands::Sources => {
            let sources = hub.sources();
            if sources.is_empty() { println!("No sources configured."); }
            for s in sources {
                match s.timeout {
                    Some(t) => println!("{}\t{}\t(timeout {}s)", s.name, s.base_url, t),
                    None => println!("{}\t{}", s.name, s.base_url),
                }
            }
        }
        Commands::Serve { bind } => serve(Arc::new(hub), &bind).await?,
    }
    Ok(())
}
