//! Crawl the configured board once and print the first posts.

use clap::Parser;
use inven_crawler::{
    cli::{Cli, init_logging, print_json},
    config::load_config,
    error::Result,
    pipeline,
    services::BoardCrawler,
    utils::Fetcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let fetcher = Fetcher::new(config.http.fetch_config()?)?;
    let crawler = BoardCrawler::from_config(fetcher, &config)?;

    let posts = pipeline::run_crawl(&crawler, &config).await?;
    print_json(&pipeline::summarize_posts(&posts, pipeline::POST_SUMMARY_LIMIT))
}
