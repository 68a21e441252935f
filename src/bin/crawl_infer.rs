//! Crawl the configured board once, score the posts, print summaries.

use clap::Parser;
use inven_crawler::{
    cli::{Cli, init_logging, print_json},
    config::load_config,
    error::Result,
    pipeline,
    services::{BoardCrawler, HttpSentimentBackend, SentimentModel},
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
    if posts.is_empty() {
        return print_json(&[] as &[pipeline::AnalyzedSummary]);
    }

    let backend = HttpSentimentBackend::new(&config.sentiment.endpoint)?;
    let model = SentimentModel::new(&config.sentiment, backend)?;
    let analyzed = pipeline::run_infer(&posts, &model, config.sentiment.text_used).await?;

    print_json(&pipeline::summarize_analyzed(&analyzed, pipeline::SUMMARY_LIMIT))
}
