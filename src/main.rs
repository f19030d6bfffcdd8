//! rfmforge: RFM customer segmentation CLI
//!
//! This is the main entrypoint that orchestrates loading an upload, merging
//! it with stored history, scoring, and reporting.

use anyhow::Result;
use clap::Parser;
use rfmforge::{
    ingest_upload, load_transactions, logging, summarize_segments, viz, write_scores_csv, Args,
    JsonFileStore, MemoryStore, TransactionStore,
};
use std::time::Instant;
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let now = args.reference_time()?;
    let start_time = Instant::now();

    // Step 1: Load the upload
    info!(input = %args.input, "loading transactions");
    let upload = load_transactions(&args.input)?;
    println!("✓ Loaded {} transactions from {}", upload.len(), args.input);

    // Step 2: Merge with history and score
    let mut store: Box<dyn TransactionStore> = match &args.store {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::new()),
    };
    let report = ingest_upload(store.as_mut(), &args.owner, upload, now)?;

    println!(
        "✓ Scored {} customers from {} transactions (owner: {}, reference: {})",
        report.scores.len(),
        report.total_transactions,
        report.owner,
        now.format("%Y-%m-%d %H:%M UTC")
    );

    // Step 3: Report
    let summaries = summarize_segments(&report.scores);
    viz::print_segment_summary(&summaries);
    viz::print_top_customers(&report.scores, args.top);

    write_scores_csv(&report.scores, &args.output)?;
    println!("\nScores saved to: {}", args.output.display());

    if let Some(chart_path) = &args.chart {
        viz::create_segment_chart(&summaries, chart_path)?;
        println!("Segment chart saved to: {}", chart_path.display());
    }

    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
