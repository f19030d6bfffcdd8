//! Segment reporting: console summaries and Plotters charts

use plotters::prelude::*;
use std::path::Path;

use crate::model::RfmScore;
use crate::segment::Segment;

/// Per-segment totals over a set of scores
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub customers: usize,
    /// Fraction of all scored customers in this segment
    pub share: f64,
    pub total_spend: f64,
    pub avg_spend: f64,
}

/// Summarize scores by segment, in rule-chain order.
/// Segments with no customers are omitted.
pub fn summarize_segments(scores: &[RfmScore]) -> Vec<SegmentSummary> {
    let total = scores.len();

    Segment::ALL
        .iter()
        .filter_map(|&segment| {
            let members: Vec<&RfmScore> =
                scores.iter().filter(|s| s.segment_name == segment).collect();
            if members.is_empty() {
                return None;
            }

            let total_spend: f64 = members.iter().map(|s| s.total_spend).sum();
            Some(SegmentSummary {
                segment,
                customers: members.len(),
                share: members.len() as f64 / total as f64,
                total_spend,
                avg_spend: total_spend / members.len() as f64,
            })
        })
        .collect()
}

/// Print the segment distribution to the console
pub fn print_segment_summary(summaries: &[SegmentSummary]) {
    let total: usize = summaries.iter().map(|s| s.customers).sum();

    println!("\n=== Segment Summary ===");
    println!("Total customers: {}", total);
    println!();
    println!(
        "  {:<28} | {:>9} | {:>6} | {:>12} | {:>10}",
        "Segment", "Customers", "Share", "Total spend", "Avg spend"
    );
    println!("  {:-<28}-|-{:->9}-|-{:->6}-|-{:->12}-|-{:->10}", "", "", "", "", "");
    for summary in summaries {
        println!(
            "  {:<28} | {:>9} | {:>5.1}% | {:>12.2} | {:>10.2}",
            summary.segment.label(),
            summary.customers,
            summary.share * 100.0,
            summary.total_spend,
            summary.avg_spend
        );
    }
}

/// Print the top `limit` customers by total spend
pub fn print_top_customers(scores: &[RfmScore], limit: usize) {
    let mut ranked: Vec<&RfmScore> = scores.iter().collect();
    ranked.sort_by(|a, b| b.total_spend.total_cmp(&a.total_spend));

    println!("\n=== Top {} Customers by Spend ===", limit.min(ranked.len()));
    println!(
        "  {:<16} | {:>3} | {:>7} | {:>10} | Segment",
        "Customer", "RFM", "Recency", "Spend"
    );
    for score in ranked.into_iter().take(limit) {
        let name = score.customer_name.as_deref().unwrap_or(&score.customer_id);
        println!(
            "  {:<16} | {:>3} | {:>6}d | {:>10.2} | {}",
            name,
            score.rfm_code(),
            score.recency_days,
            score.total_spend,
            score.segment_name
        );
    }
}

/// Draw a bar chart of customers per segment
pub fn create_segment_chart(
    summaries: &[SegmentSummary],
    output_path: &Path,
) -> crate::Result<()> {
    if summaries.is_empty() {
        anyhow::bail!("No segments to chart");
    }

    let max_size = summaries.iter().map(|s| s.customers).max().unwrap_or(1) as f64;

    let root = BitMapBackend::new(output_path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customers per RFM Segment", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            -0.5f64..(summaries.len() as f64 - 0.5),
            0f64..(max_size * 1.1),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Segment")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (idx, summary) in summaries.iter().enumerate() {
        // Palette slot follows the segment, so colours stay stable across runs
        let color = Palette99::pick(summary.segment as usize).to_rgba();
        let x = idx as f64;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.4, 0.0), (x + 0.4, summary.customers as f64)],
                color.filled(),
            )))?
            .label(format!("{} ({})", summary.segment.label(), summary.customers))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    tracing::info!(path = %output_path.display(), "segment chart saved");

    Ok(())
}
