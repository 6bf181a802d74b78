use pbn_facets::config::facets::load_config;
use pbn_facets::image::io::{load_rgba_image, write_json_file};
use pbn_facets::{FacetPipeline, PaintByNumbers, PipelineReport, RunContext, Stage};
use serde::Serialize;
use std::env;
use std::path::Path;

#[derive(Serialize)]
struct Output<'a> {
    result: &'a PaintByNumbers,
    report: &'a PipelineReport,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "pbn-facets".to_string());
    let config_path = args
        .next()
        .ok_or_else(|| format!("Usage: {program} <config.json>"))?;
    let config = load_config(Path::new(&config_path))?;

    let owned = load_rgba_image(&config.input)?;
    let image = owned.as_view();

    let mut pipeline = FacetPipeline::new(config.params.clone()).map_err(|e| e.to_string())?;
    let run = pipeline
        .run_with_diagnostics(&image, &mut RunContext::default())
        .map_err(|e| e.to_string())?;

    print_summary(&run.report);
    write_json_file(
        &config.output,
        &Output {
            result: &run.result,
            report: &run.report,
        },
    )?;
    println!("Facets written to {}", config.output.display());
    Ok(())
}

fn print_summary(report: &PipelineReport) {
    println!("Facet summary");
    println!("  input: {}x{}", report.input.width, report.input.height);
    println!(
        "  palette: {} colours after {} k-means iterations",
        report.palette_size, report.kmeans_iterations
    );
    for round in &report.rounds {
        println!(
            "  round {}: cleaned={} built={} deleted={} skipped={} remaining={}",
            round.round,
            round.cleaned_pixels,
            round.facets_built,
            round.stats.deleted,
            round.stats.skipped,
            round.stats.remaining
        );
    }
    println!(
        "  segments: {} ({} shared), labels: {}",
        report.segments.segments, report.segments.shared, report.labels_placed
    );
    println!("\nTimings (ms): total={:.3}", report.timings.total_ms);
    for stage in Stage::ALL {
        println!("  {:<14} {:.3}", stage.label(), report.timings.stage_ms(stage));
    }
}
