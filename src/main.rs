//! Custolens CLI - analyst-facing reports over the cost export pipeline.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;

use custolens::analysis::{run_analysis, AnalysisReport, AnalysisRequest};
use custolens::data::{locate_input, DatasetCache, PipelineError, CANDIDATE_FILENAMES};

const USAGE: &str = "\
Usage: custolens [DIR] [options]

Analyze the cost export found in DIR (default: current directory).

Options:
  --group <COLUMN>        categorical column to filter and summarize by
  --select <VALUE>        keep only records with this value (repeatable)
  --cost-adjust <PCT>     cost adjustment percentage for the scenario
  --volume-adjust <PCT>   volume adjustment percentage for the scenario
  --sigma <K>             anomaly threshold multiplier (default 1.5)
  --theme <NAME>          presentation hint echoed in the report
  --json                  emit the report as JSON
  -h, --help              show this help";

struct CliOptions {
    dir: PathBuf,
    json: bool,
    request: AnalysisRequest,
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &CliOptions) -> anyhow::Result<ExitCode> {
    let Some(path) = locate_input(&options.dir) else {
        eprintln!(
            "No cost export found in {}.\n\
             Drop '{}' (or any .csv export) there and run again.",
            options.dir.display(),
            CANDIDATE_FILENAMES[0]
        );
        return Ok(ExitCode::FAILURE);
    };

    let cache = DatasetCache::new();
    let dataset = match cache.get_or_load(&path) {
        Ok(dataset) => dataset,
        Err(PipelineError::Parse { path, source }) => {
            eprintln!(
                "The file {} could not be read as a cost export.\n\
                 Cause: {source}\n\
                 Re-export the sheet as CSV (comma/UTF-8 or semicolon/Windows-1252) and try again.",
                path.display()
            );
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    let output = run_analysis(&dataset, &options.request)?;

    if options.json {
        let rendered =
            serde_json::to_string_pretty(&output.report).context("serializing report")?;
        println!("{rendered}");
    } else {
        print_report(&output.report);
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        dir: PathBuf::from("."),
        json: false,
        request: AnalysisRequest::default(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--group" => options.request.group_column = Some(take_value(&mut iter, arg)?),
            "--select" => options.request.selected_groups.push(take_value(&mut iter, arg)?),
            "--theme" => options.request.theme = Some(take_value(&mut iter, arg)?),
            "--cost-adjust" => options.request.cost_adjust_pct = take_number(&mut iter, arg)?,
            "--volume-adjust" => options.request.volume_adjust_pct = take_number(&mut iter, arg)?,
            "--sigma" => options.request.sigma_threshold = take_number(&mut iter, arg)?,
            other if !other.starts_with('-') => options.dir = PathBuf::from(other),
            other => return Err(format!("Unknown option '{other}'\n\n{USAGE}")),
        }
    }

    Ok(options)
}

fn take_value(iter: &mut std::slice::Iter<'_, String>, flag: &str) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("Missing value for {flag}\n\n{USAGE}"))
}

fn take_number(iter: &mut std::slice::Iter<'_, String>, flag: &str) -> Result<f64, String> {
    let raw = take_value(iter, flag)?;
    raw.parse()
        .map_err(|_| format!("Invalid number '{raw}' for {flag}\n\n{USAGE}"))
}

fn print_report(report: &AnalysisReport) {
    println!("Source      : {} ({})", report.source, report.format);
    println!(
        "Records     : {} of {} after filtering",
        report.rows_considered, report.rows_total
    );
    if let Some(theme) = &report.theme {
        println!("Theme       : {theme}");
    }

    println!();
    println!("Efficiency (R$/m2)");
    println!("  mean      : {:.4}", report.efficiency.mean);
    println!("  std dev   : {:.4}", report.efficiency.std_dev);
    match report.efficiency.threshold {
        Some(cutoff) => println!("  threshold : {cutoff:.4}"),
        None => println!("  threshold : n/a (no spread)"),
    }
    println!("  anomalies : {}", report.anomalies.len());
    for anomaly in &report.anomalies {
        println!("    {} -> {:.4}", anomaly.label, anomaly.efficiency);
    }

    println!();
    println!("Scenario");
    println!("  base cost      : {:.2}", report.scenario.base_cost_total);
    println!("  projected cost : {:.2}", report.scenario.projected_cost_total);
    println!(
        "  delta          : {:.2} ({:+.2}%)",
        report.scenario.delta, report.scenario.delta_pct
    );

    if let Some(group_column) = &report.group_column {
        if !report.groups.is_empty() {
            println!();
            println!("Groups by {group_column}");
            for group in &report.groups {
                println!(
                    "  {:<28} {:>6} records   cost {:>14.2}   mean R$/m2 {:>10.4}",
                    group.group, group.records, group.total_standard_cost, group.mean_efficiency
                );
            }
        }
    }
}
