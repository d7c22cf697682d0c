use log::{debug, info, warn};

use house_fairness::builder::Builder;
use house_fairness::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::fair::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_reference;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HouseError {
    #[snafu(display("{source}"))]
    UnsupportedCycle { source: MetricsErrors },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet or no header row in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Missing column {column:?} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The loading of {what} did not complete"))]
    LoaderPanic { what: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type HouseResult<T> = Result<T, HouseError>;

fn candidate_to_json(c: &ResolvedCandidate) -> JSValue {
    json!({
        "name": c.record.name,
        "district": c.record.district,
        "party": c.record.party,
        "majorParty": c.major_party.map(|p| p.as_str()),
        "otherParties": c.other_parties,
        "votes": c.record.votes,
        "pct": c.record.pct,
        "incumbent": c.record.incumbent,
        "unopposed": c.record.unopposed,
    })
}

fn state_to_json(s: &StateFairnessMetrics) -> JSValue {
    let t = &s.tally;
    let reps: Vec<JSValue> = t.winners.iter().map(candidate_to_json).collect();
    json!({
        "id": t.id,
        "name": t.name,
        "numReps": {
            "D": t.num_reps.d,
            "R": t.num_reps.r,
            "other": t.num_reps.other,
            "unopposed": t.num_reps.unopposed,
        },
        "reps": reps,
        "votes": {
            "D": s.votes.d,
            "R": s.votes.r,
            "other": s.votes.other,
            "total": s.votes.total(),
            "DPct": s.votes.d_pct(),
            "RPct": s.votes.r_pct(),
            "otherPct": s.votes.other_pct(),
        },
        "efficiencyGapD": s.efficiency_gap_d,
        "efficiencyGapSeatsD": s.efficiency_gap_seats_d,
        "popularRepresentationDelta": s.popular_representation_delta,
    })
}

pub fn build_summary_js(report: &FairnessReport) -> JSValue {
    let states: Vec<JSValue> = report.result.states.iter().map(state_to_json).collect();
    json!({
        "year": report.cycle.year(),
        "totalEfficiencyGapSeatsD": report.result.total_efficiency_gap_seats_d,
        "totalPopularRepresentationDelta": report.result.total_popular_representation_delta,
        "warnings": report.warnings.len(),
        "states": states,
    })
}

fn read_results(paths: &InputPaths) -> HouseResult<Vec<RawCandidateRow>> {
    info!("Attempting to read results file {:?}", paths.results);
    match paths.provider {
        ResultsProvider::Csv => io_csv::read_csv_results(&paths.results),
        ResultsProvider::Xlsx => {
            io_excel::read_excel_results(&paths.results, paths.excel_worksheet_name.as_deref())
        }
    }
}

/// Reads all the inputs and runs the metrics.
///
/// The two reference datasets are loaded in the background while the results are being read.
/// Both must be complete before the aggregation starts.
pub fn compute_report(cycle: ElectionCycle, paths: &InputPaths) -> HouseResult<FairnessReport> {
    let (rows, apportionments, vote_shares) = thread::scope(|s| {
        let apportionments_h = s.spawn(|| io_reference::read_apportionments(&paths.apportionments));
        let vote_shares_h = s.spawn(|| io_reference::read_house_votes(&paths.votes));
        let rows = read_results(paths);

        let apportionments = apportionments_h.join().map_err(|_| HouseError::LoaderPanic {
            what: "apportionments".to_string(),
        })??;
        let vote_shares = vote_shares_h.join().map_err(|_| HouseError::LoaderPanic {
            what: "house votes".to_string(),
        })??;
        Ok::<_, HouseError>((rows?, apportionments, vote_shares))
    })?;
    debug!(
        "compute_report: {} rows, {} apportionment decades, {} statewide votes",
        rows.len(),
        apportionments.len(),
        vote_shares.len()
    );

    let mut builder = Builder::new(cycle).reference(ReferenceData {
        apportionments,
        vote_shares,
    });
    builder.add_rows(rows);
    Ok(builder.run())
}

fn write_output(target: &OutputTarget, contents: &str) -> HouseResult<()> {
    match target {
        OutputTarget::Stdout => {
            println!("{}", contents);
        }
        OutputTarget::File(p) => {
            let path = p.display().to_string();
            info!("Writing results to {}...", path);
            if let Some(parent) = p.parent() {
                fs::create_dir_all(parent).context(WritingOutputSnafu { path: path.clone() })?;
            }
            fs::write(p, contents).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> HouseResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary {}", reference_path);
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("Summary matches the reference {}", reference_path);
    Ok(())
}

pub fn run_cycle(args: &Args) -> HouseResult<()> {
    let cycle: ElectionCycle = args.year.parse().context(UnsupportedCycleSnafu {})?;
    let config = match args.config.as_deref() {
        Some(p) => read_config(p)?,
        None => HouseConfig::default(),
    };
    let config_dir: Option<PathBuf> = args
        .config
        .as_deref()
        .and_then(|p| Path::new(p).parent())
        .map(|p| p.to_path_buf());
    let paths = resolve_paths(args, &config, config_dir.as_deref(), cycle)?;
    debug!("run_cycle: paths: {:?}", paths);

    let report = compute_report(cycle, &paths)?;
    let summary_js = build_summary_js(&report);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    write_output(&paths.output, &pretty_js_stats)?;

    if !report.warnings.is_empty() {
        info!("{} warnings raised during processing", report.warnings.len());
    }

    if let Some(reference_path) = args.reference.as_deref() {
        check_reference(reference_path, &pretty_js_stats)?;
    }
    Ok(())
}
