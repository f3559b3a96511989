use clap::Parser;
use console::style;
use env_logger::Env;

use perimeter::cli::Args;
use perimeter::engine::{AttackSurfaceEngine, MemoryScanStore, StaticCollector};
use perimeter::exporter::JsonExporter;
use perimeter::models::{AssessmentReport, OverallRisk, ScanRecord};
use perimeter::PerimeterResult;

fn display_scan_summary(record: &ScanRecord) {
    println!();
    println!(
        "{} {}",
        style("▶").green(),
        style(format!("Scan of {} complete", record.domain)).bold()
    );
    println!("  Assets discovered: {}", style(record.total_assets).bold());
    println!(
        "  Average risk:      {}",
        style(format!("{:.1}", record.risk_summary.average_risk)).bold()
    );

    let summary = &record.risk_summary;
    let critical = if summary.critical > 0 {
        style(summary.critical).red().bold()
    } else {
        style(summary.critical).dim()
    };
    println!(
        "  Severity spread:   {} critical / {} high / {} medium / {} low / {} informational",
        critical,
        style(summary.high).yellow(),
        summary.medium,
        summary.low,
        style(summary.informational).dim()
    );
}

fn run(args: &Args) -> PerimeterResult<()> {
    let collector = match &args.input {
        Some(path) => StaticCollector::from_json_file(path)?,
        None => {
            log::warn!("No asset inventory provided; assessing an empty attack surface");
            StaticCollector::default()
        }
    };

    let mut engine = AttackSurfaceEngine::new(collector, MemoryScanStore::new())?;

    let record = engine.scan(&args.domain)?;
    display_scan_summary(&record);

    let simulation = if args.skip_simulation {
        None
    } else {
        let sim = engine.simulate(&record.scan_id, args.deterministic)?;
        match &sim.entry_point {
            Some(entry) => {
                let risk = match sim.overall_risk {
                    OverallRisk::Critical => style("CRITICAL").red().bold(),
                    OverallRisk::High => style("HIGH").red(),
                    OverallRisk::Medium => style("MEDIUM").yellow(),
                    OverallRisk::Low => style("LOW").green(),
                };
                println!(
                    "  Attack path:       {} step(s) from {} — overall risk {}",
                    sim.attack_path.len(),
                    style(entry).bold(),
                    risk
                );
            }
            None => println!("  Attack path:       {}", style("no viable entry point").green()),
        }
        Some(sim)
    };

    let posture = if args.skip_posture {
        None
    } else {
        let assessment = engine.posture_with(&record.scan_id, simulation.as_ref())?;
        println!(
            "  Posture:           {} ({} maturity, {:.0}% confidence)",
            style(assessment.posture_score).bold(),
            assessment.maturity_level,
            assessment.confidence_score * 100.0
        );
        Some(assessment)
    };

    if let Some(path) = &args.output {
        let report = AssessmentReport {
            scan: record,
            simulation,
            posture,
        };
        JsonExporter::export(&report, path)?;
        println!("  Report:            {}", style(path.display()).bold());
    }

    println!();
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logging based on verbosity and quiet flags
    let log_level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    log::debug!("Perimeter starting with args: {:?}", args);

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}
