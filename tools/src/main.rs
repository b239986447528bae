//! visitor-runner: headless driver for the visitor ledger.
//!
//! Usage:
//!   visitor-runner --data visitors.csv
//!   visitor-runner --data visitors.csv --from 2026-06-01 --to 2026-08-31
//!   visitor-runner --config ledger.json --submit group.json
//!   visitor-runner --data visitors.csv --ipc-mode
//!
//! --ipc-mode takes submissions and date ranges over stdin, so it cannot be
//! combined with --submit, --from or --to.

use anyhow::Result;
use chrono::NaiveDate;
use std::env;
use std::io::{self, BufRead, Write};
use visitor_core::{
    config::LedgerConfig,
    record::VisitorRecord,
    submission::Submission,
    summary::{DateRange, VisitorSummary},
    LedgerError, VisitorDesk,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Submit {
        submission: Submission,
    },
    Summary {
        #[serde(default)]
        from: Option<NaiveDate>,
        #[serde(default)]
        to:   Option<NaiveDate>,
    },
    Warnings,
    Quit,
}

#[derive(serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcReply<'a> {
    Saved { records: &'a [VisitorRecord] },
    Summary { summary: &'a VisitorSummary },
    Warnings { warnings: Vec<String> },
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config = match find_arg(&args, "--config") {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(data) = find_arg(&args, "--data") {
        config.data_file = data.into();
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();

    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    if ipc_mode {
        if let Some(flag) = one_shot_flag(&args) {
            anyhow::bail!("{flag} cannot be combined with --ipc-mode");
        }
    }
    let range = DateRange::new(parse_date(&args, "--from")?, parse_date(&args, "--to")?);

    let mut desk = VisitorDesk::open(&config)?;

    if ipc_mode {
        return run_ipc_loop(&mut desk);
    }

    println!("Visitor ledger — visitor-runner");
    println!("  data file: {}", config.data_file.display());
    if let Some(warning) = desk.schema_mismatch() {
        println!("  WARNING:   {warning}");
    }
    println!();

    if let Some(path) = find_arg(&args, "--submit") {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let submission: Submission = serde_json::from_str(&content)?;
        match desk.submit(&submission) {
            Ok(records) => print_saved(&records),
            Err(LedgerError::Validation(e)) => {
                println!("Not saved: {e}");
                println!();
            }
            Err(e) => return Err(e.into()),
        }
    }

    print_summary(&desk.summary_between(&range), &range);
    Ok(())
}

fn run_ipc_loop(desk: &mut VisitorDesk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, "bad_request", &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Submit { submission } => match desk.submit(&submission) {
                Ok(records) => write_reply(&mut stdout, &IpcReply::Saved { records: &records })?,
                Err(LedgerError::Validation(e)) => {
                    write_error(&mut stdout, e.kind(), &e.to_string())?
                }
                Err(e) => write_error(&mut stdout, "storage", &e.to_string())?,
            },
            IpcCommand::Summary { from, to } => {
                let summary = desk.summary_between(&DateRange::new(from, to));
                write_reply(&mut stdout, &IpcReply::Summary { summary: &summary })?;
            }
            IpcCommand::Warnings => {
                let warnings = desk
                    .schema_mismatch()
                    .map(|w| vec![w.to_string()])
                    .unwrap_or_default();
                write_reply(&mut stdout, &IpcReply::Warnings { warnings })?;
            }
        }
    }
    Ok(())
}

fn write_reply(out: &mut impl Write, reply: &IpcReply<'_>) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(reply)?)?;
    out.flush()?;
    Ok(())
}

fn write_error(out: &mut impl Write, kind: &str, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": kind, "message": message });
    writeln!(out, "{err_json}")?;
    out.flush()?;
    Ok(())
}

fn print_saved(records: &[VisitorRecord]) {
    println!("=== SAVED ===");
    for r in records {
        println!(
            "  #{:<5} {} | {:<14} | {:>3} visitor(s) | {}",
            r.record_id, r.visit_date, r.ticket_category, r.visitor_count, r.origin_city
        );
    }
    println!();
}

fn print_summary(summary: &VisitorSummary, range: &DateRange) {
    println!("=== VISITOR SUMMARY ===");
    if !range.is_unbounded() {
        let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "…".into());
        println!("  period:           {} – {}", show(range.from), show(range.to));
    }
    if summary.record_count == 0 {
        println!("  (No visits recorded yet)");
        return;
    }
    println!("  records:          {}", summary.record_count);
    println!("  total visitors:   {}", summary.total_visitors);
    println!("  unique cities:    {}", summary.unique_cities);
    println!(
        "  top ticket type:  {}",
        summary.top_ticket_category.as_deref().unwrap_or("-")
    );
    println!("  children under 7: {}", summary.age_bands.age_under_7);

    println!();
    println!("=== BY TICKET CATEGORY ===");
    for e in &summary.by_ticket_category {
        println!("  {:<16} {:>6}", e.label, e.value);
    }
    println!();
    println!("=== BY VISIT REASON ===");
    for e in &summary.by_visit_reason {
        println!("  {:<16} {:>6}", e.label, e.value);
    }
    println!();
    println!("=== BY AGE BAND ===");
    for e in summary.age_bands.entries() {
        println!("  {:<16} {:>6}", e.label, e.value);
    }
}

/// First flag that only makes sense outside the IPC loop.
fn one_shot_flag(args: &[String]) -> Option<&'static str> {
    ["--submit", "--from", "--to"]
        .into_iter()
        .find(|flag| args.iter().any(|a| a == flag))
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_date(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    find_arg(args, flag)
        .map(|s| {
            NaiveDate::parse_from_str(s, visitor_core::types::DATE_FORMAT)
                .map_err(|e| anyhow::anyhow!("{flag} expects YYYY-MM-DD, got {s:?}: {e}"))
        })
        .transpose()
}
