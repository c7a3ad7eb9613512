use atcrec::presentation::{Cli, Commands};
use clap::Parser;

#[test]
fn parse_search() {
    let cli = Cli::parse_from(["atcrec", "search", "KPDX"]);
    match cli.command {
        Commands::Search { airport } => assert_eq!(airport, "KPDX"),
        _ => panic!("Se esperaba subcomando search"),
    }
    assert!(cli.jobs.is_none());
    assert!(cli.output.is_none());
}

#[test]
fn parse_get() {
    let cli = Cli::parse_from([
        "atcrec", "get", "kpdx_app", "--date", "2025-12-10", "--time", "2330Z",
    ]);
    match cli.command {
        Commands::Get {
            station,
            date,
            time,
        } => {
            assert_eq!(station, "kpdx_app");
            assert_eq!(date, "2025-12-10");
            assert_eq!(time, "2330Z");
        }
        _ => panic!("Se esperaba subcomando get"),
    }
}

#[test]
fn parse_range_with_retry() {
    let cli = Cli::parse_from([
        "atcrec",
        "range",
        "kpdx_app",
        "--start",
        "12/10/2025",
        "2330",
        "--end",
        "12/11/2025",
        "0030",
        "--retry-failed",
    ]);
    match cli.command {
        Commands::Range {
            station,
            start,
            end,
            retry_failed,
        } => {
            assert_eq!(station, "kpdx_app");
            assert_eq!(start, vec!["12/10/2025", "2330"]);
            assert_eq!(end, vec!["12/11/2025", "0030"]);
            assert!(retry_failed);
        }
        _ => panic!("Se esperaba subcomando range"),
    }
}

#[test]
fn parse_global_flags_after_subcommand() {
    let cli = Cli::parse_from([
        "atcrec", "search", "kpdx", "--jobs", "5", "--delay", "500", "-o", "/tmp/atc",
        "--config", "cfg.toml",
    ]);
    assert_eq!(cli.jobs, Some(5));
    assert_eq!(cli.delay, Some(500));
    assert_eq!(cli.output.as_deref(), Some("/tmp/atc"));
    assert_eq!(cli.config.as_deref(), Some("cfg.toml"));
}

#[test]
fn range_requires_start_and_end() {
    let resultado = Cli::try_parse_from(["atcrec", "range", "kpdx_app", "--start", "2025-12-10", "0000"]);
    assert!(resultado.is_err());
}

#[test]
fn range_start_needs_date_and_time() {
    let resultado = Cli::try_parse_from([
        "atcrec", "range", "kpdx_app", "--start", "2025-12-10", "--end", "2025-12-10", "0100",
    ]);
    assert!(resultado.is_err());
}
