use projline::config::{ConfigOverrides, InputOverrides, OutputOverrides, SeriesOverrides};
use projline::diagnostics::{DiagnosticCounts, DiagnosticSink, TracingSink};
use projline::{source, temporal, utils, Diagnostic, SortKey, Timeline, TimelineConfig};
use tracing_subscriber::EnvFilter;

fn parse_arg(flag: &str) -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|arg| arg == flag)
}

fn print_help() {
    eprintln!(
        r#"projline - reconcile project catalogs into a timeline

USAGE:
    projline [OPTIONS]

OPTIONS:
    -c, --config <FILE>     Path to config file (TOML)
        --api <FILE>        API export (JSON) [default: static/projects.json]
        --sheet <FILE>      Spreadsheet export (CSV) [default: static/allprojects.csv]
        --sort <KEY>        deadline | video | organizer [default: deadline]
        --step <DAYS>       Days between active-count samples [default: 1]
    -o, --output <FILE>     Write the result here instead of stdout
        --summary           Print a text summary instead of JSON
        --as-of <DATE>      With --summary, also list projects open on DATE (YYYY-MM-DD)
    -h, --help              Print help

ENVIRONMENT:
    PROJLINE_CONFIG                 Path to config file
    PROJLINE_INPUT__API_EXPORT      API export path
    PROJLINE_INPUT__SHEET_EXPORT    Spreadsheet export path
    PROJLINE_TIMELINE__SORT         Sort key
    RUST_LOG                        Log filter, e.g. projline=debug

CONFIG FILE (projline.toml):
    [input]
    api_export = "static/projects.json"
    sheet_export = "static/allprojects.csv"

    [timeline]
    sort = "video"
    sample_step_days = 7

    [swarm]
    radius = 3.0
    unit_seconds = 86400
"#
    );
}

fn build_overrides() -> anyhow::Result<ConfigOverrides> {
    let mut overrides = ConfigOverrides::default();

    let input = InputOverrides {
        api_export: parse_arg("--api").map(Into::into),
        sheet_export: parse_arg("--sheet").map(Into::into),
    };
    if input.api_export.is_some() || input.sheet_export.is_some() {
        overrides.input = Some(input);
    }

    let timeline = SeriesOverrides {
        sort: parse_arg("--sort").map(|s| s.parse::<SortKey>()).transpose()?,
        sample_step_days: parse_arg("--step").map(|s| s.parse::<u32>()).transpose()?,
    };
    if timeline.sort.is_some() || timeline.sample_step_days.is_some() {
        overrides.timeline = Some(timeline);
    }

    let output = OutputOverrides {
        path: parse_arg("--output").or_else(|| parse_arg("-o")).map(Into::into),
        summary: has_flag("--summary").then_some(true),
    };
    if output.path.is_some() || output.summary.is_some() {
        overrides.output = Some(output);
    }

    Ok(overrides)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if has_flag("-h") || has_flag("--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Load config: CLI > Env > File > Defaults
    let overrides = build_overrides()?;
    let config_path = parse_arg("--config")
        .or_else(|| parse_arg("-c"))
        .or_else(|| std::env::var("PROJLINE_CONFIG").ok());
    let config = TimelineConfig::load(config_path.as_deref(), overrides)?;

    let snapshots =
        source::load_snapshots(&config.input.api_export, &config.input.sheet_export).await?;

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let timeline = Timeline::reconcile(&snapshots.api, &snapshots.sheet, &mut diagnostics);
    let counts = DiagnosticCounts::tally(&diagnostics);
    let mut log = TracingSink;
    for diagnostic in diagnostics {
        log.emit(diagnostic);
    }

    let content = if config.output.summary {
        let mut summary = utils::export_to_text_summary(&timeline, &counts)?;
        if let Some(raw) = parse_arg("--as-of") {
            let as_of = temporal::parse_iso_date(&raw)?;
            summary.push_str(&format!("\nOpen on {}:\n", temporal::iso(as_of)));
            for project in timeline.open_projects(as_of) {
                summary.push_str(&format!("  - {project}\n"));
            }
        }
        summary
    } else {
        let document = utils::build_document(&timeline, &config, counts)?;
        utils::export_to_json(&document)?
    };

    utils::write_output(&content, config.output.path.as_deref())
}
