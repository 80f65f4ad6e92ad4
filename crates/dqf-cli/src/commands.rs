use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tracing::{debug, info, info_span, warn};

use dqf_cli::workflow::{self, RunOptions, override_map};
use dqf_ingest::{CsvSource, read_table_with, write_table};
use dqf_map::{HeaderMapper, MapperOptions, MappingSummary};
use dqf_model::ValidationIssue;
use dqf_oracle::{DisabledOracle, OpenAiOracle, Oracle, OracleConfig, have_credentials};
use dqf_schema::{SchemaStore, SchemaTruth};

use crate::cli::{CleanArgs, Cli, InputArgs, MapArgs};
use crate::summary::{apply_table_style, dim_cell, header_cell};
use crate::types::{CleanReport, InputInfo, MapReport};

pub fn run_schema(cli: &Cli) -> Result<()> {
    let (_, schema) = load_schema(cli)?;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Description"),
        header_cell("Example"),
        header_cell("Synonyms"),
        header_cell("Transforms"),
    ]);
    apply_table_style(&mut table);
    for column in schema.columns() {
        let synonyms = column
            .synonyms
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let transforms = schema.value_transforms(&column.key).count();
        table.add_row(vec![
            header_cell(&column.key),
            Cell::new(&column.description),
            Cell::new(&column.example),
            if synonyms.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(synonyms)
            },
            if transforms == 0 {
                dim_cell("-")
            } else {
                Cell::new(transforms)
            },
        ]);
    }
    println!("Schema: {} ({} columns)", cli.schema.display(), schema.len());
    println!("{table}");
    Ok(())
}

pub fn run_map(cli: &Cli, args: &MapArgs) -> Result<MapReport> {
    let (_, schema) = load_schema(cli)?;
    let source = read_input(&args.input)?;
    let oracle = make_oracle(cli);
    let mapper = HeaderMapper::new(&schema)
        .with_oracle(&*oracle)
        .with_options(MapperOptions::default().with_oracle(!cli.no_oracle));
    let mappings = mapper.map(&source.table.columns);
    let summary = MappingSummary::from_mappings(&mappings);
    Ok(MapReport {
        input: input_info(&args.input.input, &source),
        mappings,
        summary,
    })
}

pub fn run_clean(cli: &Cli, args: &CleanArgs) -> Result<CleanReport> {
    let span = info_span!("clean", input = %args.input.input.display());
    let _guard = span.enter();

    let (store, mut schema) = load_schema(cli)?;
    let source = read_input(&args.input)?;
    let oracle = make_oracle(cli);
    let overrides = override_map(&args.overrides, &args.ignore);
    let options = RunOptions {
        use_oracle: !cli.no_oracle,
        apply_fixes: args.apply_fixes,
        accept_proposals: args.accept_proposals,
    };
    let mut run = workflow::run_clean(&schema, &*oracle, &source.table, &overrides, options)
        .context("apply header overrides")?;

    if let Some(path) = &args.output {
        write_table(path, &run.output)
            .with_context(|| format!("write cleaned dataset {}", path.display()))?;
        info!(path = %path.display(), rows = run.output.height(), "wrote cleaned dataset");
    }
    if let Some(path) = &args.issues {
        write_issues(path, &run.outcome.issues)?;
        info!(path = %path.display(), issues = run.outcome.issues.len(), "wrote issue ledger");
    }

    let promotion = if args.promote {
        let report = run
            .session
            .promote(&mut schema, Some(&store))
            .with_context(|| format!("promote into {}", store.path().display()))?;
        Some(report)
    } else {
        if !run.session.is_empty() {
            info!(
                candidates = run.session.len(),
                "learning candidates not promoted (use --promote)"
            );
        }
        None
    };
    let pending = run.session.len();

    Ok(CleanReport {
        input: input_info(&args.input.input, &source),
        run,
        output: args.output.clone(),
        issues_file: args.issues.clone(),
        promotion,
        pending,
    })
}

fn load_schema(cli: &Cli) -> Result<(SchemaStore, SchemaTruth)> {
    let store = SchemaStore::new(&cli.schema);
    let schema = store
        .load()
        .with_context(|| format!("load schema {}", cli.schema.display()))?;
    if schema.is_empty() {
        warn!(path = %cli.schema.display(), "schema has no columns");
    }
    Ok((store, schema))
}

fn read_input(args: &InputArgs) -> Result<CsvSource> {
    read_table_with(&args.input, args.delimiter)
        .with_context(|| format!("read {}", args.input.display()))
}

fn input_info(path: &Path, source: &CsvSource) -> InputInfo {
    InputInfo {
        path: path.to_path_buf(),
        delimiter: source.delimiter,
        encoding: source.encoding,
        rows: source.table.height(),
    }
}

fn make_oracle(cli: &Cli) -> Box<dyn Oracle> {
    if cli.no_oracle {
        debug!("oracle disabled by flag");
        return Box::new(DisabledOracle);
    }
    if !have_credentials() {
        debug!("no oracle credentials, running deterministic strategies only");
        return Box::new(DisabledOracle);
    }
    match OpenAiOracle::new(OracleConfig::from_env()) {
        Ok(oracle) => Box::new(oracle),
        Err(error) => {
            warn!(%error, "oracle unavailable");
            Box::new(DisabledOracle)
        }
    }
}

fn write_issues(path: &Path, issues: &[ValidationIssue]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("create issue ledger {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, issues)
        .with_context(|| format!("write issue ledger {}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .with_context(|| format!("write issue ledger {}", path.display()))?;
    Ok(())
}
