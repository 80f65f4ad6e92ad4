use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use dqf_clean::PromotionReport;
use dqf_cli::workflow::describe_change;
use dqf_model::{IssueReason, MappingMethod};

use crate::types::{CleanReport, InputInfo, MapReport};

pub fn print_mapping_summary(report: &MapReport) {
    print_input(&report.input);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Header"),
        header_cell("Canonical"),
        header_cell("Method"),
        header_cell("Confidence"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for mapping in &report.mappings {
        let canonical = match &mapping.canonical {
            Some(key) => Cell::new(key)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&mapping.source_header),
            canonical,
            method_cell(mapping.method),
            confidence_cell(mapping.confidence, mapping.is_mapped()),
        ]);
    }
    println!("{table}");
    println!(
        "Mapped: {}/{} headers",
        report.summary.mapped(),
        report.summary.total
    );
    if !report.summary.unmapped.is_empty() {
        println!("Unmapped: {}", report.summary.unmapped.join(", "));
    }
}

pub fn print_clean_summary(report: &CleanReport) {
    print_input(&report.input);
    let run = &report.run;
    print_issue_table(report);

    let fixable = run.outcome.fixable().count();
    println!(
        "Issues: {} ({} with a suggested fix), {} cell issues remaining in output",
        run.outcome.issues.len(),
        fixable,
        run.remaining.len()
    );
    if let Some(path) = &report.output {
        println!("Output: {}", path.display());
    }
    if let Some(path) = &report.issues_file {
        println!("Issue ledger: {}", path.display());
    }

    let proposals: Vec<_> = run
        .outcome
        .summary_issues()
        .filter_map(|issue| issue.proposal.as_ref().map(|p| (issue.column.as_str(), p)))
        .collect();
    if !proposals.is_empty() {
        println!();
        println!("Proposed columns:");
        for (header, proposal) in proposals {
            match proposal.description.as_deref() {
                Some(description) if !description.is_empty() => {
                    println!("- \"{header}\" -> {}: {description}", proposal.key);
                }
                _ => println!("- \"{header}\" -> {}", proposal.key),
            }
        }
    }

    match &report.promotion {
        Some(promotion) => print_promotion(promotion),
        None if report.pending > 0 => {
            println!();
            println!(
                "{} learning candidate(s) not saved; rerun with --promote to keep them",
                report.pending
            );
        }
        None => {}
    }
}

fn print_issue_table(report: &CleanReport) {
    let mut groups: BTreeMap<(&str, IssueReason), (usize, usize)> = BTreeMap::new();
    for issue in &report.run.outcome.issues {
        let entry = groups
            .entry((issue.column.as_str(), issue.reason))
            .or_insert((0, 0));
        entry.0 += 1;
        if issue.is_fixable() {
            entry.1 += 1;
        }
    }
    if groups.is_empty() {
        println!("No issues found.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Reason"),
        header_cell("Count"),
        header_cell("Fixable"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for ((column, reason), (count, fixable)) in groups {
        table.add_row(vec![
            Cell::new(column),
            reason_cell(reason),
            count_cell(count, reason_color(reason)),
            count_cell(fixable, Color::Green),
        ]);
    }
    println!("{table}");
}

fn print_promotion(promotion: &PromotionReport) {
    println!();
    if promotion.has_changes() {
        println!("Schema changes:");
        for change in &promotion.changes {
            println!("- {}", describe_change(change));
        }
    } else {
        println!("Schema unchanged.");
    }
    if promotion.already_known > 0 {
        println!("Already known: {}", promotion.already_known);
    }
    if !promotion.conflicts.is_empty() {
        eprintln!("Conflicts:");
        for conflict in &promotion.conflicts {
            eprintln!(
                "- \"{}\" stays with {} (requested for {})",
                conflict.synonym, conflict.existing, conflict.canonical
            );
        }
    }
    if !promotion.rejected.is_empty() {
        eprintln!("Rejected:");
        for rejection in &promotion.rejected {
            eprintln!("- {}: {}", rejection.subject, rejection.reason);
        }
    }
}

fn print_input(input: &InputInfo) {
    println!(
        "Input: {} ({}, delimiter '{}', {} rows)",
        input.path.display(),
        input.encoding,
        char::from(input.delimiter).escape_default(),
        input.rows
    );
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    if table.column_count() >= 5 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
            ColumnConstraint::UpperBoundary(Width::Fixed(24)),
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ]);
    }
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn method_cell(method: MappingMethod) -> Cell {
    let color = match method {
        MappingMethod::Canonical | MappingMethod::Regex | MappingMethod::Synonym => Color::Green,
        MappingMethod::Fuzzy => Color::Yellow,
        MappingMethod::Llm => Color::Magenta,
        MappingMethod::Override => Color::Cyan,
        MappingMethod::Unmapped => Color::DarkGrey,
    };
    Cell::new(method.as_str()).fg(color)
}

fn confidence_cell(confidence: f64, mapped: bool) -> Cell {
    if mapped {
        Cell::new(format!("{confidence:.2}"))
    } else {
        dim_cell("-")
    }
}

fn reason_cell(reason: IssueReason) -> Cell {
    Cell::new(reason.as_str()).fg(reason_color(reason))
}

fn reason_color(reason: IssueReason) -> Color {
    match reason {
        IssueReason::NewHeaderProposal => Color::Magenta,
        IssueReason::ExtraColumn | IssueReason::MissingColumn => Color::Yellow,
        _ => Color::Red,
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
