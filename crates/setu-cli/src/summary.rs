//! Table output for resolution results and batch reports.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use setu_cli::batch_io::outcome;
use setu_map::{BatchItem, BatchReport, BatchRequest, MappingStatistics};
use setu_model::{CodingSystem, Concept, MappingResult, ResolutionStatus, SearchHit};

pub fn print_result(result: &MappingResult) {
    println!(
        "{} {} \"{}\" -> {}: {}",
        result.source.system,
        result.source.code,
        result.source.display,
        result.target_system,
        result.status
    );
    if result.candidates.is_empty() {
        println!("No candidates.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rank"),
        header_cell("Code"),
        header_cell("Display"),
        header_cell("Similarity"),
        header_cell("Confidence"),
        header_cell("Relation"),
        header_cell("Rationale"),
    ]);
    apply_table_style(&mut table);
    for candidate in &result.candidates {
        table.add_row(vec![
            dim_cell(candidate.rank),
            Cell::new(&candidate.target.code).add_attribute(Attribute::Bold),
            Cell::new(&candidate.target.display),
            Cell::new(percent(candidate.similarity)),
            confidence_cell(candidate.confidence, candidate.rank == 1, result.status),
            Cell::new(candidate.relation),
            dim_cell(&candidate.rationale),
        ]);
    }
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    println!("{table}");
    println!("Index version {}", result.index_version);
}

pub fn print_hits(system: CodingSystem, text: &str, hits: &[SearchHit]) {
    println!("{system} \"{text}\"");
    if hits.is_empty() {
        println!("No matches.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rank"),
        header_cell("Code"),
        header_cell("Display"),
        header_cell("Similarity"),
    ]);
    apply_table_style(&mut table);
    for hit in hits {
        table.add_row(vec![
            dim_cell(hit.rank),
            Cell::new(&hit.concept.code).add_attribute(Attribute::Bold),
            Cell::new(&hit.concept.display),
            Cell::new(percent(hit.similarity)),
        ]);
    }
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    println!("{table}");
}

pub fn print_concept(concept: &Concept) {
    let mut table = Table::new();
    apply_table_style(&mut table);
    let synonyms = concept
        .synonyms
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");
    let parent = concept
        .parent
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    for (field, value) in [
        ("System", concept.system.label().to_string()),
        ("Code", concept.code.to_string()),
        ("Display", concept.display.clone()),
        ("Synonyms", synonyms),
        ("Language", concept.language.clone()),
        ("Parent", parent),
    ] {
        table.add_row(vec![header_cell(field), Cell::new(value)]);
    }
    println!("{table}");
}

pub fn print_batch(requests: &[BatchRequest], report: &BatchReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Source"),
        header_cell("Code"),
        header_cell("Target"),
        header_cell("Outcome"),
        header_cell("Top match"),
        header_cell("Confidence"),
    ]);
    apply_summary_table_style(&mut table);
    for (position, (request, item)) in requests.iter().zip(&report.items).enumerate() {
        let (top, confidence) = match item {
            BatchItem::Resolved(result) => match result.top() {
                Some(top) => (
                    Cell::new(format!("{} {}", top.target.code, top.target.display)),
                    confidence_cell(top.confidence, true, result.status),
                ),
                None => (dim_cell("-"), dim_cell("-")),
            },
            BatchItem::Failed(err) => (Cell::new(err).fg(Color::Red), dim_cell("-")),
            BatchItem::Cancelled => (dim_cell("-"), dim_cell("-")),
        };
        table.add_row(vec![
            dim_cell(position + 1),
            Cell::new(&request.source_system),
            Cell::new(&request.source_code),
            Cell::new(&request.target_system),
            outcome_cell(item),
            top,
            confidence,
        ]);
    }
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);
    println!("{table}");

    print_totals(report);
    print_statistics(&MappingStatistics::from_results(report.results()));
}

fn print_totals(report: &BatchReport) {
    let summary = &report.summary;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Outcome"), header_cell("Count")]);
    apply_table_style(&mut table);
    for (label, count, color) in [
        ("Matched", summary.matched, Color::Green),
        ("Partial", summary.partial, Color::Yellow),
        ("Not found", summary.not_found, Color::DarkYellow),
        ("Failed", summary.failed, Color::Red),
        ("Cancelled", summary.cancelled, Color::DarkGrey),
    ] {
        table.add_row(vec![Cell::new(label), count_cell(count, color)]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(summary.total).add_attribute(Attribute::Bold),
    ]);
    align_column(&mut table, 1, CellAlignment::Right);
    println!("{table}");
}

fn print_statistics(stats: &MappingStatistics) {
    if stats.max_confidence.is_none() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Top confidence"), header_cell("Results")]);
    apply_table_style(&mut table);
    for (label, count) in stats.labelled_buckets() {
        table.add_row(vec![Cell::new(label), count_cell(count, Color::Cyan)]);
    }
    align_column(&mut table, 1, CellAlignment::Right);
    println!("{table}");

    let mut relations = Table::new();
    relations.set_header(vec![header_cell("Relation"), header_cell("Results")]);
    apply_table_style(&mut relations);
    for (relation, count) in stats.relations.iter().rev() {
        relations.add_row(vec![Cell::new(relation), count_cell(*count, Color::Cyan)]);
    }
    align_column(&mut relations, 1, CellAlignment::Right);
    println!("{relations}");

    if let (Some(min), Some(max), Some(mean)) =
        (stats.min_confidence, stats.max_confidence, stats.mean_confidence)
    {
        println!(
            "Confidence min {} / mean {} / max {}",
            percent(min),
            percent(mean),
            percent(max)
        );
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn percent(value: f32) -> String {
    format!("{:.1}%", value * 100.0)
}

fn confidence_cell(confidence: f32, is_top: bool, status: ResolutionStatus) -> Cell {
    let cell = Cell::new(percent(confidence));
    if !is_top {
        return cell;
    }
    cell.fg(status_color(status)).add_attribute(Attribute::Bold)
}

fn outcome_cell(item: &BatchItem) -> Cell {
    let color = match item {
        BatchItem::Resolved(result) => status_color(result.status),
        BatchItem::Failed(_) => Color::Red,
        BatchItem::Cancelled => Color::DarkGrey,
    };
    Cell::new(outcome(item)).fg(color)
}

fn status_color(status: ResolutionStatus) -> Color {
    match status {
        ResolutionStatus::Matched => Color::Green,
        ResolutionStatus::Partial => Color::Yellow,
        ResolutionStatus::NotFound => Color::DarkYellow,
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
