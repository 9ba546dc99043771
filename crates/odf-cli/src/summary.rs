use anyhow::{Context, Result};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};
use odf_model::{Diagnostic, DiagnosticReport, Severity, TextEncoding};

use odf_cli::types::{
    CheckResult, ConvertResult, ObjectView, RoundtripResult, TypeDetail, TypeListing, TypeSummary,
};

pub fn print_check(result: &CheckResult) {
    println!("File: {}", result.path.display());
    println!("Encoding: {}", encoding_label(result.encoding));
    let mut table = Table::new();
    table.set_header(vec![header_cell("Object type"), header_cell("Objects")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (type_name, count) in &result.objects_by_type {
        table.add_row(vec![type_cell(type_name), Cell::new(count)]);
    }
    if result.unclassified_sections > 0 {
        table.add_row(vec![
            dim_cell("(unclassified)"),
            count_cell(result.unclassified_sections, Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(result.object_count()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    print_report(&result.report);
}

pub fn print_check_json(result: &CheckResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("serialize check result")?;
    println!("{json}");
    Ok(())
}

pub fn print_roundtrip(result: &RoundtripResult) {
    match result.first_difference {
        None => println!(
            "{}: identical ({} bytes)",
            result.path.display(),
            result.bytes
        ),
        Some(line) => println!(
            "{}: output differs from line {line}",
            result.path.display()
        ),
    }
}

pub fn print_convert(result: &ConvertResult) {
    println!("Input: {}", result.input.display());
    println!("Output: {}", result.output.display());
    let mut table = Table::new();
    table.set_header(vec![header_cell("Object type"), header_cell("Converted")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (type_name, count) in &result.objects_by_type {
        table.add_row(vec![type_cell(type_name), Cell::new(count)]);
    }
    println!("{table}");
    if !result.skipped.is_empty() {
        println!();
        println!("Skipped:");
        println!("{}", diagnostic_table(&result.skipped));
    }
    print_report(&result.report);
}

pub fn print_types(listing: &TypeListing) {
    match listing {
        TypeListing::All(types) => print_type_list(types),
        TypeListing::One(detail) => print_type_detail(detail),
    }
}

fn print_type_list(types: &[TypeSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Type"),
        header_cell("Identifier"),
        header_cell("Attributes"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for summary in types {
        table.add_row(vec![
            type_cell(&summary.name),
            Cell::new(&summary.shape),
            Cell::new(summary.attributes),
            optional_cell(summary.description.as_deref()),
        ]);
    }
    println!("{table}");
}

fn print_type_detail(detail: &TypeDetail) {
    println!("Type: {} ({})", detail.name, detail.shape);
    if let Some(description) = &detail.description {
        println!("{description}");
    }
    if let Some(id_attribute) = &detail.id_attribute {
        println!("Identifier attribute: {id_attribute}");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Attribute"),
        header_cell("Kind"),
        header_cell("Requirement"),
        header_cell("Range"),
        header_cell("Default"),
        header_cell("Aliases"),
    ]);
    apply_table_style(&mut table);
    for attribute in &detail.attributes {
        let requirement = if attribute.requirement == "optional" {
            dim_cell(&attribute.requirement)
        } else {
            Cell::new(&attribute.requirement).fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&attribute.name),
            Cell::new(&attribute.kind),
            requirement,
            optional_cell(attribute.range.as_deref()),
            optional_cell(attribute.default.as_deref()),
            if attribute.aliases.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(attribute.aliases.join(", "))
            },
        ]);
    }
    println!("{table}");
}

pub fn print_objects(views: &[ObjectView]) {
    if views.is_empty() {
        println!("No objects of this type.");
        return;
    }
    for view in views {
        println!("[{}]", view.label);
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Attribute"),
            header_cell("Value"),
            header_cell("Note"),
        ]);
        apply_table_style(&mut table);
        for attribute in &view.attributes {
            table.add_row(vec![
                Cell::new(&attribute.key),
                Cell::new(&attribute.value),
                optional_cell(attribute.note.as_deref()),
            ]);
        }
        println!("{table}");
        if view.referrers.is_empty() {
            println!("Referenced by: -");
        } else {
            println!("Referenced by: {}", view.referrers.join(", "));
        }
        println!();
    }
}

fn print_report(report: &DiagnosticReport) {
    println!(
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    if report.is_empty() {
        return;
    }
    println!();
    println!("Diagnostics:");
    println!("{}", diagnostic_table(&report.diagnostics));
}

fn diagnostic_table(diagnostics: &[Diagnostic]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Rule"),
        header_cell("Object"),
        header_cell("Attribute"),
        header_cell("Line"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for diagnostic in diagnostics {
        table.add_row(vec![
            severity_cell(diagnostic.severity),
            Cell::new(diagnostic.rule),
            optional_cell(diagnostic.object.as_ref().map(|o| o.name.as_str())),
            optional_cell(diagnostic.attribute.as_deref()),
            diagnostic.line.map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&diagnostic.message),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Fixed(9)),
        ColumnConstraint::UpperBoundary(Width::Fixed(26)),
        ColumnConstraint::UpperBoundary(Width::Fixed(22)),
        ColumnConstraint::UpperBoundary(Width::Fixed(28)),
        ColumnConstraint::LowerBoundary(Width::Fixed(5)),
        ColumnConstraint::UpperBoundary(Width::Percentage(50)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn encoding_label(encoding: TextEncoding) -> &'static str {
    match encoding {
        TextEncoding::Utf8 { bom: true } => "UTF-8 with BOM",
        TextEncoding::Utf8 { bom: false } => "UTF-8",
        TextEncoding::Latin1 => "ISO-8859-1",
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
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

fn type_cell(type_name: &str) -> Cell {
    Cell::new(type_name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
