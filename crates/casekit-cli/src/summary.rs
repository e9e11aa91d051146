use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use casekit_layout::DisplayModel;
use casekit_model::CaseIdentity;
use casekit_vnv::{CampaignOutcome, MailDelivery, StepStatus};

use crate::commands::CaseUpdate;

pub fn print_display_model(model: &DisplayModel, identity: &CaseIdentity) {
    println!("Case: {}", model.case_path.display());
    println!("Study: {}  Case: {}", identity.study, identity.case);
    if let Some(xml) = &identity.xml_file {
        println!("Setup file: {xml}");
    }
    println!("{}", display_table(model));
}

#[must_use]
pub fn display_table(model: &DisplayModel) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Directory"),
        header_cell("Found"),
        header_cell("Warning"),
    ]);
    apply_table_style(&mut table);
    for field in &model.fields {
        let found = match &field.path {
            Some(_) => Cell::new(&field.text).fg(Color::Green),
            None => Cell::new(&field.text).fg(Color::Red),
        };
        let warning = match &field.warning {
            Some(warning) => Cell::new(warning).fg(Color::Yellow),
            None => dim_cell("-"),
        };
        table.add_row(vec![Cell::new(field.subdir.label()), found, warning]);
    }
    table
}

pub fn print_update_summary(updates: &[CaseUpdate]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Case"),
        header_cell("Created"),
        header_cell("Reference"),
        header_cell("Examples"),
        header_cell("Runcase"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for update in updates {
        let report = &update.report;
        table.add_row(vec![
            Cell::new(&update.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            count_cell(report.created_dirs.len()),
            Cell::new(report.reference_files),
            Cell::new(report.example_files),
            Cell::new(report.runcase.display()),
        ]);
    }
    println!("{table}");
}

pub fn print_campaign_summary(outcome: &CampaignOutcome) {
    if outcome.reports.is_empty() && outcome.records.is_empty() {
        return;
    }
    println!("{}", campaign_table(outcome));
    for report in &outcome.reports {
        println!("Report: {}", report.display());
    }
    match &outcome.mail {
        Some(MailDelivery::Sent) => println!("Mail: sent"),
        Some(MailDelivery::SentFallback { first_error }) => {
            eprintln!("Mail: report could not be sent ({first_error}); error notice sent instead");
        }
        None => {}
    }
    let failed = outcome.failed_cases();
    if failed > 0 {
        eprintln!("{failed} case(s) with failures");
    }
}

#[must_use]
pub fn campaign_table(outcome: &CampaignOutcome) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Study"),
        header_cell("Case"),
        header_cell("Skeleton"),
        header_cell("Compile"),
        header_cell("Run"),
        header_cell("Compare"),
        header_cell("Post"),
        header_cell("Plot"),
    ]);
    apply_table_style(&mut table);
    for column in 2..8 {
        align_column(&mut table, column, CellAlignment::Center);
    }
    for record in &outcome.records {
        table.add_row(vec![
            Cell::new(&record.study)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&record.case),
            status_cell(record.skeleton),
            status_cell(record.compile),
            status_cell(record.run),
            status_cell(record.compare),
            status_cell(record.post),
            status_cell(record.plot),
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

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: StepStatus) -> Cell {
    match status {
        StepStatus::Ok => Cell::new(status).fg(Color::Green),
        StepStatus::Failed => Cell::new(status)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        StepStatus::Missing => Cell::new(status).fg(Color::Yellow),
        StepStatus::Skipped | StepStatus::NotRun => dim_cell(status),
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Cyan)
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
