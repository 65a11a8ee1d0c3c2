//! Format check, repair, organize, mark and status results as text.

use super::types::{CheckOutput, MarkOutput, OrganizeOutput, RepairOutput, StatusOutput};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{CellAlignment, Table};
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn counts_table(header: [&str; 2], rows: &[(&str, usize)]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header.to_vec());
    for (label, count) in rows {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

/// Offending folders per kind, then an aligned count table.
pub fn format_check_text(data: &CheckOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Consistency Check")));
    out.push_str(&format!("  Repository: {}\n", data.repository));
    out.push_str(&format!("  Folders checked: {}\n\n", data.folders_checked));

    for entry in data.violations.iter().filter(|e| e.count > 0) {
        out.push_str(&format!("{}\n", entry.kind.yellow()));
        for path in &entry.paths {
            out.push_str(&format!("  {}\n", path));
        }
        out.push('\n');
    }

    let rows: Vec<(&str, usize)> = data
        .violations
        .iter()
        .map(|e| (e.kind.as_str(), e.count))
        .collect();
    out.push_str(&format!("{}\n", counts_table(["Violation", "Count"], &rows)));
    if data.total == 0 {
        out.push_str(&format!("{}\n", "Repository is consistent.".green()));
    } else {
        out.push_str(&format!("Total: {} violations.\n", data.total));
    }
    out
}

pub fn format_repair_text(data: &RepairOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Repair")));
    out.push_str(&format!("  Repository: {}\n\n", data.repository));
    if data.found == 0 {
        out.push_str("Nothing to repair.\n");
        return out;
    }

    if data.error_folder_created {
        out.push_str("Recreated the error folder.\n\n");
    }
    if !data.renamed.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("Renamed folders")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["From", "To"]);
        for rename in &data.renamed {
            table.add_row(vec![rename.from.clone(), rename.to.clone()]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    let rows = [
        ("Found", data.found),
        ("Fixed", data.fixed),
        ("Remaining", data.remaining),
        ("Files relocated", data.relocated_files),
        ("Files failed", data.failed_files),
        ("Folders split", data.reorganized),
    ];
    out.push_str(&format!("{}\n", counts_table(["", "Count"], &rows)));
    if data.remaining == 0 {
        out.push_str(&format!("{}\n", "Repository is consistent.".green()));
    } else {
        out.push_str(&format!(
            "{} violations remain; run check for details.\n",
            data.remaining.to_string().red()
        ));
    }
    out
}

pub fn format_organize_text(data: &OrganizeOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Organize")));
    out.push_str(&format!("  Source: {}\n", data.source));
    out.push_str(&format!("  Repository: {}\n", data.repository));
    out.push_str(&format!("  Mode: {}\n\n", data.mode));
    let rows = [
        ("Files", data.files),
        ("Placed", data.placed),
        ("Replaced", data.replaced),
        ("Unknown date", data.unknown_date),
        ("Skipped", data.skipped),
        ("Failed", data.failed),
    ];
    out.push_str(&format!("{}\n", counts_table(["", "Count"], &rows)));
    out
}

pub fn format_mark_text(data: &MarkOutput) -> String {
    format!(
        "Marked {} files in {} ({} undated, {} failed).\n",
        data.marked, data.repository, data.undated, data.failed
    )
}

pub fn format_status_text(data: &StatusOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Repository Status")));
    out.push_str(&format!("  Path: {}\n", data.path));
    if !data.initialized {
        out.push_str("  Initialized: no\n\nRun `chronofold init` to create a repository here.\n");
        return out;
    }
    out.push_str("  Initialized: yes\n");
    out.push_str(&format!(
        "  Valid: {}\n",
        if data.valid { "yes" } else { "no (error folder missing, run repair)" }
    ));
    if let Some(properties) = &data.properties {
        out.push_str(&format!("  folderSize: {}\n", properties.folder_size));
    }
    if let Some(stats) = &data.stats {
        out.push('\n');
        let rows = [
            ("Folders", stats.folders),
            ("Leaves", stats.leaves),
            ("Files", stats.files),
            ("Max depth", stats.max_depth),
        ];
        out.push_str(&format!("{}\n", counts_table(["", "Count"], &rows)));
        out.push_str(&format!("  Size: {} bytes\n", stats.bytes));
    }
    out
}
