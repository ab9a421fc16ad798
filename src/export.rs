use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::view::{ViewMode, ViewTable};

pub fn default_export_path(mode: ViewMode) -> PathBuf {
    let slug = match mode {
        ViewMode::Plays => "plays",
        ViewMode::Players => "players",
        ViewMode::Games => "games",
        ViewMode::GameByPlayer => "game_by_player",
    };
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("bgstats_{slug}_{stamp}.xlsx"))
}

/// Write the currently displayed view, header row first, one sheet per
/// workbook. Returns the number of data rows written.
pub fn export_view(path: &Path, table: &ViewTable) -> Result<usize> {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(table.rows.len() + 1);
    rows.push(table.columns.iter().map(|c| c.title.to_string()).collect());
    for (idx, _) in table.rows.iter().enumerate() {
        rows.push(
            table
                .columns
                .iter()
                .map(|c| table.cell_text(idx, c.key))
                .collect(),
        );
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(table.mode))?;
    write_rows(sheet, &rows)?;
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(rows.len().saturating_sub(1))
}

fn sheet_name(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Plays => "Plays",
        ViewMode::Players => "Players",
        ViewMode::Games => "Games",
        ViewMode::GameByPlayer => "GameByPlayer",
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    let header = Format::new().set_bold();
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            if row_idx == 0 {
                worksheet.write_string_with_format(0, col_idx as u16, value, &header)
            } else {
                worksheet.write_string(row_idx as u32, col_idx as u16, value)
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
