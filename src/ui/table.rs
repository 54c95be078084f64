use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::label_color;
use crate::data::merge::GENDER_COLUMN;
use crate::data::model::{CellValue, Dataset};

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Data table (central panel)
// ---------------------------------------------------------------------------

/// Render the first `n_rows` rows of `dataset`, with a leading row number.
///
/// Rows are virtualised, so the full enriched dataset can be shown.
pub fn data_table(ui: &mut Ui, dataset: &Dataset, n_rows: usize) {
    let columns = dataset.columns();
    let gender_idx = dataset.column_index(GENDER_COLUMN);
    let rows = dataset.head(n_rows);

    TableBuilder::new(ui)
        .id_salt("data_table")
        .striped(true)
        .resizable(true)
        .auto_shrink([false, true])
        .column(Column::auto().at_least(40.0))
        .columns(Column::auto().at_least(80.0).clip(true), columns.len())
        .header(ROW_HEIGHT + 4.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            for col in columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let idx = row.index();
                row.col(|ui| {
                    ui.label(RichText::new(idx.to_string()).weak());
                });
                for (col_idx, cell) in rows[idx].iter().enumerate() {
                    row.col(|ui| {
                        let text = cell.to_string();
                        let colour = match cell {
                            CellValue::String(s) if Some(col_idx) == gender_idx => label_color(s),
                            _ => None,
                        };
                        match colour {
                            Some(c) => ui.label(RichText::new(text).color(c)),
                            None => ui.label(text),
                        };
                    });
                }
            });
        });
}
