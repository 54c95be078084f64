use eframe::egui::{self, Color32, ProgressBar, RichText, Ui};

use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::export::{EXPORT_FILE_NAME, write_xlsx};
use crate::pipeline::load_input;
use crate::state::{AppState, StatusKind};

// ---------------------------------------------------------------------------
// Left side panel – target column and run control
// ---------------------------------------------------------------------------

/// Render the left panel. Returns `true` when the user asked to start a run.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) -> bool {
    ui.heading("Name column");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        ui.label("Open an Excel, CSV, JSON or Parquet file (File → Open…).");
        return false;
    };

    // Clone what we need so we can mutate state below.
    let columns = dataset.columns().to_vec();
    let n_rows = dataset.len();

    match &state.detected_column {
        Some(col) => {
            ui.label(RichText::new(format!("✔ Detected column: '{col}'")).color(Color32::GREEN));
        }
        None => {
            ui.label(
                RichText::new("⚠ No 'Nama' or 'Name' column found. Pick one manually.")
                    .color(Color32::YELLOW),
            );
        }
    }
    ui.add_space(4.0);

    let running = state.is_running();
    ui.add_enabled_ui(!running, |ui: &mut Ui| {
        ui.strong("Column holding full names");
        let current = state.selected_column.clone().unwrap_or_default();
        egui::ComboBox::from_id_salt("name_column")
            .selected_text(if current.is_empty() { "Select…" } else { current.as_str() })
            .show_ui(ui, |ui: &mut Ui| {
                for col in &columns {
                    if ui.selectable_label(current == *col, col).clicked() {
                        state.selected_column = Some(col.clone());
                    }
                }
            });
    });

    if let Some(empty) = state
        .selected_column
        .as_ref()
        .and_then(|col| state.null_counts.get(col))
        .filter(|n| **n > 0)
    {
        ui.label(RichText::new(format!("{empty} empty cells will be sent as blank names")).weak());
    }

    ui.separator();

    let mut start = false;
    if ui
        .add_enabled(
            state.can_run(),
            egui::Button::new(RichText::new(format!("🚀 Predict {n_rows} names")).strong()),
        )
        .clicked()
    {
        start = true;
    }

    if let Some(run) = &state.active_run {
        ui.add_space(6.0);
        ui.add(
            ProgressBar::new(run.progress)
                .show_percentage()
                .animate(true),
        );
        if run.total_batches > 0 {
            ui.label(format!(
                "{} / {} batches, {:.1}s",
                run.completed_batches,
                run.total_batches,
                run.elapsed.as_secs_f64()
            ));
        }
    }

    if let Some(summary) = &state.last_run {
        ui.add_space(6.0);
        ui.label(format!(
            "Last run: {} rows, {} batches, {:.2}s",
            summary.rows,
            summary.batches,
            summary.elapsed.as_secs_f64()
        ));
    }

    start
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui
                .add_enabled(!state.is_running(), egui::Button::new("Open…"))
                .clicked()
            {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.can_export(), egui::Button::new("Export results (.xlsx)…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let name = state
                .source_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!("{name}: {} rows, {} columns", ds.len(), ds.columns().len()));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            let colour = match msg.kind {
                StatusKind::Info => ui.visuals().text_color(),
                StatusKind::Success => Color32::GREEN,
                StatusKind::Warning => Color32::YELLOW,
                StatusKind::Error => Color32::RED,
            };
            ui.label(RichText::new(&msg.text).color(colour));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let all: Vec<&str> = SUPPORTED_EXTENSIONS
        .iter()
        .flat_map(|(_, exts)| exts.iter().copied())
        .collect();
    let mut dialog = rfd::FileDialog::new()
        .set_title("Open dataset")
        .add_filter("Supported files", all.as_slice());
    for (label, exts) in SUPPORTED_EXTENSIONS {
        dialog = dialog.add_filter(*label, *exts);
    }

    if let Some(path) = dialog.pick_file() {
        match load_input(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows with columns {:?}",
                    dataset.len(),
                    dataset.columns()
                );
                state.set_dataset(dataset, &path);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                state.set_load_error(e.to_string());
            }
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export predictions")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("Excel", &["xlsx"])
        .save_file();

    if let Some(path) = file {
        match write_xlsx(dataset, &path) {
            Ok(()) => {
                log::info!("Exported {} rows to {}", dataset.len(), path.display());
                state.set_status(
                    StatusKind::Success,
                    format!("Saved {}", path.display()),
                );
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                state.set_status(StatusKind::Error, format!("Export failed: {e}"));
            }
        }
    }
}
