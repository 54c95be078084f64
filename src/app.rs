use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::config::Settings;
use crate::predict::client::InferenceHandle;
use crate::state::AppState;
use crate::ui::{panels, plot, table};
use crate::worker::{self, RunJob};

/// Repaint interval while a run is active, in case a notify is missed.
const RUN_REPAINT: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct GenderPandaApp {
    pub state: AppState,
    settings: Settings,
    /// Shared across runs so the endpoint is only connected once.
    inference: Arc<InferenceHandle>,
}

impl GenderPandaApp {
    pub fn new(settings: Settings) -> Self {
        let inference = Arc::new(InferenceHandle::new(settings.clone()));
        Self {
            state: AppState::default(),
            settings,
            inference,
        }
    }

    fn start_run(&mut self, ctx: &egui::Context) {
        let (Some(dataset), Some(column)) = (&self.state.dataset, &self.state.selected_column)
        else {
            return;
        };
        log::info!(
            "starting prediction of {} rows from column '{column}' (batch size {}, connected: {})",
            dataset.len(),
            self.settings.batch_size,
            self.inference.is_connected()
        );
        let job = RunJob {
            dataset: dataset.clone(),
            name_column: column.clone(),
            batch_size: self.settings.batch_size,
        };
        let repaint = ctx.clone();
        let rx = worker::spawn_run(self.inference.clone(), job, move || repaint.request_repaint());
        self.state.begin_run(rx);
    }
}

impl eframe::App for GenderPandaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_worker();
        if self.state.is_running() {
            ctx.request_repaint_after(RUN_REPAINT);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: column + run control ----
        let start = egui::SidePanel::left("run_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| panels::side_panel(ui, &mut self.state))
            .inner;
        if start {
            self.start_run(ctx);
        }

        // ---- Right side panel: distribution chart ----
        if let Some(summary) = &self.state.last_run {
            egui::SidePanel::right("chart_panel")
                .default_width(320.0)
                .resizable(true)
                .show(ctx, |ui| {
                    plot::distribution_chart(ui, &summary.distribution);
                });
        }

        // ---- Central panel: table ----
        egui::CentralPanel::default().show(ctx, |ui| match &self.state.dataset {
            Some(dataset) => {
                ui.heading(if self.state.last_run.is_some() {
                    "Results"
                } else {
                    "Preview"
                });
                ui.separator();
                table::data_table(ui, dataset, self.state.visible_rows());
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label("Open a spreadsheet with File → Open… to get started.");
                });
            }
        });
    }
}
