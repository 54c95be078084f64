use std::f64::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Legend, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::color::{gender_color, outline_color};
use crate::data::label::Gender;
use crate::data::summary::GenderDistribution;

/// Arc resolution of a full circle.
const CIRCLE_SEGMENTS: usize = 180;

// ---------------------------------------------------------------------------
// Pie geometry
// ---------------------------------------------------------------------------

/// One pie slice in plot coordinates (unit circle, angles in radians).
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub gender: Gender,
    pub count: usize,
    pub share: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl PieSlice {
    /// Closed outline: centre, then the arc from start to end.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        let sweep = self.end_angle - self.start_angle;
        let steps = ((sweep / TAU) * CIRCLE_SEGMENTS as f64 - 1e-6).ceil().max(1.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        if sweep < TAU - 1e-9 {
            points.push([0.0, 0.0]);
        }
        for i in 0..=steps {
            let a = self.start_angle + sweep * i as f64 / steps as f64;
            points.push([a.cos(), a.sin()]);
        }
        points
    }

    /// Point at `radius` on the bisector of the slice.
    pub fn anchor(&self, radius: f64) -> PlotPoint {
        let mid = (self.start_angle + self.end_angle) / 2.0;
        PlotPoint::new(radius * mid.cos(), radius * mid.sin())
    }
}

/// Slices counter-clockwise from 12 o'clock, in canonical gender order.
pub fn pie_slices(distribution: &GenderDistribution) -> Vec<PieSlice> {
    let mut angle = FRAC_PI_2;
    distribution
        .entries()
        .map(|(gender, count)| {
            let share = distribution.share(gender);
            let start_angle = angle;
            angle += share * TAU;
            PieSlice {
                gender,
                count,
                share,
                start_angle,
                end_angle: angle,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Distribution chart (right panel)
// ---------------------------------------------------------------------------

/// Render the gender distribution pie chart, or a "no data" note.
pub fn distribution_chart(ui: &mut Ui, distribution: &GenderDistribution) {
    ui.strong("Gender distribution");
    ui.separator();

    if distribution.is_empty() {
        ui.label("No valid data to display in the chart.");
        return;
    }

    for slice in pie_slices(distribution) {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(RichText::new("■").color(gender_color(slice.gender)));
            ui.label(format!(
                "{}: {} ({:.1}%)",
                slice.gender,
                slice.count,
                slice.share * 100.0
            ));
        });
    }
    ui.add_space(4.0);

    Plot::new("gender_pie")
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_x(-1.35)
        .include_x(1.35)
        .include_y(-1.25)
        .include_y(1.25)
        .show(ui, |plot_ui| {
            for slice in pie_slices(distribution) {
                let fill = gender_color(slice.gender);
                let polygon = Polygon::new(PlotPoints::new(slice.outline()))
                    .name(slice.gender.display_label())
                    .fill_color(fill)
                    .stroke(Stroke::new(1.5, outline_color(fill)));
                plot_ui.polygon(polygon);

                plot_ui.text(
                    Text::new(
                        slice.anchor(0.6),
                        RichText::new(format!("{:.1}%", slice.share * 100.0))
                            .color(Color32::WHITE)
                            .strong(),
                    )
                    .name(slice.gender.display_label()),
                );
                plot_ui.text(
                    Text::new(slice.anchor(1.15), slice.gender.display_label())
                        .name(slice.gender.display_label()),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_cover_the_full_circle_in_order() {
        let dist = GenderDistribution::from_labels(["Laki-laki", "Perempuan", "Perempuan"]);
        let slices = pie_slices(&dist);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].gender, Gender::Male);
        assert!((slices[0].start_angle - FRAC_PI_2).abs() < 1e-12);
        assert!((slices[0].end_angle - slices[1].start_angle).abs() < 1e-12);
        assert!((slices[1].end_angle - (FRAC_PI_2 + TAU)).abs() < 1e-9);
    }

    #[test]
    fn single_gender_is_a_full_disc_without_centre_point() {
        let dist = GenderDistribution::from_labels(["Perempuan"]);
        let slices = pie_slices(&dist);
        let outline = slices[0].outline();

        assert_eq!(slices.len(), 1);
        assert_ne!(outline[0], [0.0, 0.0]);
        assert_eq!(outline.len(), CIRCLE_SEGMENTS + 1);
    }

    #[test]
    fn partial_slice_starts_at_centre() {
        let dist = GenderDistribution::from_labels(["Laki-laki", "Perempuan"]);
        let outline = pie_slices(&dist)[0].outline();
        assert_eq!(outline[0], [0.0, 0.0]);
        // Top of the circle is the first arc point.
        assert!((outline[1][0]).abs() < 1e-12 && (outline[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_distribution_has_no_slices() {
        assert!(pie_slices(&GenderDistribution::default()).is_empty());
    }
}
