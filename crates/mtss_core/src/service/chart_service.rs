//! Behavior trend chart on the summary sheet.
//!
//! # Invariants
//! - After `render` the summary sheet holds exactly one chart.
//! - The chart covers summary rows 2..=9 across every used column.

use crate::model::workbook::{
    AxisOptions, CellRange, ChartAnchor, ChartId, ChartSpec, ChartType, LegendPosition,
    TextPosition,
};
use crate::repo::workbook_repo::{RepoResult, WorkbookRepository};
use log::info;

/// First summary row included in the chart (date header).
pub const CHART_FIRST_ROW: u32 = 2;
/// Date header plus seven behavior rows.
pub const CHART_ROW_COUNT: u32 = 8;
pub const CHART_TITLE: &str = "Behavior Trends Over Time";

const AXIS_BASELINE_COLOR: &str = "#000000";
const CHART_ANCHOR: ChartAnchor = ChartAnchor {
    row: 11,
    col: 9,
    offset_x: 0,
    offset_y: 0,
};

/// Builds the chart definition for a summary sheet whose last used column is
/// `last_column`.
pub fn trend_chart_spec(last_column: u32) -> ChartSpec {
    ChartSpec {
        chart_type: ChartType::Line,
        data_range: CellRange::from_origin(CHART_FIRST_ROW, 1, CHART_ROW_COUNT, last_column),
        transpose_rows_and_columns: true,
        title: CHART_TITLE.to_string(),
        legend: LegendPosition::Right,
        h_axis: axis("Date", None),
        v_axis: axis("Count", Some(0.0)),
        anchor: CHART_ANCHOR,
    }
}

fn axis(title: &str, min_value: Option<f64>) -> AxisOptions {
    AxisOptions {
        title: title.to_string(),
        min_value,
        baseline_color: AXIS_BASELINE_COLOR.to_string(),
        text_position: TextPosition::Out,
        gridline_color: None,
        ticks: Vec::new(),
    }
}

/// Replaces every chart on the summary sheet with one trend chart.
pub struct ChartRenderer<'a> {
    summary_sheet: &'a str,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(summary_sheet: &'a str) -> Self {
        Self { summary_sheet }
    }

    /// Removes existing charts and inserts the trend chart.
    ///
    /// Returns the id of the inserted chart.
    pub fn render<R: WorkbookRepository>(&self, repo: &R) -> RepoResult<ChartId> {
        let existing = repo.charts(self.summary_sheet)?;
        for chart in &existing {
            repo.remove_chart(self.summary_sheet, chart.id)?;
        }

        let last_column = repo.last_column(self.summary_sheet)?;
        let spec = trend_chart_spec(last_column);
        let id = repo.insert_chart(self.summary_sheet, &spec)?;
        info!(
            "event=chart_render module=service status=ok sheet={} removed={} range={}",
            self.summary_sheet,
            existing.len(),
            spec.data_range
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::trend_chart_spec;
    use crate::model::workbook::{ChartType, LegendPosition};

    #[test]
    fn spec_spans_eight_rows_and_all_columns() {
        let spec = trend_chart_spec(11);
        assert_eq!(spec.data_range.to_a1(), "A2:K9");
        assert_eq!(spec.chart_type, ChartType::Line);
        assert!(spec.transpose_rows_and_columns);
        assert_eq!(spec.legend, LegendPosition::Right);
        assert_eq!(spec.v_axis.min_value, Some(0.0));
        assert!(spec.h_axis.gridline_color.is_none());
        assert!(spec.h_axis.ticks.is_empty());
    }

    #[test]
    fn empty_summary_still_yields_one_column() {
        assert_eq!(trend_chart_spec(0).data_range.to_a1(), "A2:A9");
    }
}
