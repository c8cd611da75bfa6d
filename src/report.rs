//! HTML rendering for the profiler page.
//!
//! One self-contained page: inline CSS, inline JS, inline SVG charts. The
//! shell is served once; every interaction re-posts the file and receives a
//! freshly computed report fragment for the main area.

use std::fmt::Write;

use serde_json::json;
use tracing::warn;

use crate::charts;
use crate::charts::escape;
use crate::domain::{
    DisplayMode, ProfilerError, ReportConfig, Strategy, DEFAULT_HISTOGRAM_COLUMNS, HISTOGRAM_BINS,
    MAX_FILESIZE_MB, PREVIEW_ROWS, SCATTER_POINT_LIMIT, VALUE_COUNT_LIMIT,
};
use crate::model::{NumericSummary, Profile};

/// Resolved control state of one report request.
#[derive(Debug, Default)]
pub struct ReportState {
    pub strategy: Strategy,
    pub mode: DisplayMode,
    pub minimal_checkbox: bool,
    pub sheet: Option<String>,
    pub hist_columns: Vec<String>,
    pub cat_column: Option<String>,
    pub scatter_x: Option<String>,
    pub scatter_y: Option<String>,
    pub scatter_color: Option<String>,
    pub corr_table: bool,
}

impl ReportState {
    pub fn config(&self) -> ReportConfig {
        self.mode.resolve(self.minimal_checkbox)
    }
}

/// The report fragment swapped into the main area.
pub fn render_report(profile: &Profile, state: &ReportState) -> String {
    let config = state.config();
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<p class="dataset-info"><strong>Dataset loaded:</strong> {name}{sheet}</p><p class="dataset-info"><strong>Dimensions:</strong> {rows} rows × {cols} columns</p>"#,
        name = escape(&profile.filename),
        sheet = profile
            .sheet
            .as_ref()
            .map(|s| format!(" (sheet: {})", escape(s)))
            .unwrap_or_default(),
        rows = profile.n_rows,
        cols = profile.n_cols,
    );

    let body = match state.strategy {
        Strategy::Auto => match render_auto_body(profile, config) {
            Ok(body) => body,
            Err(e) => {
                // Same recovery the reference page performs: an error note,
                // a hint, and the basic summary.
                warn!("Report generation failed: {e}");
                format!(
                    r#"<div class="error">Report generation failed: {msg}</div><div class="info">Try the Minimal mode if the problem persists.</div>{summary}"#,
                    msg = escape(&e.to_string()),
                    summary = basic_summary(profile),
                )
            }
        },
        Strategy::Manual => render_manual_body(profile, state, config),
    };
    html.push_str(&body);
    html.push_str(&render_meta(profile, state));
    html
}

/// Inline error fragment shown in the report area.
pub fn render_error(message: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, escape(message))
}

// ---------------------------------------------------------------- strategies

/// The delegated path: a full profiling report driven only by the two depth
/// flags.
fn render_auto_body(profile: &Profile, config: ReportConfig) -> Result<String, ProfilerError> {
    if profile.n_rows == 0 {
        return Err(ProfilerError::Report(
            "the dataset has no rows to profile".to_string(),
        ));
    }

    let mut html = String::new();
    html.push_str(r#"<h2>Data Profiling Report</h2>"#);

    // Overview cards
    let total_cells = profile.n_rows * profile.n_cols;
    let missing_cells: usize = profile.columns.iter().map(|c| c.null_count).sum();
    let missing_pct = if total_cells == 0 {
        0.0
    } else {
        missing_cells as f64 * 100.0 / total_cells as f64
    };
    let _ = write!(
        html,
        r#"<div class="cards">{}{}{}{}{}</div>"#,
        card("Rows", &profile.n_rows.to_string()),
        card("Columns", &profile.n_cols.to_string()),
        card(
            "Missing cells",
            &format!("{} ({:.1}%)", missing_cells, missing_pct)
        ),
        card("Numeric columns", &profile.numeric_columns().len().to_string()),
        card(
            "Categorical columns",
            &profile.categorical_columns().len().to_string()
        ),
    );

    // Per-variable sections
    html.push_str(r#"<h3>Variables</h3>"#);
    let describe = profile.describe();
    for column in &profile.columns {
        let _ = write!(
            html,
            r#"<div class="variable"><h4>{name} <span class="dtype">{dtype}</span></h4>"#,
            name = escape(&column.name),
            dtype = escape(&column.dtype),
        );
        let _ = write!(
            html,
            r#"<table class="kv"><tr><td>Distinct</td><td>{unique}</td></tr><tr><td>Missing</td><td>{nulls} ({pct}%)</td></tr>"#,
            unique = column.unique,
            nulls = column.null_count,
            pct = column.null_pct,
        );
        if column.numeric {
            if let Some(s) = describe.iter().find(|s| s.name == column.name) {
                let _ = write!(
                    html,
                    r#"<tr><td>Mean</td><td>{}</td></tr><tr><td>Std</td><td>{}</td></tr><tr><td>Min</td><td>{}</td></tr><tr><td>Max</td><td>{}</td></tr>"#,
                    fmt_opt(s.mean),
                    fmt_opt(s.std),
                    fmt_opt(s.min),
                    fmt_opt(s.max),
                );
            }
        }
        html.push_str("</table>");

        if !config.minimal {
            if column.numeric {
                if let Some(hist) = profile.histogram(&column.name, HISTOGRAM_BINS) {
                    html.push_str(&charts::histogram(&hist));
                }
                if config.explorative {
                    if let Some(stats) = profile.box_stats(&column.name) {
                        html.push_str(&charts::box_plot(&stats));
                    }
                }
            } else if let Some(counts) = profile.value_counts(&column.name, VALUE_COUNT_LIMIT) {
                if !counts.is_empty() {
                    html.push_str(&value_counts_table(&counts));
                }
            }
        }
        html.push_str("</div>");
    }

    // Correlations
    if !config.minimal {
        let (names, matrix) = profile.correlation();
        if names.len() >= 2 {
            html.push_str(r#"<h3>Correlations</h3>"#);
            html.push_str(&charts::heatmap("Pearson correlation", &names, &matrix));
            if config.explorative {
                html.push_str(&correlation_table(&names, &matrix));
            }
        }
    }

    Ok(html)
}

/// The hand-rolled dashboard: fixed sequence of views, user-selected charts.
fn render_manual_body(profile: &Profile, state: &ReportState, config: ReportConfig) -> String {
    let mut html = String::new();

    // Always: preview, column info, descriptive statistics
    html.push_str(r#"<h3>Data preview</h3>"#);
    html.push_str(&preview_table(profile));
    html.push_str(r#"<h3>Column information</h3>"#);
    html.push_str(&column_info_table(profile));
    html.push_str(r#"<h3>Descriptive statistics</h3>"#);
    html.push_str(&describe_table(&profile.describe()));

    if config.minimal {
        return html;
    }

    // Missing values
    html.push_str(r#"<h3>Missing values</h3>"#);
    let missing = profile.missing();
    if missing.is_empty() {
        html.push_str(r#"<div class="success">No missing values in this dataset.</div>"#);
    } else {
        html.push_str(&charts::bar_chart("Missing values per column", &missing, "%"));
    }

    // Histograms of the selected numeric columns (default: first four)
    let numeric = profile.numeric_columns();
    if !numeric.is_empty() {
        html.push_str(r#"<h3>Distributions</h3>"#);
        let selected: Vec<&str> = if state.hist_columns.is_empty() {
            numeric
                .iter()
                .take(DEFAULT_HISTOGRAM_COLUMNS)
                .map(|c| c.name.as_str())
                .collect()
        } else {
            state
                .hist_columns
                .iter()
                .filter(|n| numeric.iter().any(|c| &c.name == *n))
                .map(|n| n.as_str())
                .collect()
        };
        for name in &selected {
            if let Some(hist) = profile.histogram(name, HISTOGRAM_BINS) {
                html.push_str(&charts::histogram(&hist));
            }
        }
        if config.explorative {
            html.push_str(r#"<h3>Box plots</h3>"#);
            for name in &selected {
                if let Some(stats) = profile.box_stats(name) {
                    html.push_str(&charts::box_plot(&stats));
                }
            }
        }
    }

    // Correlation heatmap (+ table in explorative mode)
    let (names, matrix) = profile.correlation();
    if names.len() >= 2 {
        html.push_str(r#"<h3>Correlation</h3>"#);
        html.push_str(&charts::heatmap("Pearson correlation", &names, &matrix));
        if config.explorative && state.corr_table {
            html.push_str(&correlation_table(&names, &matrix));
        }
    }

    // Categorical value counts + pie chart
    let categorical = profile.categorical_columns();
    if !categorical.is_empty() {
        let cat_name = state
            .cat_column
            .as_deref()
            .filter(|n| categorical.iter().any(|c| &c.name == n))
            .unwrap_or(categorical[0].name.as_str());
        if let Some(counts) = profile.value_counts(cat_name, VALUE_COUNT_LIMIT) {
            if !counts.is_empty() {
                let _ = write!(html, r#"<h3>Value counts: {}</h3>"#, escape(cat_name));
                html.push_str(&value_counts_table(&counts));
                html.push_str(&charts::pie_chart(
                    &format!("Top values of {cat_name}"),
                    &counts,
                ));
            }
        }
    }

    // Scatter plot, explorative only, needs two numeric columns
    if config.explorative && numeric.len() >= 2 {
        let x = state
            .scatter_x
            .as_deref()
            .filter(|n| numeric.iter().any(|c| &c.name == n))
            .unwrap_or(numeric[0].name.as_str());
        let y = state
            .scatter_y
            .as_deref()
            .filter(|n| numeric.iter().any(|c| &c.name == n))
            .unwrap_or(numeric[1].name.as_str());
        let color = state
            .scatter_color
            .as_deref()
            .filter(|n| categorical.iter().any(|c| &c.name == n));
        if let Some(points) = profile.scatter(x, y, color, SCATTER_POINT_LIMIT) {
            html.push_str(r#"<h3>Scatter plot</h3>"#);
            html.push_str(&charts::scatter_plot(
                &format!("{y} over {x}"),
                x,
                y,
                &points,
            ));
        }
    }

    html
}

/// Head rows + dtype/null table + describe. Shown alone when the auto report
/// cannot be generated.
pub fn basic_summary(profile: &Profile) -> String {
    format!(
        r#"<h3>Data preview</h3>{}<h3>Column information</h3>{}<h3>Descriptive statistics</h3>{}"#,
        preview_table(profile),
        column_info_table(profile),
        describe_table(&profile.describe()),
    )
}

// ------------------------------------------------------------------- tables

fn preview_table(profile: &Profile) -> String {
    let (header, rows) = profile.preview(PREVIEW_ROWS);
    let mut html = String::from(r#"<table class="data"><thead><tr>"#);
    for name in &header {
        let _ = write!(html, "<th>{}</th>", escape(name));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape(cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn column_info_table(profile: &Profile) -> String {
    let mut html = String::from(
        r#"<table class="data"><thead><tr><th>Column</th><th>Type</th><th>Non-null Count</th><th>Null Count</th><th>Null %</th><th>Unique</th></tr></thead><tbody>"#,
    );
    for c in &profile.columns {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&c.name),
            escape(&c.dtype),
            c.non_null,
            c.null_count,
            c.null_pct,
            c.unique,
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn describe_table(stats: &[NumericSummary]) -> String {
    if stats.is_empty() {
        return r#"<div class="info">No numeric columns to describe.</div>"#.to_string();
    }
    let mut html = String::from(
        r#"<table class="data"><thead><tr><th></th><th>count</th><th>mean</th><th>std</th><th>min</th><th>25%</th><th>50%</th><th>75%</th><th>max</th></tr></thead><tbody>"#,
    );
    for s in stats {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&s.name),
            s.count,
            fmt_opt(s.mean),
            fmt_opt(s.std),
            fmt_opt(s.min),
            fmt_opt(s.q25),
            fmt_opt(s.median),
            fmt_opt(s.q75),
            fmt_opt(s.max),
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn value_counts_table(counts: &[(String, usize, f64)]) -> String {
    let mut html = String::from(
        r#"<table class="data"><thead><tr><th>Value</th><th>Count</th><th>%</th></tr></thead><tbody>"#,
    );
    for (value, count, pct) in counts {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(value),
            count,
            pct,
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn correlation_table(names: &[String], matrix: &[Vec<Option<f64>>]) -> String {
    let mut html = String::from(r#"<table class="data"><thead><tr><th></th>"#);
    for name in names {
        let _ = write!(html, "<th>{}</th>", escape(name));
    }
    html.push_str("</tr></thead><tbody>");
    for (i, row) in matrix.iter().enumerate() {
        let _ = write!(html, "<tr><td>{}</td>", escape(&names[i]));
        for value in row {
            match value {
                Some(r) => {
                    let _ = write!(html, "<td>{r:.2}</td>");
                }
                None => html.push_str("<td>n/a</td>"),
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn card(label: &str, value: &str) -> String {
    format!(
        r#"<div class="card"><div class="card-value">{}</div><div class="card-label">{}</div></div>"#,
        escape(value),
        escape(label),
    )
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            if v == v.trunc() && v.abs() < 1e12 {
                format!("{v:.1}")
            } else {
                format!("{v:.2}")
            }
        }
        _ => "NaN".to_string(),
    }
}

/// Metadata block the sidebar JS reads to (re)populate its selects.
fn render_meta(profile: &Profile, state: &ReportState) -> String {
    let meta = json!({
        "sheets": profile.sheets,
        "sheet": profile.sheet,
        "numeric": profile.numeric_columns().iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
        "categorical": profile.categorical_columns().iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
        "strategy": state.strategy.as_param(),
        "mode": state.mode.as_param(),
    });
    format!(
        r#"<script type="application/json" id="report-meta">{meta}</script>"#
    )
}

// -------------------------------------------------------------------- shell

/// The landing page: sidebar with all controls, empty report area, inline
/// CSS and JS.
pub fn render_index() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Data Profiler</title>
<style>{css}</style>
</head>
<body>
<div class="layout">
<aside class="sidebar">
  <h2>Data Profiler</h2>
  <label class="field">Upload .csv, .xlsx files not exceeding {max:.0} MB
    <input type="file" id="file" accept=".csv,.xlsx">
  </label>
  <div class="field">
    <span class="field-title">Report strategy</span>
    <label><input type="radio" name="strategy" value="auto" checked> Profile report</label>
    <label><input type="radio" name="strategy" value="manual"> Dashboard</label>
  </div>
  <div class="field">
    <label><input type="checkbox" id="minimal"> Do you want minimal report ?</label>
  </div>
  <div class="field">
    <span class="field-title">Display mode</span>
    <label><input type="radio" name="mode" value="standard" checked> Standard</label>
    <label><input type="radio" name="mode" value="minimal"> Minimal</label>
    <label><input type="radio" name="mode" value="explorative"> Explorative</label>
  </div>
  <div class="field hidden" id="sheet-field">
    <span class="field-title">Select the sheet</span>
    <select id="sheet"></select>
  </div>
  <div class="hidden" id="manual-config">
    <div class="field">
      <span class="field-title">Histogram columns</span>
      <select id="hist" multiple size="4"></select>
    </div>
    <div class="field">
      <span class="field-title">Categorical column</span>
      <select id="cat"></select>
    </div>
    <div class="field hidden" id="explorative-config">
      <span class="field-title">Scatter plot</span>
      <select id="x"></select>
      <select id="y"></select>
      <select id="color"></select>
      <label><input type="checkbox" id="corr_table"> Show correlation table</label>
    </div>
  </div>
</aside>
<main id="report">
  <h1>Data Profiler</h1>
  <div class="info">Upload your data in the left sidebar to generate profiling</div>
  <h3>How to use this tool</h3>
  <ol>
    <li><strong>Upload</strong>: pick a CSV or Excel file in the sidebar</li>
    <li><strong>Configure</strong>: choose strategy and display mode</li>
    <li><strong>Analyze</strong>: the report regenerates on every change</li>
  </ol>
  <h3>Available modes</h3>
  <ul>
    <li><strong>Standard</strong>: complete report with all analyses</li>
    <li><strong>Minimal</strong>: fast report with the essentials</li>
    <li><strong>Explorative</strong>: detailed report with extended analyses</li>
  </ul>
  <h3>Supported formats</h3>
  <ul>
    <li>CSV (*.csv)</li>
    <li>Excel (*.xlsx)</li>
    <li>Maximum size: {max:.0} MB</li>
  </ul>
</main>
</div>
<script>{js}</script>
</body>
</html>"#,
        max = MAX_FILESIZE_MB,
        css = inline_css(),
        js = inline_js(),
    )
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; color: #1d1d1f; background: #f5f5f7; line-height: 1.5; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 300px; flex-shrink: 0; background: #ffffff; border-right: 1px solid #d2d2d7; padding: 1.25rem; }
.sidebar h2 { margin-bottom: 1rem; font-size: 1.2rem; }
.field { display: block; margin-bottom: 1rem; font-size: 0.875rem; }
.field label { display: block; margin: 0.15rem 0; }
.field-title { display: block; font-weight: 600; margin-bottom: 0.25rem; }
.field select { width: 100%; padding: 0.25rem; margin-bottom: 0.3rem; }
.hidden { display: none; }
main { flex: 1; padding: 2rem; max-width: 1100px; }
main h1 { margin-bottom: 1rem; }
main h3 { margin: 1.5rem 0 0.5rem; }
main ol, main ul { margin-left: 1.5rem; }
.dataset-info { margin-bottom: 0.25rem; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 0.75rem; margin: 1rem 0; }
.card { background: #ffffff; border-radius: 0.5rem; padding: 0.75rem; border-left: 4px solid #007aff; }
.card-value { font-size: 1.3rem; font-weight: 700; }
.card-label { color: #6e6e73; font-size: 0.8rem; }
.variable { background: #ffffff; border-radius: 0.5rem; padding: 1rem; margin-bottom: 1rem; }
.variable .dtype { color: #6e6e73; font-weight: 400; font-size: 0.85rem; }
table.data { border-collapse: collapse; background: #ffffff; margin: 0.5rem 0 1rem; font-size: 0.85rem; }
table.data th, table.data td { border: 1px solid #e5e5ea; padding: 0.35rem 0.6rem; text-align: left; }
table.data th { background: #f5f5f7; }
table.kv { font-size: 0.85rem; margin: 0.5rem 0; }
table.kv td { padding: 0.1rem 0.75rem 0.1rem 0; color: #3a3a3c; }
svg { background: #ffffff; border-radius: 0.5rem; margin: 0.5rem 0; max-width: 100%; height: auto; }
.error { background: #ffecec; border-left: 4px solid #ff3b30; padding: 0.75rem 1rem; border-radius: 0.25rem; margin: 0.75rem 0; }
.success { background: #e9f9ee; border-left: 4px solid #34c759; padding: 0.75rem 1rem; border-radius: 0.25rem; margin: 0.75rem 0; }
.info { background: #eef4ff; border-left: 4px solid #007aff; padding: 0.75rem 1rem; border-radius: 0.25rem; margin: 0.75rem 0; }
.spinner { color: #6e6e73; margin: 1rem 0; }
"#
}

fn inline_js() -> &'static str {
    r#"
(function () {
  'use strict';
  var held = null; // the uploaded File, kept for re-posting on every change

  function $(id) { return document.getElementById(id); }
  function radio(name) {
    var el = document.querySelector('input[name="' + name + '"]:checked');
    return el ? el.value : '';
  }
  function selected(sel) {
    return Array.from(sel.selectedOptions).map(function (o) { return o.value; });
  }

  function params() {
    var p = new URLSearchParams();
    p.set('filename', held.name);
    p.set('strategy', radio('strategy'));
    p.set('mode', radio('mode'));
    p.set('minimal', $('minimal').checked);
    if ($('sheet').value) p.set('sheet', $('sheet').value);
    var hist = selected($('hist'));
    if (hist.length) p.set('hist', hist.join(','));
    if ($('cat').value) p.set('cat', $('cat').value);
    if ($('x').value) p.set('x', $('x').value);
    if ($('y').value) p.set('y', $('y').value);
    if ($('color').value) p.set('color', $('color').value);
    p.set('corr_table', $('corr_table').checked);
    return p;
  }

  function fillSelect(sel, options, keep, empty) {
    var current = sel.value;
    sel.innerHTML = '';
    if (empty) sel.appendChild(new Option('(none)', ''));
    options.forEach(function (o) { sel.appendChild(new Option(o, o)); });
    if (keep && (options.indexOf(current) >= 0 || current === '')) sel.value = current;
  }

  function syncSidebar() {
    var node = $('report-meta');
    if (!node) return;
    var meta = JSON.parse(node.textContent);
    $('sheet-field').classList.toggle('hidden', meta.sheets.length === 0);
    fillSelect($('sheet'), meta.sheets, true, false);
    if (meta.sheet) $('sheet').value = meta.sheet;
    fillSelect($('hist'), meta.numeric, true, false);
    fillSelect($('cat'), meta.categorical, true, false);
    fillSelect($('x'), meta.numeric, true, false);
    fillSelect($('y'), meta.numeric, true, false);
    fillSelect($('color'), meta.categorical, true, true);
    $('manual-config').classList.toggle('hidden', radio('strategy') !== 'manual');
    $('explorative-config').classList.toggle('hidden', radio('mode') !== 'explorative');
  }

  function regenerate() {
    if (!held) return;
    var report = $('report');
    report.innerHTML = '<div class="spinner">Generating Report...</div>';
    fetch('/report?' + params().toString(), { method: 'POST', body: held })
      .then(function (res) { return res.text(); })
      .then(function (html) {
        report.innerHTML = html;
        syncSidebar();
      })
      .catch(function (err) {
        report.innerHTML = '<div class="error">' + err + '</div>';
      });
  }

  $('file').addEventListener('change', function (e) {
    held = e.target.files[0] || null;
    regenerate();
  });
  document.querySelectorAll('.sidebar input, .sidebar select').forEach(function (el) {
    if (el.id === 'file') return;
    el.addEventListener('change', regenerate);
  });
})();
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{load_table, Profile, UploadedFile};

    fn profile(content: &str) -> Profile {
        let file = UploadedFile::new("data.csv", content.as_bytes().to_vec());
        let table = load_table(&file, None).unwrap();
        Profile::from_table(&file.filename, &table).unwrap()
    }

    fn state(strategy: Strategy, mode: DisplayMode) -> ReportState {
        ReportState {
            strategy,
            mode,
            ..ReportState::default()
        }
    }

    const SAMPLE: &str = "age,income,city\n30,1000,Rome\n40,2000,Paris\n25,1500,Rome\n";

    #[test]
    fn manual_report_always_has_core_tables() {
        let p = profile(SAMPLE);
        let html = render_report(&p, &state(Strategy::Manual, DisplayMode::Minimal));
        assert!(html.contains("Data preview"));
        assert!(html.contains("Column information"));
        assert!(html.contains("Descriptive statistics"));
        // Minimal mode stops there
        assert!(!html.contains("Missing values"));
        assert!(!html.contains("Distribution of"));
    }

    #[test]
    fn complete_data_shows_success_instead_of_missing_chart() {
        let p = profile(SAMPLE);
        let html = render_report(&p, &state(Strategy::Manual, DisplayMode::Standard));
        assert!(html.contains("No missing values in this dataset."));
        assert!(!html.contains("Missing values per column"));
    }

    #[test]
    fn missing_chart_when_nulls_present() {
        let p = profile("age,city\n30,Rome\n,Paris\n25,Rome\n");
        let html = render_report(&p, &state(Strategy::Manual, DisplayMode::Standard));
        assert!(html.contains("Missing values per column"));
        assert!(!html.contains("No missing values"));
    }

    #[test]
    fn explorative_unlocks_boxplots_scatter_and_corr_table() {
        let p = profile(SAMPLE);
        let mut st = state(Strategy::Manual, DisplayMode::Explorative);
        st.corr_table = true;
        let html = render_report(&p, &st);
        assert!(html.contains("Box plots"));
        assert!(html.contains("Scatter plot"));
        assert!(html.contains("Pearson correlation"));

        let html = render_report(&p, &state(Strategy::Manual, DisplayMode::Standard));
        assert!(!html.contains("Box plots"));
        assert!(!html.contains("Scatter plot"));
    }

    #[test]
    fn scatter_needs_two_numeric_columns() {
        let p = profile("v,city\n1,Rome\n2,Paris\n");
        let html = render_report(&p, &state(Strategy::Manual, DisplayMode::Explorative));
        assert!(!html.contains("Scatter plot"));
    }

    #[test]
    fn auto_report_has_overview_and_variables() {
        let p = profile(SAMPLE);
        let html = render_report(&p, &state(Strategy::Auto, DisplayMode::Standard));
        assert!(html.contains("Data Profiling Report"));
        assert!(html.contains("Variables"));
        assert!(html.contains("Missing cells"));
        assert!(html.contains("Correlations"));
    }

    #[test]
    fn auto_minimal_skips_charts_and_correlations() {
        let p = profile(SAMPLE);
        let html = render_report(&p, &state(Strategy::Auto, DisplayMode::Minimal));
        assert!(!html.contains("Correlations"));
        assert!(!html.contains("Distribution of"));
    }

    #[test]
    fn auto_report_falls_back_to_basic_summary_on_failure() {
        // Header-only CSV: nothing to profile, so the auto path degrades to
        // the inline summary.
        let p = profile("a,b\n");
        let html = render_report(&p, &state(Strategy::Auto, DisplayMode::Standard));
        assert!(html.contains("Report generation failed"));
        assert!(html.contains("Try the Minimal mode"));
        assert!(html.contains("Data preview"));
        assert!(html.contains("Column information"));
    }

    #[test]
    fn value_counts_listed_for_categorical_column() {
        let p = profile(SAMPLE);
        let mut st = state(Strategy::Manual, DisplayMode::Standard);
        st.cat_column = Some("city".to_string());
        let html = render_report(&p, &st);
        assert!(html.contains("Value counts: city"));
        assert!(html.contains("Rome"));
    }

    #[test]
    fn report_embeds_sidebar_metadata() {
        let p = profile(SAMPLE);
        let html = render_report(&p, &state(Strategy::Manual, DisplayMode::Standard));
        assert!(html.contains(r#"id="report-meta""#));
        assert!(html.contains(r#""numeric":["age","income"]"#));
        assert!(html.contains(r#""categorical":["city"]"#));
    }

    #[test]
    fn index_page_lists_controls() {
        let html = render_index();
        assert!(html.contains("Upload your data in the left sidebar"));
        assert!(html.contains(r#"value="standard""#));
        assert!(html.contains(r#"value="minimal""#));
        assert!(html.contains(r#"value="explorative""#));
        assert!(html.contains(r#"id="sheet""#));
    }

    #[test]
    fn error_fragment_is_escaped() {
        let html = render_error("bad <file>");
        assert!(html.contains("error"));
        assert!(html.contains("bad &lt;file&gt;"));
    }
}
