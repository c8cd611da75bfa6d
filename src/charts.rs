//! Inline SVG chart builders for the report page.
//!
//! Every chart is a self-contained `<svg>` string, no external assets or
//! scripts involved.

use std::fmt::Write;

use crate::model::{BoxStats, Histogram, ScatterPoint};

const PALETTE: [&str; 10] = [
    "#007aff", "#ff9f0a", "#34c759", "#ff3b30", "#5856d6", "#af52de", "#ffcc00", "#00c7be",
    "#8e8e93", "#a2845e",
];

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 280.0;
const MARGIN_LEFT: f64 = 120.0;
const MARGIN_BOTTOM: f64 = 30.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_RIGHT: f64 = 20.0;

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn short_label(label: &str, max: usize) -> String {
    if label.chars().count() > max {
        let mut s: String = label.chars().take(max - 1).collect();
        s.push('…');
        s
    } else {
        label.to_string()
    }
}

fn fmt_num(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let a = v.abs();
    if a >= 1000.0 {
        format!("{v:.0}")
    } else if a >= 1.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.3}")
    }
}

/// Horizontal bar chart, one bar per label. Used for missing-value shares
/// (values in percent).
pub fn bar_chart(title: &str, bars: &[(String, f64)], unit: &str) -> String {
    let bar_h = 22.0;
    let gap = 8.0;
    let height = MARGIN_TOP + bars.len() as f64 * (bar_h + gap) + 10.0;
    let plot_w = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT - 70.0;
    let max = bars.iter().map(|b| b.1).fold(f64::MIN, f64::max).max(1e-9);

    let mut svg = svg_open(CHART_WIDTH, height, title);
    for (i, (label, value)) in bars.iter().enumerate() {
        let y = MARGIN_TOP + i as f64 * (bar_h + gap);
        let w = (value / max) * plot_w;
        let _ = write!(
            svg,
            r#"<text x="{lx}" y="{ty:.1}" class="label" text-anchor="end">{label}</text><rect x="{bx}" y="{y:.1}" width="{w:.1}" height="{h}" fill="{color}" rx="3"/><text x="{vx:.1}" y="{ty:.1}" class="value">{value}{unit}</text>"#,
            lx = MARGIN_LEFT - 8.0,
            ty = y + bar_h * 0.7,
            label = escape(&short_label(label, 16)),
            bx = MARGIN_LEFT,
            h = bar_h,
            color = PALETTE[0],
            vx = MARGIN_LEFT + w + 6.0,
            value = fmt_num(*value),
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Vertical histogram of a numeric column.
pub fn histogram(hist: &Histogram) -> String {
    let title = format!("Distribution of {}", hist.name);
    let plot_w = CHART_WIDTH - 60.0 - MARGIN_RIGHT;
    let plot_h = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let max = hist.counts.iter().copied().max().unwrap_or(1).max(1) as f64;
    let bin_w = plot_w / hist.counts.len() as f64;

    let mut svg = svg_open(CHART_WIDTH, CHART_HEIGHT, &title);
    for (i, &count) in hist.counts.iter().enumerate() {
        let h = count as f64 / max * plot_h;
        let x = 60.0 + i as f64 * bin_w;
        let y = MARGIN_TOP + plot_h - h;
        let _ = write!(
            svg,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{color}" opacity="0.85"><title>[{lo}, {hi}): {count}</title></rect>"#,
            w = (bin_w - 1.0).max(1.0),
            color = PALETTE[0],
            lo = fmt_num(hist.edges[i]),
            hi = fmt_num(hist.edges[i + 1]),
        );
    }
    // x axis end labels, y axis max
    let _ = write!(
        svg,
        r#"<text x="60" y="{by}" class="label">{lo}</text><text x="{rx}" y="{by}" class="label" text-anchor="end">{hi}</text><text x="54" y="{ty}" class="label" text-anchor="end">{max}</text><line x1="60" y1="{ay:.1}" x2="{rx}" y2="{ay:.1}" class="axis"/>"#,
        by = CHART_HEIGHT - 8.0,
        lo = fmt_num(hist.edges[0]),
        rx = 60.0 + plot_w,
        hi = fmt_num(*hist.edges.last().unwrap_or(&0.0)),
        ty = MARGIN_TOP + 10.0,
        max = max as usize,
        ay = MARGIN_TOP + plot_h,
    );
    svg.push_str("</svg>");
    svg
}

/// Horizontal box plot with IQR whiskers.
pub fn box_plot(stats: &BoxStats) -> String {
    let title = format!("Box plot of {}", stats.name);
    let height = 120.0;
    let plot_x = 60.0;
    let plot_w = CHART_WIDTH - plot_x - MARGIN_RIGHT;
    let span = (stats.max - stats.min).max(1e-9);
    let sx = |v: f64| plot_x + (v - stats.min) / span * plot_w;
    let cy = 55.0;
    let box_h = 40.0;

    let mut svg = svg_open(CHART_WIDTH, height, &title);
    let _ = write!(
        svg,
        r#"<line x1="{wl:.1}" y1="{cy}" x2="{q1:.1}" y2="{cy}" class="axis"/><line x1="{q3:.1}" y1="{cy}" x2="{wh:.1}" y2="{cy}" class="axis"/><line x1="{wl:.1}" y1="{t:.1}" x2="{wl:.1}" y2="{b:.1}" class="axis"/><line x1="{wh:.1}" y1="{t:.1}" x2="{wh:.1}" y2="{b:.1}" class="axis"/><rect x="{q1:.1}" y="{ry:.1}" width="{rw:.1}" height="{box_h}" fill="{color}" opacity="0.4" stroke="{color}"/><line x1="{med:.1}" y1="{ry:.1}" x2="{med:.1}" y2="{rb:.1}" stroke="{color}" stroke-width="2"/>"#,
        wl = sx(stats.whisker_low),
        q1 = sx(stats.q1),
        q3 = sx(stats.q3),
        wh = sx(stats.whisker_high),
        t = cy - box_h / 4.0,
        b = cy + box_h / 4.0,
        ry = cy - box_h / 2.0,
        rb = cy + box_h / 2.0,
        rw = (sx(stats.q3) - sx(stats.q1)).max(1.0),
        med = sx(stats.median),
        color = PALETTE[0],
    );
    let _ = write!(
        svg,
        r#"<text x="{lx}" y="{ly}" class="label">{min}</text><text x="{rx}" y="{ly}" class="label" text-anchor="end">{max}</text><text x="{mx:.1}" y="{my}" class="label" text-anchor="middle">median {median}</text><text x="{lx}" y="{oy}" class="label">{outliers} outlier(s) beyond whiskers</text>"#,
        lx = plot_x,
        ly = height - 28.0,
        min = fmt_num(stats.min),
        rx = plot_x + plot_w,
        max = fmt_num(stats.max),
        mx = sx(stats.median),
        my = cy - box_h / 2.0 - 6.0,
        median = fmt_num(stats.median),
        oy = height - 10.0,
        outliers = stats.outliers,
    );
    svg.push_str("</svg>");
    svg
}

/// Correlation heatmap. `None` cells render hatched grey.
pub fn heatmap(title: &str, names: &[String], matrix: &[Vec<Option<f64>>]) -> String {
    let n = names.len();
    if n == 0 {
        return String::new();
    }
    let cell = (420.0 / n as f64).min(60.0);
    let left = 110.0;
    let top = 30.0;
    let width = left + n as f64 * cell + MARGIN_RIGHT;
    let height = top + n as f64 * cell + 90.0;

    let mut svg = svg_open(width, height, title);
    for (i, row) in matrix.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{lx}" y="{ly:.1}" class="label" text-anchor="end">{name}</text>"#,
            lx = left - 6.0,
            ly = top + i as f64 * cell + cell * 0.6,
            name = escape(&short_label(&names[i], 14)),
        );
        for (j, value) in row.iter().enumerate() {
            let x = left + j as f64 * cell;
            let y = top + i as f64 * cell;
            match value {
                Some(r) => {
                    let _ = write!(
                        svg,
                        r##"<rect x="{x:.1}" y="{y:.1}" width="{cell:.1}" height="{cell:.1}" fill="{color}" stroke="#fff"><title>{a} / {b}: {r:.2}</title></rect><text x="{tx:.1}" y="{ty:.1}" class="cell" text-anchor="middle">{r:.2}</text>"##,
                        color = correlation_color(*r),
                        a = escape(&names[i]),
                        b = escape(&names[j]),
                        tx = x + cell / 2.0,
                        ty = y + cell * 0.6,
                    );
                }
                None => {
                    let _ = write!(
                        svg,
                        r##"<rect x="{x:.1}" y="{y:.1}" width="{cell:.1}" height="{cell:.1}" fill="#e5e5ea" stroke="#fff"><title>{a} / {b}: n/a</title></rect>"##,
                        a = escape(&names[i]),
                        b = escape(&names[j]),
                    );
                }
            }
        }
    }
    for (j, name) in names.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{x:.1}" y="{y:.1}" class="label" transform="rotate(45 {x:.1} {y:.1})">{name}</text>"#,
            x = left + j as f64 * cell + cell * 0.3,
            y = top + n as f64 * cell + 14.0,
            name = escape(&short_label(name, 14)),
        );
    }
    svg.push_str("</svg>");
    svg
}

// Blue for positive, red for negative, white around zero.
fn correlation_color(r: f64) -> String {
    let r = r.clamp(-1.0, 1.0);
    let intensity = (r.abs() * 200.0) as u8;
    if r >= 0.0 {
        format!(
            "rgb({},{},255)",
            255 - intensity as u16,
            255 - intensity as u16
        )
    } else {
        format!(
            "rgb(255,{},{})",
            255 - intensity as u16,
            255 - intensity as u16
        )
    }
}

/// Pie chart of categorical value counts.
pub fn pie_chart(title: &str, counts: &[(String, usize, f64)]) -> String {
    let total: usize = counts.iter().map(|c| c.1).sum();
    if total == 0 {
        return String::new();
    }
    let cx = 170.0;
    let cy = 150.0;
    let radius = 110.0;
    let height = 300.0f64.max(40.0 + counts.len() as f64 * 20.0);

    let mut svg = svg_open(CHART_WIDTH, height, title);
    let mut angle = -std::f64::consts::FRAC_PI_2;
    for (i, (label, count, pct)) in counts.iter().enumerate() {
        let sweep = *count as f64 / total as f64 * std::f64::consts::TAU;
        let color = PALETTE[i % PALETTE.len()];
        if counts.len() == 1 {
            let _ = write!(
                svg,
                r#"<circle cx="{cx}" cy="{cy}" r="{radius}" fill="{color}"/>"#
            );
        } else {
            let (x1, y1) = (cx + radius * angle.cos(), cy + radius * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
            let large = if sweep > std::f64::consts::PI { 1 } else { 0 };
            let _ = write!(
                svg,
                r##"<path d="M{cx},{cy} L{x1:.2},{y1:.2} A{radius},{radius} 0 {large} 1 {x2:.2},{y2:.2} Z" fill="{color}" stroke="#fff"><title>{label}: {count} ({pct}%)</title></path>"##,
                label = escape(label),
            );
        }
        let ly = 40.0 + i as f64 * 20.0;
        let _ = write!(
            svg,
            r#"<rect x="330" y="{ry:.1}" width="12" height="12" fill="{color}"/><text x="348" y="{ty:.1}" class="label">{label} — {count} ({pct}%)</text>"#,
            ry = ly - 10.0,
            ty = ly,
            label = escape(&short_label(label, 24)),
        );
        angle += sweep;
    }
    svg.push_str("</svg>");
    svg
}

/// Scatter plot of two numeric columns, colored by group when present.
pub fn scatter_plot(title: &str, x_name: &str, y_name: &str, points: &[ScatterPoint]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let plot_x = 60.0;
    let plot_w = CHART_WIDTH - plot_x - 150.0;
    let plot_h = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let (mut x_min, mut x_max) = (f64::MAX, f64::MIN);
    let (mut y_min, mut y_max) = (f64::MAX, f64::MIN);
    for p in points {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }
    let x_span = (x_max - x_min).max(1e-9);
    let y_span = (y_max - y_min).max(1e-9);

    // Stable group -> color assignment in first-seen order.
    let mut groups: Vec<String> = Vec::new();
    for p in points {
        if let Some(g) = &p.group {
            if !groups.contains(g) {
                groups.push(g.clone());
            }
        }
    }

    let mut svg = svg_open(CHART_WIDTH, CHART_HEIGHT, title);
    for p in points {
        let color = match &p.group {
            Some(g) => {
                let idx = groups.iter().position(|x| x == g).unwrap_or(0);
                PALETTE[idx % PALETTE.len()]
            }
            None => PALETTE[0],
        };
        let _ = write!(
            svg,
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="3" fill="{color}" opacity="0.7"/>"#,
            cx = plot_x + (p.x - x_min) / x_span * plot_w,
            cy = MARGIN_TOP + plot_h - (p.y - y_min) / y_span * plot_h,
        );
    }
    for (i, g) in groups.iter().enumerate().take(PALETTE.len()) {
        let y = 40.0 + i as f64 * 18.0;
        let _ = write!(
            svg,
            r#"<circle cx="{cx}" cy="{cy:.1}" r="5" fill="{color}"/><text x="{tx}" y="{ty:.1}" class="label">{label}</text>"#,
            cx = plot_x + plot_w + 20.0,
            cy = y - 4.0,
            color = PALETTE[i % PALETTE.len()],
            tx = plot_x + plot_w + 32.0,
            ty = y,
            label = escape(&short_label(g, 14)),
        );
    }
    let _ = write!(
        svg,
        r#"<line x1="{px}" y1="{ay:.1}" x2="{rx:.1}" y2="{ay:.1}" class="axis"/><line x1="{px}" y1="{ty}" x2="{px}" y2="{ay:.1}" class="axis"/><text x="{mx:.1}" y="{by}" class="label" text-anchor="middle">{x_name}</text><text x="16" y="{my:.1}" class="label" transform="rotate(-90 16 {my:.1})" text-anchor="middle">{y_name}</text>"#,
        px = plot_x,
        ay = MARGIN_TOP + plot_h,
        rx = plot_x + plot_w,
        ty = MARGIN_TOP,
        mx = plot_x + plot_w / 2.0,
        by = CHART_HEIGHT - 8.0,
        my = MARGIN_TOP + plot_h / 2.0,
        x_name = escape(x_name),
        y_name = escape(y_name),
    );
    svg.push_str("</svg>");
    svg
}

fn svg_open(width: f64, height: f64, title: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width:.0} {height:.0}" width="{width:.0}" height="{height:.0}" role="img"><style>.label{{font:11px sans-serif;fill:#3a3a3c}}.value{{font:11px sans-serif;fill:#1d1d1f}}.cell{{font:10px sans-serif;fill:#1d1d1f}}.title{{font:600 13px sans-serif;fill:#1d1d1f}}.axis{{stroke:#8e8e93;stroke-width:1}}</style><text x="8" y="14" class="title">{title}</text>"#,
        title = escape(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Histogram;

    #[test]
    fn bar_chart_renders_one_rect_per_bar() {
        let bars = vec![("age".to_string(), 33.33), ("city".to_string(), 10.0)];
        let svg = bar_chart("Missing values", &bars, "%");
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("Missing values"));
        assert!(svg.contains("33.33"));
    }

    #[test]
    fn histogram_renders_all_bins() {
        let hist = Histogram {
            name: "v".to_string(),
            edges: vec![0.0, 1.0, 2.0, 3.0],
            counts: vec![1, 5, 2],
        };
        let svg = histogram(&hist);
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("Distribution of v"));
    }

    #[test]
    fn heatmap_marks_missing_cells() {
        let names = vec!["a".to_string(), "b".to_string()];
        let matrix = vec![
            vec![Some(1.0), None],
            vec![None, Some(1.0)],
        ];
        let svg = heatmap("Correlation", &names, &matrix);
        assert_eq!(svg.matches("n/a").count(), 2);
        assert_eq!(svg.matches("1.00").count(), 4); // title + text per diagonal cell
    }

    #[test]
    fn pie_chart_handles_single_slice() {
        let counts = vec![("only".to_string(), 7, 100.0)];
        let svg = pie_chart("Values", &counts);
        assert!(svg.contains("<circle"));
        assert!(svg.contains("only"));
    }

    #[test]
    fn labels_are_escaped() {
        let bars = vec![("a<b>".to_string(), 1.0)];
        let svg = bar_chart("t", &bars, "");
        assert!(!svg.contains("a<b>"));
        assert!(svg.contains("a&lt;b&gt;"));
    }
}
