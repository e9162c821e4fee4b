//! Text chart over render points.

use std::time::Duration;

use chrono::{Local, TimeZone};
use gluview_core::{Frame, RenderPoint};

const ACTUAL_DOT: char = '●';
const ACTUAL_LINE: char = '─';
const STANDARD_DOT: char = '○';
const TIME_AWARE_DOT: char = '◌';
const BOUNDARY: char = '┊';
const BAR_LENGTH: usize = 40;
const TIME_LABELS: usize = 5;

/// Chart geometry; converted from `gluview_config::ChartCfg` at the edge.
#[derive(Debug, Clone, Copy)]
pub struct ChartLayout {
    pub width: usize,
    pub height: usize,
    pub value_min: u16,
    pub value_max: u16,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
            value_min: 0,
            value_max: 350,
        }
    }
}

impl From<&gluview_config::ChartCfg> for ChartLayout {
    fn from(c: &gluview_config::ChartCfg) -> Self {
        Self {
            width: c.width,
            height: c.height,
            value_min: c.value_min,
            value_max: c.value_max,
        }
    }
}

struct Grid {
    cells: Vec<Vec<char>>,
    width: usize,
    height: usize,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            width,
            height,
        }
    }

    fn put(&mut self, x: usize, y: usize, glyph: char) {
        if x < self.width && y < self.height {
            self.cells[y][x] = glyph;
        }
    }

    /// Set the cell only when still blank; keeps dots on top of fill glyphs.
    fn put_soft(&mut self, x: usize, y: usize, glyph: char) {
        if x < self.width && y < self.height && self.cells[y][x] == ' ' {
            self.cells[y][x] = glyph;
        }
    }
}

struct Scale {
    t_min: i64,
    t_max: i64,
    width: usize,
    height: usize,
    value_min: f64,
    value_max: f64,
}

impl Scale {
    fn x(&self, time_ms: i64) -> usize {
        if self.t_max == self.t_min {
            return 0;
        }
        let frac = (time_ms - self.t_min) as f64 / (self.t_max - self.t_min) as f64;
        ((frac * (self.width - 1) as f64).round() as isize).clamp(0, self.width as isize - 1)
            as usize
    }

    fn y(&self, value: u16) -> usize {
        let v = f64::from(value).clamp(self.value_min, self.value_max);
        let frac = (self.value_max - v) / (self.value_max - self.value_min);
        ((frac * (self.height - 1) as f64).round() as isize).clamp(0, self.height as isize - 1)
            as usize
    }
}

fn draw_segment(grid: &mut Grid, from: (usize, usize), to: (usize, usize)) {
    let (x0, y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);
    let steps = (x1 - x0).abs() + (y1 - y0).abs();
    if steps == 0 {
        return;
    }
    for step in 0..=steps {
        let frac = step as f64 / steps as f64;
        let x = (x0 as f64 + (x1 - x0) as f64 * frac).round() as isize;
        let y = (y0 as f64 + (y1 - y0) as f64 * frac).round() as isize;
        grid.put_soft(x as usize, y as usize, ACTUAL_LINE);
    }
}

fn draw_actual(grid: &mut Grid, scale: &Scale, points: &[RenderPoint]) {
    let mut prev: Option<(usize, usize)> = None;
    for p in points {
        if p.is_gap_boundary {
            // Break the line: the next actual sample starts a fresh segment.
            prev = None;
            continue;
        }
        let Some(value) = p.actual else { continue };
        let pos = (scale.x(p.time_ms), scale.y(value));
        if let Some(prev_pos) = prev {
            draw_segment(grid, prev_pos, pos);
        }
        grid.put(pos.0, pos.1, ACTUAL_DOT);
        prev = Some(pos);
    }
}

fn draw_projection(
    grid: &mut Grid,
    scale: &Scale,
    points: &[RenderPoint],
    pick: fn(&RenderPoint) -> Option<u16>,
    glyph: char,
) {
    for p in points {
        // Skip actual samples; their duplicated join value is already drawn.
        if p.actual.is_some() {
            continue;
        }
        if let Some(value) = pick(p) {
            grid.put_soft(scale.x(p.time_ms), scale.y(value), glyph);
        }
    }
}

fn draw_boundary(grid: &mut Grid, scale: &Scale, frame: &Frame) {
    let Some(boundary_ms) = frame.last_actual_ms else {
        return;
    };
    // Only meaningful when projections extend past the boundary.
    if frame.points.iter().all(|p| p.actual.is_some() || p.is_gap_boundary) {
        return;
    }
    let x = scale.x(boundary_ms);
    for y in 0..grid.height {
        grid.put_soft(x, y, BOUNDARY);
    }
}

fn y_axis_labels(layout: &ChartLayout) -> Vec<u16> {
    let span = f64::from(layout.value_max) - f64::from(layout.value_min);
    (0..layout.height)
        .map(|row| {
            let frac = row as f64 / (layout.height - 1) as f64;
            (f64::from(layout.value_max) - frac * span).round() as u16
        })
        .collect()
}

fn format_clock(time_ms: i64) -> String {
    Local
        .timestamp_millis_opt(time_ms)
        .single()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

fn time_label_row(points: &[RenderPoint], width: usize) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut labels = Vec::with_capacity(TIME_LABELS);
    for i in 0..TIME_LABELS {
        let idx = ((i as f64 / (TIME_LABELS - 1) as f64) * (points.len() - 1) as f64).round()
            as usize;
        labels.push(format_clock(points[idx].time_ms));
    }
    let slot = (width / labels.len()).max(1);
    let mut row = String::new();
    for label in &labels {
        row.push_str(label);
        let pad = slot.saturating_sub(label.len()).max(1);
        row.push_str(&" ".repeat(pad));
    }
    row.trim_end().to_string()
}

fn progress_bar(remaining: Duration, total: Duration) -> (u64, String) {
    let total_s = total.as_secs().max(1);
    let remaining_s = remaining.as_secs().min(total_s);
    let progress = (total_s - remaining_s) as f64 / total_s as f64;
    let filled = (progress * BAR_LENGTH as f64).floor() as usize;
    let bar = format!(
        "{}{}",
        "█".repeat(filled.min(BAR_LENGTH)),
        "░".repeat(BAR_LENGTH - filled.min(BAR_LENGTH))
    );
    (remaining_s, bar)
}

/// Render one frame into display lines.
///
/// `remaining` is the time until the next scheduled refresh and `interval`
/// the full refresh period; together they drive the countdown bar.
pub fn render_frame(
    frame: &Frame,
    layout: &ChartLayout,
    remaining: Duration,
    interval: Duration,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(layout.height + 8);
    let stale_suffix = if frame.stale { "  (stale)" } else { "" };
    lines.push(format!("Blood Glucose Monitor{stale_suffix}"));

    if frame.points.is_empty() {
        lines.push("No glucose data available".to_string());
        return lines;
    }

    let readings = frame.points.iter().filter(|p| p.actual.is_some()).count();
    match frame.latest {
        Some(latest) => lines.push(format!("Current: {latest} mg/dL | Readings: {readings}")),
        None => lines.push(format!("Readings: {readings}")),
    }
    lines.push(String::new());

    let t_min = frame.points.iter().map(|p| p.time_ms).min().unwrap_or(0);
    let t_max = frame.points.iter().map(|p| p.time_ms).max().unwrap_or(0);
    let scale = Scale {
        t_min,
        t_max,
        width: layout.width,
        height: layout.height,
        value_min: f64::from(layout.value_min),
        value_max: f64::from(layout.value_max),
    };

    let mut grid = Grid::new(layout.width, layout.height);
    draw_boundary(&mut grid, &scale, frame);
    draw_actual(&mut grid, &scale, &frame.points);
    draw_projection(&mut grid, &scale, &frame.points, |p| p.standard, STANDARD_DOT);
    draw_projection(
        &mut grid,
        &scale,
        &frame.points,
        |p| p.time_aware,
        TIME_AWARE_DOT,
    );

    for (row, label) in grid.cells.iter().zip(y_axis_labels(layout)) {
        let body: String = row.iter().collect();
        lines.push(format!("{label:>3} │ {body}"));
    }
    lines.push(format!("    └{}", "─".repeat(layout.width)));
    lines.push(format!("    {}", time_label_row(&frame.points, layout.width)));
    lines.push(String::new());
    lines.push(format!(
        "{ACTUAL_DOT} actual   {STANDARD_DOT} projection   {TIME_AWARE_DOT} time-aware"
    ));

    let (remaining_s, bar) = progress_bar(remaining, interval);
    lines.push(format!("Next update in: {remaining_s}s [{bar}]"));
    lines
}
