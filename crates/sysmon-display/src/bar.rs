//! Progress bar cell math and text rendering.

/// Number of filled cells for a bar of `width` cells at `pct` percent.
///
/// Same fill rule as the panel drawing code this layout comes from:
/// `fill = width * pct / 100`, truncated, with the percentage clamped
/// so out-of-range inputs never overflow the bar.
#[must_use]
pub fn filled_cells(width: usize, pct: f64) -> usize {
    let pct = pct.clamp(0.0, 100.0);
    (width as f64 * pct / 100.0) as usize
}

/// Render a bar as `[####....]`; `None` renders a blank bar for an
/// unavailable reading.
#[must_use]
pub fn render_bar(width: usize, pct: Option<f64>) -> String {
    match pct {
        Some(p) => {
            let fill = filled_cells(width, p);
            format!("[{}{}]", "#".repeat(fill), ".".repeat(width - fill))
        }
        None => format!("[{}]", " ".repeat(width)),
    }
}
