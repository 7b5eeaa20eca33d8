//! SVG rendering of the negotiation path

use crate::error::Result;
use crate::negotiation::{PricePoint, Zopa};
use crate::types::Party;
use std::fmt::Write as _;
use std::path::Path;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 560.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 200.0;
const MARGIN_Y: f64 = 60.0;

const BUYER_COLOR: &str = "#1f4fd1";
const SELLER_COLOR: &str = "#d12f1f";
const MEDIATOR_COLOR: &str = "#7a2fd1";
const PATH_COLOR: &str = "#2f9e44";

/// Maps rounds and prices into the plot area
struct Frame {
    max_round: f64,
    low: f64,
    high: f64,
}

impl Frame {
    fn new(points: &[PricePoint], zopa: &Zopa) -> Self {
        let max_round = points.iter().map(|p| p.round).max().unwrap_or(0) as f64 + 1.0;
        let mut low = zopa.reservation_price.min(zopa.max_budget);
        let mut high = zopa.max_budget.max(zopa.reservation_price);
        for p in points {
            low = low.min(p.price);
            high = high.max(p.price);
        }
        let pad = ((high - low) * 0.08).max(1.0);

        Self {
            max_round,
            low: low - pad,
            high: high + pad,
        }
    }

    fn x(&self, round: f64) -> f64 {
        MARGIN_LEFT + round / self.max_round * (WIDTH - MARGIN_LEFT - MARGIN_RIGHT)
    }

    fn y(&self, price: f64) -> f64 {
        HEIGHT - MARGIN_Y - (price - self.low) / (self.high - self.low) * (HEIGHT - 2.0 * MARGIN_Y)
    }
}

/// Render the convergence path as an SVG document. `None` when there is
/// nothing to plot.
pub fn render_svg(points: &[PricePoint], zopa: &Zopa) -> Option<String> {
    if points.is_empty() {
        return None;
    }

    let frame = Frame::new(points, zopa);
    let right = WIDTH - MARGIN_RIGHT;
    let bottom = HEIGHT - MARGIN_Y;
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="30" text-anchor="middle" font-size="18" font-weight="bold">Bilateral Negotiation: Price Convergence Path</text>"#,
        (MARGIN_LEFT + right) / 2.0
    );

    if zopa.is_feasible() {
        let top = frame.y(zopa.max_budget);
        let _ = writeln!(
            svg,
            r#"<rect x="{MARGIN_LEFT:.1}" y="{top:.1}" width="{:.1}" height="{:.1}" fill="{PATH_COLOR}" fill-opacity="0.1"/>"#,
            right - MARGIN_LEFT,
            frame.y(zopa.reservation_price) - top
        );
    }
    bound_line(&mut svg, &frame, zopa.max_budget, BUYER_COLOR, "Buyer max budget");
    bound_line(&mut svg, &frame, zopa.reservation_price, SELLER_COLOR, "Seller reservation");

    // Axes
    let _ = writeln!(
        svg,
        r#"<path d="M{MARGIN_LEFT:.1} {MARGIN_Y:.1} V{bottom:.1} H{right:.1}" stroke="black" fill="none"/>"#
    );
    for round in 1..frame.max_round as u32 {
        let x = frame.x(f64::from(round));
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="12">{round}</text>"#,
            bottom + 18.0
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">Negotiation Round</text>"#,
        (MARGIN_LEFT + right) / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" text-anchor="middle" font-size="13" transform="rotate(-90 20 {:.1})">Unit price</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    );

    // Full path in chronological order
    let path: Vec<String> = points
        .iter()
        .map(|p| format!("{:.1},{:.1}", frame.x(f64::from(p.round)), frame.y(p.price)))
        .collect();
    let _ = writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="{PATH_COLOR}" stroke-opacity="0.4" stroke-dasharray="6 4"/>"#,
        path.join(" ")
    );

    for (party, color) in [
        (Party::Buyer, BUYER_COLOR),
        (Party::Seller, SELLER_COLOR),
        (Party::Mediator, MEDIATOR_COLOR),
    ] {
        series(&mut svg, &frame, points, party, color);
    }

    legend(&mut svg, right + 20.0);
    svg.push_str("</svg>\n");
    Some(svg)
}

/// Render and write the chart. Returns `false` if there was nothing to plot.
pub fn write_svg(path: &Path, points: &[PricePoint], zopa: &Zopa) -> Result<bool> {
    match render_svg(points, zopa) {
        Some(svg) => {
            std::fs::write(path, svg)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn bound_line(svg: &mut String, frame: &Frame, price: f64, color: &str, label: &str) {
    let y = frame.y(price);
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{color}" stroke-opacity="0.5" stroke-dasharray="8 4"/>"#,
        WIDTH - MARGIN_RIGHT
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="11" fill="{color}">{label} ({price:.2})</text>"#,
        MARGIN_LEFT + 6.0,
        y - 4.0
    );
}

fn series(svg: &mut String, frame: &Frame, points: &[PricePoint], party: Party, color: &str) {
    let coords: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.party == party)
        .map(|p| (frame.x(f64::from(p.round)), frame.y(p.price)))
        .collect();
    if coords.is_empty() {
        return;
    }

    if coords.len() > 1 {
        let line: Vec<String> = coords.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="2"/>"#,
            line.join(" ")
        );
    }
    for (x, y) in coords {
        let _ = match party {
            Party::Seller => writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="8" height="8" fill="{color}"/>"#,
                x - 4.0,
                y - 4.0
            ),
            _ => writeln!(svg, r#"<circle cx="{x:.1}" cy="{y:.1}" r="4.5" fill="{color}"/>"#),
        };
    }
}

fn legend(svg: &mut String, x: f64) {
    let entries = [
        (BUYER_COLOR, "Buyer offers"),
        (SELLER_COLOR, "Seller offers"),
        (MEDIATOR_COLOR, "Mediator proposal"),
        (PATH_COLOR, "Negotiation path / ZOPA"),
    ];
    for (i, (color, label)) in entries.iter().enumerate() {
        let y = MARGIN_Y + 20.0 * i as f64;
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{:.1}" width="12" height="12" fill="{color}"/><text x="{:.1}" y="{y:.1}" font-size="12">{label}</text>"#,
            y - 10.0,
            x + 18.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(round: u32, party: Party, price: f64) -> PricePoint {
        PricePoint {
            round,
            party,
            price,
        }
    }

    fn points() -> Vec<PricePoint> {
        vec![
            point(1, Party::Buyer, 370.0),
            point(1, Party::Seller, 485.0),
            point(2, Party::Buyer, 395.0),
            point(2, Party::Seller, 465.0),
            point(3, Party::Mediator, 430.0),
        ]
    }

    #[test]
    fn test_render_svg() {
        let svg = render_svg(&points(), &Zopa::new(350.0, 500.0)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(BUYER_COLOR));
        assert!(svg.contains(SELLER_COLOR));
        assert!(svg.contains(MEDIATOR_COLOR));
        assert!(svg.contains("Buyer max budget (500.00)"));
        assert!(svg.contains("Seller reservation (350.00)"));
    }

    #[test]
    fn test_nothing_to_plot() {
        assert!(render_svg(&[], &Zopa::new(350.0, 500.0)).is_none());
    }

    #[test]
    fn test_write_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path.svg");

        let written = write_svg(&path, &points(), &Zopa::new(350.0, 500.0)).unwrap();
        assert!(written);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<polyline"));
    }

    #[test]
    fn test_write_svg_reports_io_failure() {
        let path = Path::new("/nonexistent/dir/path.svg");
        let result = write_svg(path, &points(), &Zopa::new(350.0, 500.0));
        assert!(result.is_err());
    }
}
