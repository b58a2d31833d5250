use canvas_geometry::{BoundingBox, Vec2};
use canvas_layout::{LayoutResult, PlacedNode};
use canvas_snap::{AlignmentGuide, SnapDirection};
use std::fmt::Write;

/// Blank border around the drawing.
const PADDING: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Side of `from` that faces `to`, judged center to center.
fn facing_side(from: &PlacedNode, to: &PlacedNode) -> Side {
    let d = to.bounds().center() - from.bounds().center();
    if d.x.abs() > d.y.abs() {
        if d.x > 0.0 { Side::Right } else { Side::Left }
    } else if d.y > 0.0 {
        Side::Bottom
    } else {
        Side::Top
    }
}

fn anchor(node: &PlacedNode, side: Side) -> Vec2 {
    let b = node.bounds();
    let c = b.center();
    match side {
        Side::Left => Vec2::new(b.min.x, c.y),
        Side::Right => Vec2::new(b.max.x, c.y),
        Side::Top => Vec2::new(c.x, b.min.y),
        Side::Bottom => Vec2::new(c.x, b.max.y),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// SVG preview of a layout: one box per node, straight links between the
/// facing sides, and alignment guides.
pub fn render(result: &LayoutResult, links: &[(&str, &str)], guides: &[AlignmentGuide]) -> String {
    let bounds = result
        .bounds
        .unwrap_or_else(|| BoundingBox::from_rect(0.0, 0.0, 0.0, 0.0))
        .expand(PADDING);
    let size = bounds.size();
    let mut svg = String::new();
    // writing to a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg width="{w}" height="{h}" viewBox="{x} {y} {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
        x = bounds.min.x,
        y = bounds.min.y,
        w = size.width,
        h = size.height,
    );
    let _ = writeln!(
        svg,
        r#"<rect x="{}" y="{}" width="100%" height="100%" fill="white"/>"#,
        bounds.min.x, bounds.min.y
    );

    for (source, target) in links {
        let (Some(a), Some(b)) = (
            result.nodes.iter().find(|n| n.id == *source),
            result.nodes.iter().find(|n| n.id == *target),
        ) else {
            continue;
        };
        let from = anchor(a, facing_side(a, b));
        let to = anchor(b, facing_side(b, a));
        let _ = writeln!(
            svg,
            r#"<path d="M {} {} L {} {}" stroke="black" stroke-width="2" fill="none"/>"#,
            from.x, from.y, to.x, to.y
        );
    }

    for node in &result.nodes {
        let fill = if node.fixed { "lightgray" } else { "lightblue" };
        let c = node.bounds().center();
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}" stroke="black"/>"#,
            node.position.x, node.position.y, node.size.width, node.size.height
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-family="Arial" font-size="12" text-anchor="middle">{}</text>"#,
            c.x,
            c.y + 5.0,
            escape(&node.id)
        );
    }

    for guide in guides {
        let (x1, y1, x2, y2) = match guide.orientation {
            SnapDirection::Vertical => (guide.position, guide.start, guide.position, guide.end),
            _ => (guide.start, guide.position, guide.end, guide.position),
        };
        let _ = writeln!(
            svg,
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="magenta" stroke-width="1" stroke-dasharray="4 2"/>"#
        );
    }

    svg.push_str("</svg>\n");
    svg
}
