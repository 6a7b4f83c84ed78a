//! Horizontal bar chart of portfolio performance, rendered as plain text.

use crate::domain::sampler::{bar_scale, PerformancePoint};

const LABEL_FORMAT: &str = "%b %d, %Y";

pub fn format_performance_chart(
    portfolio: &str,
    points: &[PerformancePoint],
) -> String {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return format!("No performance data for portfolio {portfolio}.\n");
    };

    let mut out = format!(
        "Performance of portfolio {} from {} to {}\n\n",
        portfolio,
        first.date.format(LABEL_FORMAT),
        last.date.format(LABEL_FORMAT)
    );

    let scale = bar_scale(points);
    for point in points {
        let stars = if scale > 0.0 {
            (point.value / scale).round().max(0.0) as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{}: {}\n",
            point.date.format(LABEL_FORMAT),
            "*".repeat(stars)
        ));
    }

    out.push_str(&format!("\nScale: * = {:.2} dollars\n", scale));
    out
}
