//! Turning wall gaps into typed openings.

use super::walls::{canonical_direction, Gap, Segment};
use super::Params;
use crate::model::{DecodedPage, Opening, OpeningKind, WallSegment};

/// Classify each gap and express it on its host wall.
///
/// A nearby door or window label decides the kind. Without one, a glazing
/// line drawn inside the gap marks a window; anything else stays
/// [`OpeningKind::Unknown`].
pub fn classify_openings(
    gaps: &[Gap],
    walls: &[WallSegment],
    segments: &[Segment],
    page: &DecodedPage,
    params: &Params,
) -> Vec<Opening> {
    gaps.iter()
        .filter_map(|gap| {
            let wall = walls.get(gap.host)?;
            let length = wall.length();
            if length <= f64::EPSILON {
                return None;
            }
            let along = (gap.center.to_vector() - wall.start.to_vector()).dot(&wall.direction());
            let kind = label_kind(gap, page, params)
                .or_else(|| glazing_kind(gap, wall, along, segments, params))
                .unwrap_or_default();

            Some(Opening {
                wall: gap.host,
                position: (along / length).clamp(0.0, 1.0),
                width: gap.width.min(length),
                kind,
            })
        })
        .collect()
}

/// Kind named by a text run, if it mentions a door or window label.
pub fn text_kind(text: &str, params: &Params) -> Option<OpeningKind> {
    let lower = text.to_lowercase();
    if params.door_labels.iter().any(|l| lower.contains(l.as_str())) {
        Some(OpeningKind::Door)
    } else if params.window_labels.iter().any(|l| lower.contains(l.as_str())) {
        Some(OpeningKind::Window)
    } else {
        None
    }
}

fn label_kind(gap: &Gap, page: &DecodedPage, params: &Params) -> Option<OpeningKind> {
    let mut best: Option<(f64, OpeningKind)> = None;
    for text in page.texts() {
        let Some(kind) = text_kind(text.text, params) else {
            continue;
        };
        let distance = text.center().distance_to(&gap.center);
        if distance <= params.label_radius && best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, kind));
        }
    }
    best.map(|(_, kind)| kind)
}

/// A line parallel to the wall, inside its thickness and within the gap.
fn glazing_kind(
    gap: &Gap,
    wall: &WallSegment,
    along: f64,
    segments: &[Segment],
    params: &Params,
) -> Option<OpeningKind> {
    let dir = wall.direction();
    let wall_dir = canonical_direction(&wall.start, &wall.end);
    let lo = along - gap.width / 2.0;
    let hi = along + gap.width / 2.0;
    let inside = wall.thickness / 2.0 - params.epsilon;

    segments
        .iter()
        .any(|(a, b)| {
            let d = canonical_direction(a, b);
            let parallel = (wall_dir.x * d.y - wall_dir.y * d.x).abs() <= params.sin_parallel;
            let mid = a.midpoint(b);
            let s = (mid.to_vector() - wall.start.to_vector()).dot(&dir);
            parallel
                && s > lo
                && s < hi
                && mid.distance_to_segment(&wall.start, &wall.end) < inside
                && a.distance_to(b) >= gap.width * 0.5
        })
        .then_some(OpeningKind::Window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PagePrimitive, Point2};
    use crate::options::ConvertOptions;

    fn params() -> Params {
        Params::new(&ConvertOptions::default(), 1.0)
    }

    fn setup() -> (Vec<WallSegment>, Vec<Gap>) {
        let walls = vec![WallSegment::new(
            Point2::new(0.0, 0.0),
            Point2::new(4000.0, 0.0),
            100.0,
        )];
        let gaps = vec![Gap {
            host: 0,
            center: Point2::new(1450.0, 0.0),
            width: 900.0,
        }];
        (walls, gaps)
    }

    fn label(text: &str, x: f64, y: f64) -> PagePrimitive {
        PagePrimitive::TextRun {
            text: text.to_string(),
            origin: Point2::new(x, y),
            font_size: 100.0,
        }
    }

    #[test]
    fn test_door_label_near_gap() {
        let (walls, gaps) = setup();
        let mut page = DecodedPage::new(0, 5000.0, 5000.0);
        page.primitives.push(label("Front Door", 1200.0, 300.0));
        page.primitives.push(label("WINDOW", 3500.0, 3000.0));

        let openings = classify_openings(&gaps, &walls, &[], &page, &params());
        assert_eq!(openings.len(), 1);
        assert_eq!(openings[0].kind, OpeningKind::Door);
        assert!((openings[0].position - 1450.0 / 4000.0).abs() < 1e-12);
        assert_eq!(openings[0].width, 900.0);
    }

    #[test]
    fn test_glazing_line_means_window() {
        let (walls, gaps) = setup();
        let page = DecodedPage::new(0, 5000.0, 5000.0);
        let glazing = vec![(Point2::new(1000.0, 0.0), Point2::new(1900.0, 0.0))];

        let openings = classify_openings(&gaps, &walls, &glazing, &page, &params());
        assert_eq!(openings[0].kind, OpeningKind::Window);

        let bare = classify_openings(&gaps, &walls, &[], &page, &params());
        assert_eq!(bare[0].kind, OpeningKind::Unknown);
    }

    #[test]
    fn test_far_label_is_ignored() {
        let (walls, gaps) = setup();
        let mut page = DecodedPage::new(0, 5000.0, 5000.0);
        page.primitives.push(label("DOOR", 1400.0, 4000.0));
        let openings = classify_openings(&gaps, &walls, &[], &page, &params());
        assert_eq!(openings[0].kind, OpeningKind::Unknown);
    }
}
