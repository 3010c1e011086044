//! Scale resolution: how many millimetres one page unit stands for.
//!
//! A page is searched for dimension annotations first (a length written
//! next to the line it measures), then for a drawing-scale note, and
//! finally falls back to the configured ratio. Resolution never fails.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{DecodedPage, Point2, ScaleConfidence, ScaleFactor};
use crate::options::ConvertOptions;

/// Millimetres per PDF point.
const MM_PER_POINT: f64 = 25.4 / 72.0;

/// A dimension line must lie within this many font sizes of its text.
const DIMENSION_REACH: f64 = 2.5;

/// Plausible mm-per-page-unit band for a measured ratio.
const MIN_RATIO: f64 = 0.1;
const MAX_RATIO: f64 = 5000.0;

/// Relative spread of ratios that count as the same measurement.
const CLUSTER_TOLERANCE: f64 = 0.02;

lazy_static! {
    /// `4000`, `4.0 m`, `400cm`, `12 ft`, `36"`
    static ref RE_LENGTH: Regex = Regex::new(
        r#"(?i)^(\d+(?:[.,]\d+)?)\s*(mm|cm|m|ft|feet|foot|'|in|inch|inches|")?$"#
    )
    .unwrap();

    /// `13'-1"`, `13' 1.5"`
    static ref RE_FEET_INCHES: Regex =
        Regex::new(r#"^(\d+)\s*'\s*-?\s*(\d+(?:\.\d+)?)\s*(?:"|'')?$"#).unwrap();

    /// `SCALE 1:100`, `1 : 50`
    static ref RE_RATIO_NOTE: Regex =
        Regex::new(r"(?i)(?:^|[^\d.])1\s*:\s*(\d+(?:\.\d+)?)\b").unwrap();

    /// `1/4" = 1'-0"`, `1" = 10'`
    static ref RE_IMPERIAL_NOTE: Regex = Regex::new(
        r#"(\d+)(?:\s*/\s*(\d+))?\s*(?:"|in)\s*=\s*(\d+)\s*'(?:\s*-?\s*0\s*")?"#
    )
    .unwrap();
}

/// Parse a whole-string length annotation into millimetres.
///
/// Bare numbers are millimetres. Returns `None` for anything that is not
/// exactly one length.
pub fn parse_length_mm(text: &str) -> Option<f64> {
    let text = text.trim();

    if let Some(caps) = RE_FEET_INCHES.captures(text) {
        let feet: f64 = caps[1].parse().ok()?;
        let inches: f64 = caps[2].parse().ok()?;
        return positive((feet * 12.0 + inches) * 25.4);
    }

    let caps = RE_LENGTH.captures(text)?;
    let value: f64 = caps[1].replace(',', ".").parse().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();
    let factor = match unit.as_str() {
        "" | "mm" => 1.0,
        "cm" => 10.0,
        "m" => 1000.0,
        "ft" | "feet" | "foot" | "'" => 304.8,
        "in" | "inch" | "inches" | "\"" => 25.4,
        _ => return None,
    };
    positive(value * factor)
}

/// Parse a drawing-scale note into millimetres per page unit.
pub fn parse_scale_note(text: &str) -> Option<f64> {
    if let Some(caps) = RE_IMPERIAL_NOTE.captures(text) {
        let numerator: f64 = caps[1].parse().ok()?;
        let denominator: f64 = match caps.get(2) {
            Some(d) => d.as_str().parse().ok()?,
            None => 1.0,
        };
        let feet: f64 = caps[3].parse().ok()?;
        if numerator > 0.0 && denominator > 0.0 {
            let paper_inches = numerator / denominator;
            return positive(feet * 12.0 / paper_inches * MM_PER_POINT);
        }
    }

    let caps = RE_RATIO_NOTE.captures(text)?;
    let n: f64 = caps[1].parse().ok()?;
    positive(n * MM_PER_POINT)
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Resolves the [`ScaleFactor`] of plan pages.
#[derive(Debug, Clone, Copy)]
pub struct ScaleResolver {
    default_ratio: f64,
    scale_override: Option<f64>,
}

impl ScaleResolver {
    pub fn new(default_ratio: f64, scale_override: Option<f64>) -> Self {
        Self {
            default_ratio,
            scale_override,
        }
    }

    pub fn from_options(options: &ConvertOptions) -> Self {
        Self::new(options.default_scale_ratio, options.scale_override)
    }

    /// Resolve the scale of one page.
    pub fn resolve_page(&self, page: &DecodedPage) -> ScaleFactor {
        if let Some(ratio) = self.scale_override {
            return ScaleFactor::new(ratio, ScaleConfidence::Declared);
        }

        if let Some(ratio) = dimension_ratio(page) {
            log::debug!("Page {}: scale {:.4} from dimensions", page.index, ratio);
            return ScaleFactor::new(ratio, ScaleConfidence::Declared);
        }

        if let Some(ratio) = page.texts().find_map(|t| parse_scale_note(t.text)) {
            log::debug!("Page {}: scale {:.4} from scale note", page.index, ratio);
            return ScaleFactor::new(ratio, ScaleConfidence::Inferred);
        }

        ScaleFactor::new(self.default_ratio, ScaleConfidence::Default)
    }

    /// Resolve one scale for a set of pages.
    ///
    /// The first page with the best confidence wins.
    pub fn resolve_document<'a, I>(&self, pages: I) -> ScaleFactor
    where
        I: IntoIterator<Item = &'a DecodedPage>,
    {
        let mut best: Option<ScaleFactor> = None;
        for page in pages {
            let scale = self.resolve_page(page);
            if best.map_or(true, |b| scale.confidence.rank() < b.confidence.rank()) {
                best = Some(scale);
            }
            if scale.confidence == ScaleConfidence::Declared {
                break;
            }
        }
        best.unwrap_or_else(|| self.resolve_without_pages())
    }

    fn resolve_without_pages(&self) -> ScaleFactor {
        match self.scale_override {
            Some(ratio) => ScaleFactor::new(ratio, ScaleConfidence::Declared),
            None => ScaleFactor::new(self.default_ratio, ScaleConfidence::Default),
        }
    }
}

impl Default for ScaleResolver {
    fn default() -> Self {
        Self::from_options(&ConvertOptions::default())
    }
}

/// Resolve a page's scale with the default fallback ratio.
pub fn resolve_scale(page: &DecodedPage, scale_override: Option<f64>) -> ScaleFactor {
    ScaleResolver::new(ConvertOptions::default().default_scale_ratio, scale_override)
        .resolve_page(page)
}

/// Ratio measured from the page's dimension annotations, if any.
fn dimension_ratio(page: &DecodedPage) -> Option<f64> {
    let edges = page.edges();
    let candidates: Vec<f64> = page
        .texts()
        .filter_map(|text| {
            let real_mm = parse_length_mm(text.text)?;
            let center = text.center();
            let page_len = nearest_edge_length(&edges, center, text.font_size * DIMENSION_REACH)?;
            let ratio = real_mm / page_len;
            (MIN_RATIO..=MAX_RATIO).contains(&ratio).then_some(ratio)
        })
        .collect();

    largest_cluster_mean(&candidates)
}

fn nearest_edge_length(edges: &[(Point2, Point2)], at: Point2, reach: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for (a, b) in edges {
        let length = a.distance_to(b);
        if length < f64::EPSILON {
            continue;
        }
        let distance = at.distance_to_segment(a, b);
        if distance <= reach && best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, length));
        }
    }
    best.map(|(_, length)| length)
}

/// Mean of the biggest group of values within [`CLUSTER_TOLERANCE`] of
/// one another; ties go to the earliest value.
fn largest_cluster_mean(values: &[f64]) -> Option<f64> {
    let mut best: Option<Vec<f64>> = None;
    for &seed in values {
        let members: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| (v - seed).abs() <= seed * CLUSTER_TOLERANCE)
            .collect();
        if best.as_ref().map_or(true, |b| members.len() > b.len()) {
            best = Some(members);
        }
    }
    best.map(|m| m.iter().sum::<f64>() / m.len() as f64)
}
