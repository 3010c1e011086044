//! Storey heights read from elevation and section views.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{DecodedPage, HeightHint};
use crate::options::ConvertOptions;

/// Accepted wall heights for a hint, in millimetres.
pub const MIN_HINT_MM: f64 = 1800.0;
pub const MAX_HINT_MM: f64 = 6000.0;

lazy_static! {
    /// `+2.700`, `FFL +0.000`, `±0.00`
    static ref RE_LEVEL: Regex = Regex::new(r"[+±]\s*(\d+[.,]\d{1,3})\b").unwrap();

    /// `CEILING HEIGHT 2700`, `CLG 2.7 m`, `Ceiling ht: 2400mm`
    static ref RE_CEILING: Regex = Regex::new(
        r"(?i)\b(?:ceiling|clg)\b\.?\s*(?:height|ht)?\.?\s*[:=]?\s*(\d+(?:[.,]\d+)?)\s*(mm|m)?\b"
    )
    .unwrap();
}

fn number(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}

/// Level marks on a page in millimetres, ascending and deduplicated.
pub fn level_marks_mm(page: &DecodedPage) -> Vec<f64> {
    let mut levels: Vec<f64> = page
        .texts()
        .flat_map(|t| {
            RE_LEVEL
                .captures_iter(t.text)
                .filter_map(|c| number(&c[1]))
                .map(|m| m * 1000.0)
                .collect::<Vec<_>>()
        })
        .collect();
    levels.sort_by(|a, b| a.total_cmp(b));
    levels.dedup_by(|a, b| (*a - *b).abs() < 1.0);
    levels
}

/// Ceiling height notes in text order, in millimetres.
pub fn ceiling_heights_mm(page: &DecodedPage) -> Vec<f64> {
    page.texts()
        .flat_map(|t| {
            RE_CEILING
                .captures_iter(t.text)
                .filter_map(|c| {
                    let value = number(&c[1])?;
                    let unit = c.get(2).map(|m| m.as_str().to_lowercase());
                    Some(match unit.as_deref() {
                        Some("m") => value * 1000.0,
                        Some(_) => value,
                        // small bare numbers are metres
                        None if value < 20.0 => value * 1000.0,
                        None => value,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Wall height of each storey shown on an elevation, bottom up.
///
/// A ceiling note for the k-th storey wins over the k-th level
/// difference, which is floor-to-floor and so loses the slab. Storeys
/// whose height falls outside the plausible band are `None`.
pub fn storey_heights(page: &DecodedPage, slab_thickness_mm: f64) -> Vec<Option<f64>> {
    let levels = level_marks_mm(page);
    let from_levels: Vec<f64> = levels
        .windows(2)
        .map(|w| w[1] - w[0] - slab_thickness_mm)
        .collect();
    let ceilings = ceiling_heights_mm(page);

    (0..from_levels.len().max(ceilings.len()))
        .map(|k| {
            ceilings
                .get(k)
                .or_else(|| from_levels.get(k))
                .copied()
                .filter(|h| (MIN_HINT_MM..=MAX_HINT_MM).contains(h))
        })
        .collect()
}

/// Height hints per floor from a set of elevation pages.
///
/// A page mapped to a floor in `page_floors` gives that floor its first
/// usable height; an unmapped page gives its k-th storey to floor k.
/// Earlier pages win.
pub fn height_hints(pages: &[&DecodedPage], options: &ConvertOptions) -> BTreeMap<usize, HeightHint> {
    let mut hints: BTreeMap<usize, HeightHint> = BTreeMap::new();
    for page in pages {
        let heights = storey_heights(page, options.slab_thickness_mm);
        let hint = |h: f64| HeightHint {
            wall_height_mm: h,
            page: page.index,
        };

        match options.page_floors.get(&page.index) {
            Some(&floor) => {
                if let Some(h) = heights.iter().flatten().next() {
                    hints.entry(floor).or_insert(hint(*h));
                }
            }
            None => {
                for (floor, h) in heights.iter().enumerate() {
                    if let Some(h) = h {
                        hints.entry(floor).or_insert(hint(*h));
                    }
                }
            }
        }
        log::debug!("Elevation page {}: storey heights {:?}", page.index, heights);
    }
    hints
}
