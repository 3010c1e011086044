//! Feature extraction: walls, openings and rooms from plan primitives.
//!
//! The extractor is a chain of pure steps over one page:
//!
//! 1. [`walls::collect_segments`] gathers straight edges.
//! 2. [`walls::pair_walls`] pairs parallel face lines into centerlines.
//! 3. [`walls::merge_collinear`] joins broken runs and records gaps.
//! 4. [`walls::join_ends`] closes corners and T-junctions, recording
//!    openings that run up to a corner.
//! 5. [`walls::split_at_junctions`] splits walls where others meet them.
//! 6. [`openings::classify_openings`] types each gap.
//! 7. [`rooms::detect_rooms`] traces enclosed rooms.

pub mod openings;
pub mod rooms;
pub mod spatial;
pub mod walls;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{DecodedPage, PageFeatures, ScaleFactor};
use crate::options::ConvertOptions;

pub use rooms::contains_point;
pub use spatial::{DisjointSets, PointGrid, SegmentGrid};

/// Thresholds of one extraction, converted to page units.
#[derive(Debug, Clone)]
pub struct Params {
    /// Millimetres per page unit
    pub ratio: f64,
    pub epsilon: f64,
    /// Sine of the largest angle still treated as parallel
    pub sin_parallel: f64,
    pub min_thickness: f64,
    pub max_thickness: f64,
    pub min_opening: f64,
    pub max_opening: f64,
    pub label_radius: f64,
    /// Kept in square millimetres
    pub min_room_area_mm2: f64,
    /// Lowercased
    pub door_labels: Vec<String>,
    /// Lowercased
    pub window_labels: Vec<String>,
}

impl Params {
    pub fn new(options: &ConvertOptions, ratio: f64) -> Self {
        let to_page = |mm: f64| mm / ratio;
        let (min_t, max_t) = options.wall_thickness_range_mm;
        Self {
            ratio,
            epsilon: to_page(options.tolerance_epsilon_mm),
            sin_parallel: options.parallel_tolerance_deg.to_radians().sin(),
            min_thickness: to_page(min_t),
            max_thickness: to_page(max_t),
            min_opening: to_page(options.min_opening_width_mm),
            max_opening: to_page(options.max_opening_width_mm),
            label_radius: to_page(options.label_search_radius_mm),
            min_room_area_mm2: options.min_room_area_mm2,
            door_labels: lowercase(&options.door_labels),
            window_labels: lowercase(&options.window_labels),
        }
    }
}

fn lowercase(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_lowercase())
        .collect()
}

/// Extracts [`PageFeatures`] from plan pages.
pub struct FeatureExtractor<'a> {
    options: &'a ConvertOptions,
    params: Params,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(options: &'a ConvertOptions, scale: ScaleFactor) -> Self {
        Self {
            options,
            params: Params::new(options, scale.ratio),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Whether any face lines on the page pair into walls.
    pub fn has_walls(&self, page: &DecodedPage) -> bool {
        !walls::pair_walls(&walls::collect_segments(page), &self.params).is_empty()
    }

    /// Extract the features of one plan page.
    ///
    /// Fails with [`Error::InsufficientGeometry`] when no walls are found.
    pub fn extract(&self, page: &DecodedPage) -> Result<PageFeatures> {
        let params = &self.params;
        let segments = walls::collect_segments(page);
        let paired = walls::pair_walls(&segments, params);
        if paired.is_empty() {
            log::debug!(
                "Page {}: no wall pairs among {} segments",
                page.index,
                segments.len()
            );
            return Err(Error::InsufficientGeometry { page: page.index });
        }

        let (merged, mut gaps) = walls::merge_collinear(&paired, params);
        let (joined, corner_gaps) = walls::join_ends(&merged, params);
        gaps.extend(corner_gaps);
        let (split, parents) = walls::split_at_junctions(&joined, params);
        let gaps = walls::rehost_gaps(&gaps, &split, &parents);

        let openings = openings::classify_openings(&gaps, &split, &segments, page, params);
        let rooms = rooms::detect_rooms(&split, page, params);

        log::debug!(
            "Page {}: {} walls, {} openings, {} rooms",
            page.index,
            split.len(),
            openings.len(),
            rooms.len()
        );

        Ok(PageFeatures {
            page: page.index,
            walls: split,
            openings,
            rooms,
        })
    }

    /// Extract several pages, in parallel when the options allow it.
    ///
    /// Results keep the input order.
    pub fn extract_all(&self, pages: &[&DecodedPage]) -> Vec<Result<PageFeatures>> {
        if self.options.parallel && pages.len() > 1 {
            pages.par_iter().map(|page| self.extract(page)).collect()
        } else {
            pages.iter().map(|page| self.extract(page)).collect()
        }
    }
}

/// Extract the features of one page with the given scale.
pub fn extract_features(
    page: &DecodedPage,
    scale: ScaleFactor,
    options: &ConvertOptions,
) -> Result<PageFeatures> {
    FeatureExtractor::new(options, scale).extract(page)
}
