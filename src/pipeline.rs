//! The conversion pipeline: PDF bytes to a [`Model`] with warnings.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assemble::assemble;
use crate::decode::decode;
use crate::error::Result;
use crate::extract::FeatureExtractor;
use crate::graph::{assign_floors, elevation_offsets, height_hints, FloorGraphBuilder, FloorPlacement};
use crate::model::{
    DecodedDocument, DecodedPage, HeightSource, Model, PageFeatures, PageRole, ScaleConfidence,
    SkipReason,
};
use crate::options::ConvertOptions;
use crate::scale::ScaleResolver;
use crate::synth::MeshSynthesizer;
use crate::warning::ConversionWarning;

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub model: Model,
    /// Non-fatal problems in the order they were found
    pub warnings: Vec<ConversionWarning>,
}

impl Conversion {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Reusable conversion pipeline.
///
/// # Example
///
/// ```no_run
/// use plan3d::{ConvertOptions, Converter};
///
/// let converter = Converter::new(ConvertOptions::default().with_drawing_scale(50.0));
/// let data = std::fs::read("house.pdf")?;
/// let conversion = converter.convert(&data)?;
/// println!("{} floors", conversion.model.floor_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a PDF held in memory.
    pub fn convert(&self, data: &[u8]) -> Result<Conversion> {
        self.options.validate()?;
        let document = decode(data, self.options.error_mode)?;
        self.convert_document(&document)
    }

    /// Convert a PDF file.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<Conversion> {
        let data = std::fs::read(path)?;
        self.convert(&data)
    }

    /// Final role of each page, in page order.
    ///
    /// A page titled as an elevation or section is still read as a plan
    /// when `page_floors` maps it or when its face lines pair into walls
    /// at the scale of the titled plan pages.
    pub fn page_roles(&self, pages: &[DecodedPage]) -> Vec<PageRole> {
        let titled: Vec<PageRole> = pages.iter().map(PageRole::classify).collect();
        if !titled.contains(&PageRole::Elevation) {
            return titled;
        }

        let resolver = ScaleResolver::from_options(&self.options);
        let titled_plans: Vec<&DecodedPage> = pages
            .iter()
            .zip(&titled)
            .filter(|(_, role)| **role == PageRole::Plan)
            .map(|(page, _)| page)
            .collect();
        let scale = if titled_plans.is_empty() {
            resolver.resolve_document(pages)
        } else {
            resolver.resolve_document(titled_plans)
        };
        let extractor = FeatureExtractor::new(&self.options, scale);

        pages
            .iter()
            .zip(titled)
            .map(|(page, role)| match role {
                PageRole::Elevation
                    if self.options.page_floors.contains_key(&page.index)
                        || extractor.has_walls(page) =>
                {
                    log::debug!("Page {}: view title, but read as a plan", page.index);
                    PageRole::Plan
                }
                role => role,
            })
            .collect()
    }

    /// Run every stage after decoding.
    pub fn convert_document(&self, document: &DecodedDocument) -> Result<Conversion> {
        self.options.validate()?;
        let options = &self.options;
        let mut warnings: Vec<ConversionWarning> = document
            .skipped_pages
            .iter()
            .map(|skipped| match &skipped.reason {
                SkipReason::NoVectorContent => ConversionWarning::UnsupportedPage {
                    page: skipped.index,
                },
                SkipReason::Undecodable(reason) => ConversionWarning::UndecodablePage {
                    page: skipped.index,
                    reason: reason.clone(),
                },
            })
            .collect();

        let roles = self.page_roles(&document.pages);
        let mut plans: Vec<&DecodedPage> = Vec::new();
        let mut elevations: Vec<&DecodedPage> = Vec::new();
        for (page, role) in document.pages.iter().zip(roles) {
            match role {
                PageRole::Plan => {
                    if PageRole::classify(page) == PageRole::Elevation {
                        warnings.push(ConversionWarning::ViewTitleOnPlan { page: page.index });
                    }
                    plans.push(page);
                }
                PageRole::Elevation => elevations.push(page),
            }
        }
        log::debug!(
            "{} plan pages, {} elevation pages",
            plans.len(),
            elevations.len()
        );

        let scale = ScaleResolver::from_options(options).resolve_document(plans.iter().copied());
        if !plans.is_empty() && scale.confidence != ScaleConfidence::Declared {
            warnings.push(ConversionWarning::LowConfidenceScale {
                confidence: scale.confidence,
                ratio: scale.ratio,
            });
        }

        let extractor = FeatureExtractor::new(options, scale);
        let mut features: BTreeMap<usize, PageFeatures> = BTreeMap::new();
        for result in extractor.extract_all(&plans) {
            match result {
                Ok(page_features) => {
                    features.insert(page_features.page, page_features);
                }
                Err(e) => match ConversionWarning::from_error(&e) {
                    Some(warning) => warnings.push(warning),
                    None => return Err(e),
                },
            }
        }

        let page_indices: Vec<usize> = features.keys().copied().collect();
        let floors = assign_floors(&page_indices, &options.page_floors);
        if floors.is_empty() {
            warnings.push(ConversionWarning::NoFloors);
            let model = Model {
                scale: (!plans.is_empty()).then_some(scale),
                metadata: document.metadata.clone(),
                ..Default::default()
            };
            return Ok(finish(model, warnings));
        }

        let hints = height_hints(&elevations, options);
        let mut heights = BTreeMap::new();
        let mut sources = BTreeMap::new();
        for &floor in floors.keys() {
            let (height, source) = match hints.get(&floor) {
                Some(hint) => {
                    warnings.push(ConversionWarning::InferredWallHeight {
                        floor,
                        height_mm: hint.wall_height_mm,
                        page: hint.page,
                    });
                    (hint.wall_height_mm, HeightSource::Elevation { page: hint.page })
                }
                None => (options.default_wall_height_mm, HeightSource::Configured),
            };
            heights.insert(floor, height);
            sources.insert(floor, source);
        }
        let offsets = elevation_offsets(&heights, options.slab_thickness_mm);

        let builder = FloorGraphBuilder::new(options, scale);
        let mut graphs = Vec::with_capacity(floors.len());
        for (&floor, pages) in &floors {
            let placement = FloorPlacement {
                floor_index: floor,
                elevation_offset: offsets[&floor],
                wall_height: heights[&floor],
                height_source: sources[&floor],
            };
            let page_features: Vec<&PageFeatures> =
                pages.iter().filter_map(|p| features.get(p)).collect();
            let (graph, graph_warnings) = builder.build(placement, &page_features);
            warnings.extend(graph_warnings);
            graphs.push(graph);
        }

        let synthesizer = MeshSynthesizer::new(options, scale);
        let mut meshes = Vec::with_capacity(graphs.len());
        for (mesh, mesh_warnings) in synthesizer.synthesize_all(&graphs) {
            warnings.extend(mesh_warnings);
            meshes.push(mesh);
        }

        let model = assemble(meshes, Some(scale), document.metadata.clone());
        Ok(finish(model, warnings))
    }
}

fn finish(model: Model, warnings: Vec<ConversionWarning>) -> Conversion {
    for warning in &warnings {
        log::warn!("{}", warning);
    }
    log::debug!(
        "Conversion done: {} floors, {} faces, {} warnings",
        model.floor_count(),
        model.mesh.face_count(),
        warnings.len()
    );
    Conversion { model, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, PagePrimitive, Point2, SkippedPage};
    use approx::assert_relative_eq;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> PagePrimitive {
        PagePrimitive::LineSegment {
            p0: Point2::new(x0, y0),
            p1: Point2::new(x1, y1),
            stroke_width: 1.0,
        }
    }

    fn text(s: &str, x: f64, y: f64) -> PagePrimitive {
        PagePrimitive::TextRun {
            text: s.to_string(),
            origin: Point2::new(x, y),
            font_size: 100.0,
        }
    }

    /// 4 x 3 m room at one page unit per millimetre with a door gap.
    fn room_page(index: usize) -> DecodedPage {
        let mut page = DecodedPage::new(index, 5000.0, 4000.0);
        let outer = [
            (1900.0, -50.0),
            (4050.0, -50.0),
            (4050.0, 3050.0),
            (-50.0, 3050.0),
            (-50.0, -50.0),
            (1000.0, -50.0),
        ];
        let inner = [
            (1900.0, 50.0),
            (3950.0, 50.0),
            (3950.0, 2950.0),
            (50.0, 2950.0),
            (50.0, 50.0),
            (1000.0, 50.0),
        ];
        for ring in [outer, inner] {
            for w in ring.windows(2) {
                page.primitives.push(line(w[0].0, w[0].1, w[1].0, w[1].1));
            }
        }
        page.primitives.push(line(1000.0, -50.0, 1000.0, 50.0));
        page.primitives.push(line(1900.0, -50.0, 1900.0, 50.0));
        page.primitives.push(text("DOOR", 1300.0, 300.0));
        page.primitives.push(text("LIVING", 1500.0, 1500.0));
        page
    }

    fn elevation_page(index: usize) -> DecodedPage {
        let mut page = DecodedPage::new(index, 5000.0, 4000.0);
        page.primitives.push(line(0.0, 0.0, 4000.0, 0.0));
        page.primitives.push(text("NORTH ELEVATION", 0.0, -500.0));
        page.primitives.push(text("+0.000", 4200.0, 0.0));
        page.primitives.push(text("+3.000", 4200.0, 3000.0));
        page
    }

    fn document(pages: Vec<DecodedPage>) -> DecodedDocument {
        DecodedDocument {
            metadata: Metadata::with_version("1.7"),
            pages,
            skipped_pages: Vec::new(),
        }
    }

    fn converter() -> Converter {
        Converter::new(ConvertOptions::default().with_scale(1.0))
    }

    #[test]
    fn test_single_room_model() {
        let conversion = converter()
            .convert_document(&document(vec![room_page(0)]))
            .unwrap();
        let model = &conversion.model;

        assert!(conversion.warnings.is_empty(), "{:?}", conversion.warnings);
        assert_eq!(model.floor_count(), 1);
        let stats = model.stats();
        assert_eq!(stats.wall_prisms, 4);
        assert_eq!(stats.opening_voids, 1);
        assert_eq!(stats.floor_caps, 1);
        assert_eq!(stats.ceiling_caps, 1);

        let size = model.bounding_box.size();
        assert_relative_eq!(size.x, 4100.0, epsilon = 1e-6);
        assert_relative_eq!(size.y, 3100.0, epsilon = 1e-6);
        assert_relative_eq!(size.z, 2700.0, epsilon = 1e-6);
        assert_eq!(model.metadata.pdf_version, "1.7");
    }

    #[test]
    fn test_two_floors_are_stacked() {
        let conversion = converter()
            .convert_document(&document(vec![room_page(0), room_page(1)]))
            .unwrap();
        let model = &conversion.model;

        assert_eq!(model.floor_count(), 2);
        assert_eq!(model.floor(0).unwrap().elevation_offset, 0.0);
        assert_eq!(model.floor(1).unwrap().elevation_offset, 2900.0);
        assert_relative_eq!(model.bounding_box.max.z, 5600.0, epsilon = 1e-6);
        assert_eq!(
            model.floor(0).unwrap().mesh.face_count(),
            model.floor(1).unwrap().mesh.face_count()
        );
    }

    #[test]
    fn test_elevation_sets_wall_height() {
        let conversion = converter()
            .convert_document(&document(vec![room_page(0), elevation_page(1)]))
            .unwrap();
        let floor = conversion.model.floor(0).unwrap();

        assert_eq!(floor.height_source, HeightSource::Elevation { page: 1 });
        assert_relative_eq!(floor.wall_height, 2800.0, epsilon = 1e-9);
        assert!(conversion.warnings.iter().any(|w| matches!(
            w,
            ConversionWarning::InferredWallHeight { floor: 0, page: 1, .. }
        )));
    }

    #[test]
    fn test_section_marker_keeps_plan() {
        let mut marked = room_page(1);
        marked.primitives.push(text("SECTION A-A", 4500.0, 3500.0));
        let conversion = converter()
            .convert_document(&document(vec![room_page(0), marked]))
            .unwrap();

        assert_eq!(conversion.model.floor_count(), 2);
        assert_eq!(
            conversion.warnings,
            vec![ConversionWarning::ViewTitleOnPlan { page: 1 }]
        );
    }

    #[test]
    fn test_page_roles() {
        let pages = vec![room_page(0), elevation_page(1), elevation_page(2)];
        assert_eq!(
            converter().page_roles(&pages),
            vec![PageRole::Plan, PageRole::Elevation, PageRole::Elevation]
        );

        let mapped = Converter::new(ConvertOptions::default().with_scale(1.0).with_page_floor(2, 1));
        assert_eq!(
            mapped.page_roles(&pages),
            vec![PageRole::Plan, PageRole::Elevation, PageRole::Plan]
        );
    }

    #[test]
    fn test_default_scale_is_reported() {
        let conversion = Converter::default()
            .convert_document(&document(vec![room_page(0)]))
            .unwrap();
        assert!(matches!(
            conversion.warnings[0],
            ConversionWarning::LowConfidenceScale {
                confidence: ScaleConfidence::Default,
                ..
            }
        ));
        assert_eq!(
            conversion.model.scale.map(|s| s.confidence),
            Some(ScaleConfidence::Default)
        );
    }

    #[test]
    fn test_no_walls_gives_empty_model() {
        let mut doc = document(vec![elevation_page(0)]);
        doc.skipped_pages.push(SkippedPage {
            index: 1,
            reason: SkipReason::NoVectorContent,
        });
        let conversion = converter().convert_document(&doc).unwrap();

        assert!(conversion.model.is_empty());
        assert_eq!(
            conversion.warnings,
            vec![
                ConversionWarning::UnsupportedPage { page: 1 },
                ConversionWarning::NoFloors,
            ]
        );
    }

    #[test]
    fn test_runs_are_identical() {
        let doc = document(vec![room_page(0), room_page(1)]);
        let first = converter().convert_document(&doc).unwrap();
        let second = converter().convert_document(&doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let converter = Converter::new(ConvertOptions::default().with_wall_height(0.0));
        assert!(matches!(
            converter.convert_document(&document(vec![room_page(0)])),
            Err(crate::error::Error::InvalidOptions(_))
        ));
    }
}
