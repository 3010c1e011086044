//! End-to-end conversion of generated plan sets.

mod common;

use approx::assert_relative_eq;
use common::{
    bare_room_page, build_pdf, corner_door_page, elevation_page, room_page, scale_note_page,
    scanned_page, MM_PER_UNIT_1_100,
};
use plan3d::model::HeightSource;
use plan3d::{convert, ConversionWarning, ConvertOptions, Converter, Error, ScaleConfidence};

#[test]
fn test_room_with_door() {
    let pdf = build_pdf(vec![room_page()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();
    let model = &conversion.model;

    assert!(conversion.warnings.is_empty(), "{:?}", conversion.warnings);
    assert_eq!(model.floor_count(), 1);

    let stats = model.stats();
    assert_eq!(stats.wall_prisms, 4);
    assert_eq!(stats.opening_voids, 1);
    assert_eq!(stats.floor_caps, 1);
    assert_eq!(stats.ceiling_caps, 1);
    assert_eq!(stats.skipped_walls, 0);

    let size = model.bounding_box.size();
    assert_relative_eq!(size.x, 4100.0, epsilon = 1e-6);
    assert_relative_eq!(size.y, 3100.0, epsilon = 1e-6);
    assert_relative_eq!(size.z, 2700.0, epsilon = 1e-6);
    assert!(model.mesh.is_valid());
    assert_eq!(model.metadata.title.as_deref(), Some("Test House"));
}

#[test]
fn test_dimension_declares_scale() {
    let pdf = build_pdf(vec![room_page()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();
    let scale = conversion.model.scale.unwrap();

    assert_eq!(scale.confidence, ScaleConfidence::Declared);
    assert_relative_eq!(scale.to_mm(400.0), 4000.0, epsilon = 1e-9);
}

#[test]
fn test_override_matches_measured_scale() {
    let measured = convert(&build_pdf(vec![room_page()]), &ConvertOptions::default()).unwrap();
    let declared = convert(
        &build_pdf(vec![bare_room_page()]),
        &ConvertOptions::default().with_scale(10.0),
    )
    .unwrap();

    assert!(declared.warnings.is_empty(), "{:?}", declared.warnings);
    assert_eq!(
        declared.model.mesh.face_count(),
        measured.model.mesh.face_count()
    );
    let a = declared.model.bounding_box;
    let b = measured.model.bounding_box;
    assert_relative_eq!(a.max.x, b.max.x, epsilon = 1e-6);
    assert_relative_eq!(a.max.y, b.max.y, epsilon = 1e-6);
    assert_relative_eq!(a.min.x, b.min.x, epsilon = 1e-6);
}

#[test]
fn test_two_floors_stack() {
    let pdf = build_pdf(vec![room_page(), room_page()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();
    let model = &conversion.model;

    assert_eq!(model.floor_count(), 2);
    assert_eq!(model.floor(0).unwrap().elevation_offset, 0.0);
    assert_eq!(model.floor(1).unwrap().elevation_offset, 2700.0 + 200.0);
    assert_relative_eq!(model.bounding_box.min.z, 0.0, epsilon = 1e-9);
    assert_relative_eq!(model.bounding_box.max.z, 5600.0, epsilon = 1e-6);
    assert_eq!(
        model.mesh.face_count(),
        2 * model.floor(0).unwrap().mesh.face_count()
    );
}

#[test]
fn test_elevation_gives_wall_height() {
    let pdf = build_pdf(vec![room_page(), elevation_page()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();
    let floor = conversion.model.floor(0).unwrap();

    assert_eq!(conversion.model.floor_count(), 1);
    assert_eq!(floor.height_source, HeightSource::Elevation { page: 1 });
    assert_relative_eq!(floor.wall_height, 2800.0, epsilon = 1e-9);
    assert_relative_eq!(
        conversion.model.bounding_box.max.z,
        2800.0,
        epsilon = 1e-6
    );
    assert_eq!(
        conversion.warnings,
        vec![ConversionWarning::InferredWallHeight {
            floor: 0,
            height_mm: 2800.0,
            page: 1,
        }]
    );
}

#[test]
fn test_raster_only_document_is_rejected() {
    let pdf = build_pdf(vec![scanned_page(), scanned_page()]);
    match convert(&pdf, &ConvertOptions::default()) {
        Err(Error::UnsupportedContent { pages }) => assert_eq!(pages, vec![0, 1]),
        other => panic!("expected UnsupportedContent, got {:?}", other.map(|c| c.warnings)),
    }
}

#[test]
fn test_scanned_page_is_skipped() {
    let pdf = build_pdf(vec![scanned_page(), room_page()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();

    assert_eq!(conversion.model.floor_count(), 1);
    assert!(conversion
        .warnings
        .contains(&ConversionWarning::UnsupportedPage { page: 0 }));
}

#[test]
fn test_short_wall_is_excluded() {
    let pdf = build_pdf(vec![room_page().short_wall()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();
    let stats = conversion.model.stats();

    assert_eq!(stats.wall_prisms, 4);
    assert_eq!(stats.skipped_walls, 1);
    assert!(conversion.warnings.iter().any(|w| matches!(
        w,
        ConversionWarning::DegenerateGeometry { floor: 0, length_mm, .. }
            if (*length_mm - 80.0).abs() < 1e-6
    )));
    assert!(conversion
        .warnings
        .iter()
        .any(|w| matches!(w, ConversionWarning::DisconnectedGraph { floor: 0, components: 2 })));
}

#[test]
fn test_conversion_is_repeatable() {
    let pdf = build_pdf(vec![room_page(), room_page(), elevation_page()]);
    let converter = Converter::new(ConvertOptions::default());
    let first = converter.convert(&pdf).unwrap();
    let second = converter.convert(&pdf).unwrap();
    let sequential = Converter::new(ConvertOptions::default().sequential())
        .convert(&pdf)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.model.mesh, sequential.model.mesh);
}

#[test]
fn test_not_a_pdf() {
    assert!(matches!(
        convert(b"plain text, not a drawing", &ConvertOptions::default()),
        Err(Error::UnknownFormat)
    ));
}

#[test]
fn test_page_floor_mapping() {
    let pdf = build_pdf(vec![room_page(), room_page()]);
    let options = ConvertOptions::default()
        .with_page_floor(0, 0)
        .with_page_floor(1, 0);
    let conversion = convert(&pdf, &options).unwrap();

    // both pages land on floor 0
    assert_eq!(conversion.model.floor_count(), 1);
    assert_relative_eq!(
        conversion.model.bounding_box.max.z,
        2700.0,
        epsilon = 1e-6
    );
}

#[test]
fn test_section_marker_on_plan_keeps_floor() {
    let pdf = build_pdf(vec![
        room_page(),
        room_page().text("SECTION A-A", 600, 600, 8),
    ]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();

    assert_eq!(conversion.model.floor_count(), 2);
    assert_eq!(
        conversion.warnings,
        vec![ConversionWarning::ViewTitleOnPlan { page: 1 }]
    );
}

#[test]
fn test_door_against_corner() {
    let pdf = build_pdf(vec![corner_door_page()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();
    let stats = conversion.model.stats();

    assert!(conversion.warnings.is_empty(), "{:?}", conversion.warnings);
    assert_eq!(stats.wall_prisms, 4);
    assert_eq!(stats.opening_voids, 1);
    assert_eq!(stats.floor_caps, 1);
    assert_eq!(stats.ceiling_caps, 1);

    let size = conversion.model.bounding_box.size();
    assert_relative_eq!(size.x, 4100.0, epsilon = 1e-6);
    assert_relative_eq!(size.y, 3100.0, epsilon = 1e-6);
}

#[test]
fn test_scale_note_at_one_to_hundred() {
    let pdf = build_pdf(vec![scale_note_page()]);
    let conversion = convert(&pdf, &ConvertOptions::default()).unwrap();
    let model = &conversion.model;

    let scale = model.scale.unwrap();
    assert_eq!(scale.confidence, ScaleConfidence::Inferred);
    assert_relative_eq!(scale.ratio, MM_PER_UNIT_1_100, epsilon = 1e-9);
    assert_eq!(conversion.warnings.len(), 1);
    assert!(matches!(
        conversion.warnings[0],
        ConversionWarning::LowConfidenceScale {
            confidence: ScaleConfidence::Inferred,
            ..
        }
    ));

    let stats = model.stats();
    assert_eq!(stats.wall_prisms, 4);
    assert_eq!(stats.opening_voids, 1);
    let size = model.bounding_box.size();
    assert_relative_eq!(size.x, 4100.0, epsilon = 0.5);
    assert_relative_eq!(size.y, 3100.0, epsilon = 0.5);
    assert_relative_eq!(size.z, 2700.0, epsilon = 1e-6);
}
