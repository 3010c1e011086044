//! Benchmarks for plan3d conversion performance.
//!
//! Run with: cargo bench
//!
//! The plans are synthetic: a row of rooms drawn as double wall lines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plan3d::model::{DecodedDocument, DecodedPage, Metadata, PagePrimitive, Point2};
use plan3d::{ConvertOptions, Converter};

const ROOM_W: f64 = 400.0;
const ROOM_H: f64 = 300.0;
const HALF_WALL: f64 = 5.0;

fn line(page: &mut DecodedPage, x0: f64, y0: f64, x1: f64, y1: f64) {
    page.primitives.push(PagePrimitive::LineSegment {
        p0: Point2::new(x0, y0),
        p1: Point2::new(x1, y1),
        stroke_width: 0.5,
    });
}

/// A row of `rooms` rooms, 10 mm per page unit.
fn row_of_rooms(index: usize, rooms: usize) -> DecodedPage {
    let length = rooms as f64 * ROOM_W;
    let mut page = DecodedPage::new(index, length + 200.0, ROOM_H + 200.0);

    for y in [0.0, ROOM_H] {
        line(&mut page, -HALF_WALL, y - HALF_WALL, length + HALF_WALL, y - HALF_WALL);
        line(&mut page, -HALF_WALL, y + HALF_WALL, length + HALF_WALL, y + HALF_WALL);
    }
    for i in 0..=rooms {
        let x = i as f64 * ROOM_W;
        line(&mut page, x - HALF_WALL, HALF_WALL, x - HALF_WALL, ROOM_H - HALF_WALL);
        line(&mut page, x + HALF_WALL, HALF_WALL, x + HALF_WALL, ROOM_H - HALF_WALL);
        if i < rooms {
            page.primitives.push(PagePrimitive::TextRun {
                text: format!("ROOM {}", i + 1),
                origin: Point2::new(x + 150.0, 150.0),
                font_size: 8.0,
            });
        }
    }
    page
}

fn document(floors: usize, rooms: usize) -> DecodedDocument {
    DecodedDocument {
        metadata: Metadata::with_version("1.7"),
        pages: (0..floors).map(|i| row_of_rooms(i, rooms)).collect(),
        skipped_pages: Vec::new(),
    }
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_document");

    for rooms in [4, 16, 64] {
        let doc = document(3, rooms);
        let parallel = Converter::new(ConvertOptions::default().with_scale(10.0));
        let sequential = Converter::new(ConvertOptions::default().with_scale(10.0).sequential());

        group.bench_with_input(BenchmarkId::new("parallel", rooms), &doc, |b, doc| {
            b.iter(|| parallel.convert_document(black_box(doc)))
        });
        group.bench_with_input(BenchmarkId::new("sequential", rooms), &doc, |b, doc| {
            b.iter(|| sequential.convert_document(black_box(doc)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
