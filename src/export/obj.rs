//! Wavefront OBJ writer and reader.

use std::fmt::Write;

use super::{groups, ExportOptions};
use crate::error::{Error, Result};
use crate::model::{LengthUnit, Mesh, Model, Point3};

/// Write the model as OBJ text, one `o floor_N` object per floor.
///
/// Face indices are 1-based and global across objects.
pub fn to_obj(model: &Model, options: &ExportOptions) -> Result<String> {
    let mut out = String::new();
    write_obj(&mut out, model, options).map_err(|e| Error::Export(e.to_string()))?;
    Ok(out)
}

fn write_obj(out: &mut String, model: &Model, options: &ExportOptions) -> std::fmt::Result {
    let factor = model.unit.convert(1.0, options.unit);
    let digits = options.precision;

    writeln!(out, "# plan3d {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "# unit: {}", options.unit)?;

    let mut base = 1u64;
    for (name, mesh) in groups(model) {
        writeln!(out, "o {}", name)?;
        for v in &mesh.vertices {
            writeln!(
                out,
                "v {:.*} {:.*} {:.*}",
                digits,
                v.x * factor,
                digits,
                v.y * factor,
                digits,
                v.z * factor
            )?;
        }
        for f in &mesh.faces {
            writeln!(
                out,
                "f {} {} {}",
                base + f[0] as u64,
                base + f[1] as u64,
                base + f[2] as u64
            )?;
        }
        base += mesh.vertices.len() as u64;
    }
    Ok(())
}

/// Read OBJ text back into a single mesh.
///
/// Understands `v` and `f` records (with `v/vt/vn` references and
/// negative indices) and the `# unit:` comment written by [`to_obj`].
/// Polygons are fanned into triangles; everything else is ignored.
pub fn parse_obj(text: &str) -> Result<Mesh> {
    let mut mesh = Mesh::new(LengthUnit::Millimetre);

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if let Some(unit) = line.strip_prefix("# unit:") {
            mesh.unit = unit_from_symbol(unit.trim()).unwrap_or(mesh.unit);
            continue;
        }

        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let coords: Vec<f64> = fields
                    .take(3)
                    .map(|s| s.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| Error::Export(format!("line {}: {}", number + 1, e)))?;
                if coords.len() != 3 {
                    return Err(Error::Export(format!(
                        "line {}: vertex needs 3 coordinates",
                        number + 1
                    )));
                }
                mesh.add_vertex(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let count = mesh.vertices.len();
                let indices: Vec<u32> = fields
                    .map(|s| resolve_index(s, count))
                    .collect::<Option<_>>()
                    .ok_or_else(|| {
                        Error::Export(format!("line {}: bad face index", number + 1))
                    })?;
                if indices.len() < 3 {
                    return Err(Error::Triangulation(format!(
                        "line {}: face has {} vertices",
                        number + 1,
                        indices.len()
                    )));
                }
                for i in 1..indices.len() - 1 {
                    mesh.faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
            _ => {}
        }
    }
    Ok(mesh)
}

/// Turn an OBJ vertex reference into a 0-based index.
fn resolve_index(field: &str, count: usize) -> Option<u32> {
    let raw: i64 = field.split('/').next()?.parse().ok()?;
    let index = match raw {
        0 => return None,
        n if n > 0 => n - 1,
        n => count as i64 + n,
    };
    if index < 0 || index as usize >= count {
        return None;
    }
    u32::try_from(index).ok()
}

fn unit_from_symbol(symbol: &str) -> Option<LengthUnit> {
    [
        LengthUnit::Millimetre,
        LengthUnit::Centimetre,
        LengthUnit::Metre,
        LengthUnit::Foot,
        LengthUnit::Inch,
    ]
    .into_iter()
    .find(|u| u.symbol() == symbol)
}
