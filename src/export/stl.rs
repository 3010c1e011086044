//! ASCII STL writer.

use std::fmt::Write;

use super::{groups, ExportOptions};
use crate::error::{Error, Result};
use crate::model::Model;

/// Write the model as one ASCII STL solid.
///
/// Each facet carries the unit normal of its winding.
pub fn to_stl(model: &Model, options: &ExportOptions) -> Result<String> {
    let mut out = String::new();
    write_stl(&mut out, model, options).map_err(|e| Error::Export(e.to_string()))?;
    Ok(out)
}

fn write_stl(out: &mut String, model: &Model, options: &ExportOptions) -> std::fmt::Result {
    let factor = model.unit.convert(1.0, options.unit);
    let digits = options.precision;

    writeln!(out, "solid plan3d")?;
    for (_, mesh) in groups(model) {
        for f in &mesh.faces {
            let [a, b, c] = f.map(|i| mesh.vertices[i as usize].to_vector() * factor);
            let n = (b - a).cross(&(c - a));
            let n = n.try_normalize(0.0).unwrap_or(n);

            writeln!(
                out,
                "  facet normal {:.*} {:.*} {:.*}",
                digits, n.x, digits, n.y, digits, n.z
            )?;
            writeln!(out, "    outer loop")?;
            for v in [a, b, c] {
                writeln!(
                    out,
                    "      vertex {:.*} {:.*} {:.*}",
                    digits, v.x, digits, v.y, digits, v.z
                )?;
            }
            writeln!(out, "    endloop")?;
            writeln!(out, "  endfacet")?;
        }
    }
    writeln!(out, "endsolid plan3d")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures::two_floor_model;
    use crate::model::LengthUnit;

    #[test]
    fn test_stl_facets() {
        let stl = to_stl(&two_floor_model(), &ExportOptions::default()).unwrap();
        assert!(stl.starts_with("solid plan3d\n"));
        assert!(stl.ends_with("endsolid plan3d\n"));
        assert_eq!(stl.matches("facet normal").count(), 2);
        assert_eq!(stl.matches("      vertex").count(), 6);
        assert!(stl.contains("facet normal 0.000000 0.000000 1.000000"));
    }

    #[test]
    fn test_stl_unit() {
        let options = ExportOptions::new()
            .with_unit(LengthUnit::Metre)
            .with_precision(3);
        let stl = to_stl(&two_floor_model(), &options).unwrap();
        assert!(stl.contains("vertex 1.000 0.000 2.900"));
    }
}
