use super::input::InputError;
use crate::core::models::object::SphereSet;
use nalgebra::Point3;
use std::io::Read;
use std::path::Path;

/// Reads a sphere file of whitespace-separated `x y z radius` records.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn read_spheres(path: &Path, name: &str) -> Result<SphereSet, InputError> {
    let file = std::fs::File::open(path).map_err(|e| InputError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    parse_spheres(file, &path.to_string_lossy(), name)
}

/// Parses sphere records from any reader. `label` identifies the source in errors.
pub fn parse_spheres(reader: impl Read, label: &str, name: &str) -> Result<SphereSet, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut positions = Vec::new();
    let mut radii = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| InputError::Csv {
            path: label.to_string(),
            source: e,
        })?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let fields: Vec<&str> = record.iter().flat_map(str::split_whitespace).collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 4 {
            return Err(InputError::Parse {
                path: label.to_string(),
                line,
                message: format!("expected 4 fields (x y z radius), found {}", fields.len()),
            });
        }
        let mut values = [0.0; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse::<f64>().map_err(|_| InputError::Parse {
                path: label.to_string(),
                line,
                message: format!("'{field}' is not a number"),
            })?;
        }
        positions.push(Point3::new(values[0], values[1], values[2]));
        radii.push(values[3]);
    }

    Ok(SphereSet::new(name, positions, radii)?)
}
