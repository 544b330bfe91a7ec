use super::xyzr::read_spheres;
use crate::core::models::component::Component;
use crate::core::models::interconnect::Interconnect;
use crate::core::models::object::{Color, DegreesOfFreedom, MovementClass, SphereSet};
use crate::core::models::port::Port;
use crate::core::models::structure::Structure;
use crate::core::models::system::SpatialSystem;
use crate::core::models::validation::ValidationError;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const DEFAULT_COLOR: &str = "gray";
const DEFAULT_PORT_RADIUS: f64 = 0.0;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Parse error in '{path}' on line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
    #[error("Object '{0}' gives both 'spheres' and 'spheres-file'")]
    AmbiguousGeometry(String),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct InputDocument {
    #[serde(default)]
    components: Vec<ComponentEntry>,
    #[serde(default)]
    ports: Vec<PortEntry>,
    #[serde(default)]
    interconnects: Vec<InterconnectEntry>,
    #[serde(default)]
    structures: Vec<StructureEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ComponentEntry {
    name: toml::Value,
    color: Option<String>,
    movement_class: Option<String>,
    degrees_of_freedom: Option<Vec<String>>,
    spheres_file: Option<PathBuf>,
    spheres: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PortEntry {
    component: String,
    name: toml::Value,
    offset: [f64; 3],
    radius: Option<f64>,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct InterconnectEntry {
    name: toml::Value,
    component_1: String,
    port_1: String,
    component_2: String,
    port_2: String,
    radius: f64,
    color: Option<String>,
    #[serde(default)]
    bends: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct StructureEntry {
    name: toml::Value,
    color: Option<String>,
    spheres_file: Option<PathBuf>,
    spheres: Option<Vec<Vec<f64>>>,
}

/// Loads and validates a spatial system from a TOML input document.
///
/// Relative `spheres-file` paths are resolved against the document's directory.
pub fn load_system(path: &Path) -> Result<SpatialSystem, InputError> {
    let content = std::fs::read_to_string(path).map_err(|e| InputError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_system(&content, base_dir, &path.to_string_lossy())
}

/// Parses and validates a spatial system from TOML text.
///
/// # Arguments
///
/// * `content` - The TOML document.
/// * `base_dir` - Directory against which relative sphere files are resolved.
/// * `label` - Name of the source, used in error messages.
///
/// # Errors
///
/// Fails on the first malformed entry, before any object graph is assembled.
pub fn parse_system(content: &str, base_dir: &Path, label: &str) -> Result<SpatialSystem, InputError> {
    let document: InputDocument = toml::from_str(content).map_err(|e| InputError::Toml {
        path: label.to_string(),
        source: e,
    })?;
    debug!(
        components = document.components.len(),
        ports = document.ports.len(),
        interconnects = document.interconnects.len(),
        structures = document.structures.len(),
        "Parsed input document"
    );

    let mut builder = SpatialSystem::builder();

    for entry in document.components {
        let name = entry_name(&entry.name)?;
        let color = parse_color(name, entry.color.as_deref())?;
        let movement_class = match entry.movement_class.as_deref() {
            None => MovementClass::default(),
            Some(token) => token.parse::<MovementClass>().map_err(|_| {
                ValidationError::UnsupportedMovementClass {
                    name: name.to_string(),
                    class: token.to_string(),
                }
            })?,
        };
        let degrees_of_freedom = match &entry.degrees_of_freedom {
            None => DegreesOfFreedom::all(),
            Some(tokens) => DegreesOfFreedom::parse(name, tokens)?,
        };
        let spheres = load_geometry(
            name,
            entry.spheres_file.as_deref(),
            entry.spheres.as_deref(),
            base_dir,
            label,
        )?;
        builder.add_component(Component::new(
            name,
            color,
            movement_class,
            degrees_of_freedom,
            spheres,
        )?);
    }

    for entry in document.ports {
        let name = entry_name(&entry.name)?;
        let color = parse_color(name, entry.color.as_deref())?;
        builder.add_port(Port::new(
            &entry.component,
            name,
            Vector3::from(entry.offset),
            entry.radius.unwrap_or(DEFAULT_PORT_RADIUS),
            color,
        )?);
    }

    for entry in document.interconnects {
        let name = entry_name(&entry.name)?;
        let color = parse_color(name, entry.color.as_deref())?;
        builder.add_interconnect(Interconnect::new(
            name,
            (entry.component_1.as_str(), entry.port_1.as_str()),
            (entry.component_2.as_str(), entry.port_2.as_str()),
            entry.radius,
            color,
            entry.bends,
        )?);
    }

    for entry in document.structures {
        let name = entry_name(&entry.name)?;
        let color = parse_color(name, entry.color.as_deref())?;
        let spheres = load_geometry(
            name,
            entry.spheres_file.as_deref(),
            entry.spheres.as_deref(),
            base_dir,
            label,
        )?;
        builder.add_structure(Structure::new(name, color, spheres)?);
    }

    Ok(builder.build()?)
}

fn entry_name(value: &toml::Value) -> Result<&str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::NonStringName {
            found: value.to_string(),
        })
}

fn parse_color(name: &str, token: Option<&str>) -> Result<Color, ValidationError> {
    Color::parse(name, token.unwrap_or(DEFAULT_COLOR))
}

fn load_geometry(
    name: &str,
    spheres_file: Option<&Path>,
    inline: Option<&[Vec<f64>]>,
    base_dir: &Path,
    label: &str,
) -> Result<SphereSet, InputError> {
    match (spheres_file, inline) {
        (Some(_), Some(_)) => Err(InputError::AmbiguousGeometry(name.to_string())),
        (Some(file), None) => read_spheres(&base_dir.join(file), name),
        (None, Some(rows)) => inline_spheres(name, rows, label),
        (None, None) => Err(ValidationError::MissingPositions(name.to_string()).into()),
    }
}

fn inline_spheres(name: &str, rows: &[Vec<f64>], label: &str) -> Result<SphereSet, InputError> {
    let mut positions = Vec::with_capacity(rows.len());
    let mut radii = Vec::with_capacity(rows.len());
    for (row, values) in rows.iter().enumerate() {
        match values.as_slice() {
            [x, y, z, r] => {
                positions.push(Point3::new(*x, *y, *z));
                radii.push(*r);
            }
            _ => {
                return Err(InputError::Parse {
                    path: label.to_string(),
                    line: row + 1,
                    message: format!(
                        "sphere row {row} of '{name}' must be [x, y, z, radius], found {} values",
                        values.len()
                    ),
                });
            }
        }
    }
    Ok(SphereSet::new(name, positions, radii)?)
}
