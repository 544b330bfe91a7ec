use super::validation::ValidationError;
use nalgebra::Point3;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Matplotlib base colors, Tableau colors and CSS4 color names accepted as color tokens.
static NAMED_COLORS: phf::Set<&'static str> = phf::phf_set! {
    "b", "g", "r", "c", "m", "y", "k", "w",
    "tab:blue", "tab:orange", "tab:green", "tab:red", "tab:purple",
    "tab:brown", "tab:pink", "tab:gray", "tab:olive", "tab:cyan",
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque",
    "black", "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue",
    "chartreuse", "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan",
    "darkblue", "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey",
    "darkkhaki", "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred",
    "darksalmon", "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey",
    "darkturquoise", "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey",
    "dodgerblue", "firebrick", "floralwhite", "forestgreen", "fuchsia", "gainsboro",
    "ghostwhite", "gold", "goldenrod", "gray", "green", "greenyellow", "grey", "honeydew",
    "hotpink", "indianred", "indigo", "ivory", "khaki", "lavender", "lavenderblush",
    "lawngreen", "lemonchiffon", "lightblue", "lightcoral", "lightcyan",
    "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey", "lightpink",
    "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray", "lightslategrey",
    "lightsteelblue", "lightyellow", "lime", "limegreen", "linen", "magenta", "maroon",
    "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple", "mediumseagreen",
    "mediumslateblue", "mediumspringgreen", "mediumturquoise", "mediumvioletred",
    "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite", "navy", "oldlace",
    "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod", "palegreen",
    "paleturquoise", "palevioletred", "papayawhip", "peachpuff", "peru", "pink", "plum",
    "powderblue", "purple", "rebeccapurple", "red", "rosybrown", "royalblue",
    "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell", "sienna", "silver",
    "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen", "steelblue",
    "tan", "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white",
    "whitesmoke", "yellow", "yellowgreen",
};

/// An ordered set of spheres approximating the shape of an object.
///
/// The invariant `positions.len() == radii.len()` always holds, and every radius is
/// finite and non-negative. The first sphere center is the object's reference point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SphereSet {
    positions: Vec<Point3<f64>>,
    radii: Vec<f64>,
}

impl SphereSet {
    /// Creates a validated sphere set for the object `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - The owning object's name, used in error messages.
    /// * `positions` - Sphere centers; at least one is required.
    /// * `radii` - One non-negative radius per center.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if positions or radii are missing, their lengths
    /// differ, or any value is not finite or a radius is negative.
    pub fn new(
        name: &str,
        positions: Vec<Point3<f64>>,
        radii: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        if positions.is_empty() {
            return Err(ValidationError::MissingPositions(name.to_string()));
        }
        if radii.is_empty() {
            return Err(ValidationError::MissingRadii(name.to_string()));
        }
        if positions.len() != radii.len() {
            return Err(ValidationError::ShapeMismatch {
                name: name.to_string(),
                positions: positions.len(),
                radii: radii.len(),
            });
        }
        if let Some(row) = positions
            .iter()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(ValidationError::InvalidPosition {
                name: name.to_string(),
                row,
            });
        }
        if let Some((row, &value)) = radii
            .iter()
            .enumerate()
            .find(|(_, r)| !r.is_finite() || **r < 0.0)
        {
            return Err(ValidationError::InvalidRadius {
                name: name.to_string(),
                row,
                value,
            });
        }
        Ok(Self { positions, radii })
    }

    /// Builds a sphere set whose invariant is guaranteed by the caller.
    pub(crate) fn from_parts(positions: Vec<Point3<f64>>, radii: Vec<f64>) -> Self {
        debug_assert_eq!(positions.len(), radii.len());
        Self { positions, radii }
    }

    /// A set holding exactly one sphere.
    pub fn single(center: Point3<f64>, radius: f64) -> Self {
        Self {
            positions: vec![center],
            radii: vec![radius],
        }
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The first sphere center, which every dependent object reads as the anchor point.
    pub fn reference_point(&self) -> Option<&Point3<f64>> {
        self.positions.first()
    }

    /// Iterates over `(center, radius)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Point3<f64>, f64)> {
        self.positions.iter().zip(self.radii.iter().copied())
    }

    /// Concatenates several sets into one, preserving order.
    pub fn concat<'a>(sets: impl IntoIterator<Item = &'a SphereSet>) -> Self {
        let mut out = SphereSet::default();
        for set in sets {
            out.positions.extend_from_slice(&set.positions);
            out.radii.extend_from_slice(&set.radii);
        }
        out
    }
}

/// A display color for the (external) visualizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color(String);

impl Color {
    /// Validates a color token for the object `name`.
    ///
    /// Accepted tokens are matplotlib base colors (`"b"`, `"k"`, ...), Tableau colors
    /// (`"tab:blue"`, ...), CSS4 color names, and `#rrggbb` hex codes. Matching is
    /// case-insensitive.
    pub fn parse(name: &str, token: &str) -> Result<Self, ValidationError> {
        let normalized = token.trim().to_ascii_lowercase();
        if NAMED_COLORS.contains(normalized.as_str()) || is_hex_color(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(ValidationError::UnrecognizedColor {
                name: name.to_string(),
                color: token.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_hex_color(token: &str) -> bool {
    token
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an object's position is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementClass {
    /// Never moves.
    Static,
    /// Owns a slice of the design vector.
    #[default]
    Independent,
    /// Position derived purely from another object's resolved position.
    FullyDependent,
}

impl FromStr for MovementClass {
    type Err = ();

    /// Parses a movement class token. Case-insensitive; `_`, `-` and spaces are
    /// interchangeable separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "static" => Ok(MovementClass::Static),
            "independent" => Ok(MovementClass::Independent),
            "fully_dependent" => Ok(MovementClass::FullyDependent),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MovementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MovementClass::Static => "static",
            MovementClass::Independent => "independent",
            MovementClass::FullyDependent => "fully_dependent",
        };
        f.write_str(s)
    }
}

/// A single translational or rotational degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DegreeOfFreedom {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
}

impl FromStr for DegreeOfFreedom {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(DegreeOfFreedom::X),
            "y" => Ok(DegreeOfFreedom::Y),
            "z" => Ok(DegreeOfFreedom::Z),
            "rx" => Ok(DegreeOfFreedom::Rx),
            "ry" => Ok(DegreeOfFreedom::Ry),
            "rz" => Ok(DegreeOfFreedom::Rz),
            _ => Err(()),
        }
    }
}

/// The set of degrees of freedom an object may move along.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DegreesOfFreedom(BTreeSet<DegreeOfFreedom>);

impl DegreesOfFreedom {
    const TRANSLATION: [DegreeOfFreedom; 3] =
        [DegreeOfFreedom::X, DegreeOfFreedom::Y, DegreeOfFreedom::Z];
    const ROTATION: [DegreeOfFreedom; 3] =
        [DegreeOfFreedom::Rx, DegreeOfFreedom::Ry, DegreeOfFreedom::Rz];

    /// No degrees of freedom.
    pub fn none() -> Self {
        Self::default()
    }

    /// Full translation and rotation.
    pub fn all() -> Self {
        Self(
            Self::TRANSLATION
                .into_iter()
                .chain(Self::ROTATION)
                .collect(),
        )
    }

    /// Translation only.
    pub fn translation() -> Self {
        Self(Self::TRANSLATION.into_iter().collect())
    }

    /// Parses degree-of-freedom tokens for the object `name`.
    pub fn parse<S: AsRef<str>>(name: &str, tokens: &[S]) -> Result<Self, ValidationError> {
        tokens
            .iter()
            .map(|token| {
                token.as_ref().parse::<DegreeOfFreedom>().map_err(|_| {
                    ValidationError::UnrecognizedDegreeOfFreedom {
                        name: name.to_string(),
                        token: token.as_ref().to_string(),
                    }
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, dof: DegreeOfFreedom) -> bool {
        self.0.contains(&dof)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_full_translation(&self) -> bool {
        Self::TRANSLATION.iter().all(|d| self.0.contains(d))
    }

    pub fn has_full_rotation(&self) -> bool {
        Self::ROTATION.iter().all(|d| self.0.contains(d))
    }

    /// Length of the design-vector slice these degrees of freedom require: 0, 3 or 6.
    ///
    /// # Errors
    ///
    /// Any subset other than none, full translation, or full translation plus full
    /// rotation has no defined semantics and yields [`ValidationError::NotImplemented`].
    pub fn design_len(&self, name: &str) -> Result<usize, ValidationError> {
        match (
            self.is_empty(),
            self.has_full_translation(),
            self.has_full_rotation(),
        ) {
            (true, _, _) => Ok(0),
            (false, true, false) if self.0.len() == 3 => Ok(3),
            (false, true, true) => Ok(6),
            _ => Err(ValidationError::NotImplemented {
                name: name.to_string(),
                detail: format!("degrees of freedom {:?} are not supported", self.0),
            }),
        }
    }
}

/// Validates an object name.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        Err(ValidationError::EmptyName)
    } else {
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    #[test]
    fn sphere_set_accepts_matching_positions_and_radii() {
        let set = SphereSet::new("a", vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)], vec![0.5, 0.5])
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.reference_point(), Some(&p(0.0, 0.0, 0.0)));
    }

    #[test]
    fn sphere_set_rejects_missing_positions() {
        let err = SphereSet::new("a", vec![], vec![1.0]).unwrap_err();
        assert_eq!(err, ValidationError::MissingPositions("a".to_string()));
    }

    #[test]
    fn sphere_set_rejects_missing_radii() {
        let err = SphereSet::new("a", vec![p(0.0, 0.0, 0.0)], vec![]).unwrap_err();
        assert_eq!(err, ValidationError::MissingRadii("a".to_string()));
    }

    #[test]
    fn sphere_set_rejects_shape_mismatch() {
        let err = SphereSet::new("a", vec![p(0.0, 0.0, 0.0)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ShapeMismatch {
                positions: 1,
                radii: 2,
                ..
            }
        ));
    }

    #[test]
    fn sphere_set_rejects_negative_radius() {
        let err = SphereSet::new("a", vec![p(0.0, 0.0, 0.0)], vec![-0.1]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRadius { row: 0, .. }));
    }

    #[test]
    fn concat_preserves_order() {
        let a = SphereSet::single(p(0.0, 0.0, 0.0), 1.0);
        let b = SphereSet::single(p(2.0, 0.0, 0.0), 2.0);
        let c = SphereSet::concat([&a, &b]);
        assert_eq!(c.positions(), &[p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]);
        assert_eq!(c.radii(), &[1.0, 2.0]);
    }

    #[test]
    fn color_accepts_names_and_hex_codes() {
        assert!(Color::parse("a", "blue").is_ok());
        assert!(Color::parse("a", "Tab:Orange").is_ok());
        assert!(Color::parse("a", "k").is_ok());
        assert!(Color::parse("a", "#1F77b4").is_ok());
    }

    #[test]
    fn color_rejects_unknown_tokens() {
        assert!(matches!(
            Color::parse("a", "not-a-color"),
            Err(ValidationError::UnrecognizedColor { .. })
        ));
        assert!(Color::parse("a", "#12345").is_err());
    }

    #[test]
    fn movement_class_parses_separators_interchangeably() {
        assert_eq!("static".parse(), Ok(MovementClass::Static));
        assert_eq!("Independent".parse(), Ok(MovementClass::Independent));
        assert_eq!("fully dependent".parse(), Ok(MovementClass::FullyDependent));
        assert_eq!("fully-dependent".parse(), Ok(MovementClass::FullyDependent));
        assert_eq!("partially_dependent".parse::<MovementClass>(), Err(()));
    }

    #[test]
    fn degrees_of_freedom_reject_unknown_tokens() {
        let err = DegreesOfFreedom::parse("a", &["x", "w"]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnrecognizedDegreeOfFreedom { ref token, .. } if token == "w"
        ));
    }

    #[test]
    fn design_len_follows_translation_and_rotation() {
        assert_eq!(DegreesOfFreedom::none().design_len("a"), Ok(0));
        assert_eq!(DegreesOfFreedom::translation().design_len("a"), Ok(3));
        assert_eq!(DegreesOfFreedom::all().design_len("a"), Ok(6));
    }

    #[test]
    fn design_len_rejects_partial_subsets() {
        let dof = DegreesOfFreedom::parse("a", &["x", "y"]).unwrap();
        assert!(matches!(
            dof.design_len("a"),
            Err(ValidationError::NotImplemented { .. })
        ));
        let rotation_only = DegreesOfFreedom::parse("a", &["rx", "ry", "rz"]).unwrap();
        assert!(rotation_only.design_len("a").is_err());
        let partial_rotation = DegreesOfFreedom::parse("a", &["x", "y", "z", "rx"]).unwrap();
        assert!(partial_rotation.has_full_translation());
        assert!(!partial_rotation.has_full_rotation());
        assert!(partial_rotation.design_len("a").is_err());
    }

    #[test]
    fn validate_name_rejects_blank_names() {
        assert_eq!(validate_name("  "), Err(ValidationError::EmptyName));
        assert_eq!(validate_name("pump"), Ok("pump".to_string()));
    }
}
