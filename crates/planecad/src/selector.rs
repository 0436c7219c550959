//! String selectors for faces, edges and vertices.
//!
//! | syntax   | meaning                                                        |
//! |----------|----------------------------------------------------------------|
//! | `>D`     | objects whose center is furthest along `D` (ties kept)         |
//! | `<D`     | objects whose center is furthest against `D`                    |
//! | `>D[n]`  | n-th distinct position along `D`, counted from the far end      |
//! | `<D[n]`  | n-th distinct position along `D`, counted from the near end     |
//! | `\|D`    | direction parallel to `D`                                      |
//! | `#D`     | direction perpendicular to `D`                                 |
//! | `+D`     | direction pointing along `D`                                   |
//! | `-D`     | direction pointing against `D`                                 |
//!
//! `D` is one of `X`, `Y`, `Z`, `XY`, `XZ`, `YZ`, `XYZ`. The direction of a
//! face is its normal and the direction of an edge is its tangent; vertices
//! and curved faces have none. Negative indices count from the other end.

use std::fmt;
use std::str::FromStr;

use planecad_kernel::planecad_kernel_math::{Point3, Tolerance, Vec3};
use thiserror::Error;

/// Errors from parsing or applying a selector.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectorError {
    /// The selector string is empty.
    #[error("empty selector")]
    Empty,
    /// The first character is not a known operator.
    #[error("unknown selector operator '{0}'")]
    UnknownOperator(char),
    /// The axis letters are not one of the supported directions.
    #[error("unknown selector axis '{0}'")]
    UnknownAxis(String),
    /// The `[n]` suffix is malformed or used with the wrong operator.
    #[error("bad selector index in '{0}'")]
    BadIndex(String),
    /// `[n]` is beyond the number of distinct positions.
    #[error("selector index {index} out of range ({available} distinct positions)")]
    IndexOutOfRange {
        /// Requested index.
        index: i64,
        /// Number of distinct positions found.
        available: usize,
    },
}

/// Direction named in a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// World X.
    X,
    /// World Y.
    Y,
    /// World Z.
    Z,
    /// Diagonal (1, 1, 0).
    XY,
    /// Diagonal (1, 0, 1).
    XZ,
    /// Diagonal (0, 1, 1).
    YZ,
    /// Diagonal (1, 1, 1).
    XYZ,
}

impl Axis {
    /// Unit vector of this direction.
    pub fn direction(self) -> Vec3 {
        let v = match self {
            Axis::X => Vec3::x(),
            Axis::Y => Vec3::y(),
            Axis::Z => Vec3::z(),
            Axis::XY => Vec3::new(1.0, 1.0, 0.0),
            Axis::XZ => Vec3::new(1.0, 0.0, 1.0),
            Axis::YZ => Vec3::new(0.0, 1.0, 1.0),
            Axis::XYZ => Vec3::new(1.0, 1.0, 1.0),
        };
        v.normalize()
    }

    fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::XY => "XY",
            Axis::XZ => "XZ",
            Axis::YZ => "YZ",
            Axis::XYZ => "XYZ",
        }
    }
}

impl FromStr for Axis {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            "XY" => Ok(Axis::XY),
            "XZ" => Ok(Axis::XZ),
            "YZ" => Ok(Axis::YZ),
            "XYZ" => Ok(Axis::XYZ),
            _ => Err(SelectorError::UnknownAxis(s.to_string())),
        }
    }
}

/// What a selector tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// `>D`
    Max,
    /// `<D`
    Min,
    /// `>D[n]`
    NthFromMax(i64),
    /// `<D[n]`
    NthFromMin(i64),
    /// `|D`
    Parallel,
    /// `#D`
    Perpendicular,
    /// `+D`
    Along,
    /// `-D`
    Against,
}

/// A parsed selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    /// The test applied.
    pub kind: SelectorKind,
    /// The direction it is applied along.
    pub axis: Axis,
}

/// The geometry a selector looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Center (face centroid, edge midpoint or vertex position).
    pub position: Point3,
    /// Face normal or edge tangent.
    pub direction: Option<Vec3>,
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let op = chars.next().ok_or(SelectorError::Empty)?;
        let rest = chars.as_str();

        let (axis_str, index) = match rest.find('[') {
            Some(open) => {
                let inner = rest[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| SelectorError::BadIndex(s.to_string()))?;
                let n: i64 = inner
                    .trim()
                    .parse()
                    .map_err(|_| SelectorError::BadIndex(s.to_string()))?;
                (&rest[..open], Some(n))
            }
            None => (rest, None),
        };
        let axis: Axis = axis_str.parse()?;

        let kind = match (op, index) {
            ('>', None) => SelectorKind::Max,
            ('<', None) => SelectorKind::Min,
            ('>', Some(n)) => SelectorKind::NthFromMax(n),
            ('<', Some(n)) => SelectorKind::NthFromMin(n),
            ('|', None) => SelectorKind::Parallel,
            ('#', None) => SelectorKind::Perpendicular,
            ('+', None) => SelectorKind::Along,
            ('-', None) => SelectorKind::Against,
            ('|' | '#' | '+' | '-', Some(_)) => return Err(SelectorError::BadIndex(s.to_string())),
            (c, _) => return Err(SelectorError::UnknownOperator(c)),
        };
        Ok(Selector { kind, axis })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = self.axis.name();
        match self.kind {
            SelectorKind::Max => write!(f, ">{axis}"),
            SelectorKind::Min => write!(f, "<{axis}"),
            SelectorKind::NthFromMax(n) => write!(f, ">{axis}[{n}]"),
            SelectorKind::NthFromMin(n) => write!(f, "<{axis}[{n}]"),
            SelectorKind::Parallel => write!(f, "|{axis}"),
            SelectorKind::Perpendicular => write!(f, "#{axis}"),
            SelectorKind::Along => write!(f, "+{axis}"),
            SelectorKind::Against => write!(f, "-{axis}"),
        }
    }
}

impl Selector {
    /// Indices of the matching candidates, in input order.
    pub fn select(&self, candidates: &[Candidate]) -> Result<Vec<usize>, SelectorError> {
        let tol = Tolerance::SELECTION;
        let d = self.axis.direction();
        let along = |c: &Candidate| c.position.coords.dot(&d);
        let by_direction = |test: &dyn Fn(&Vec3) -> bool| -> Vec<usize> {
            candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| c.direction.as_ref().is_some_and(test))
                .map(|(i, _)| i)
                .collect()
        };

        let picked = match self.kind {
            SelectorKind::Max | SelectorKind::Min => {
                let sign = if self.kind == SelectorKind::Max { 1.0 } else { -1.0 };
                let Some(best) = candidates
                    .iter()
                    .map(|c| sign * along(c))
                    .max_by(f64::total_cmp)
                else {
                    return Ok(Vec::new());
                };
                candidates
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| best - sign * along(c) < tol.linear)
                    .map(|(i, _)| i)
                    .collect()
            }
            SelectorKind::NthFromMax(n) | SelectorKind::NthFromMin(n) => {
                // Only candidates whose direction is parallel to the axis
                // take part; vertex lists are never filtered.
                let point_like = candidates.iter().all(|c| c.direction.is_none());
                let eligible: Vec<usize> = candidates
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| match &c.direction {
                        Some(dir) => tol.parallel(dir, &d),
                        None => point_like,
                    })
                    .map(|(i, _)| i)
                    .collect();

                let mut levels: Vec<f64> = eligible.iter().map(|&i| along(&candidates[i])).collect();
                levels.sort_by(f64::total_cmp);
                levels.dedup_by(|b, a| (*b - *a).abs() < tol.linear);
                if matches!(self.kind, SelectorKind::NthFromMax(_)) {
                    levels.reverse();
                }

                let available = levels.len();
                let idx = if n < 0 { available as i64 + n } else { n };
                if idx < 0 || idx >= available as i64 {
                    return Err(SelectorError::IndexOutOfRange { index: n, available });
                }
                let level = levels[idx as usize];
                eligible
                    .into_iter()
                    .filter(|&i| (along(&candidates[i]) - level).abs() < tol.linear)
                    .collect()
            }
            SelectorKind::Parallel => by_direction(&|v: &Vec3| tol.parallel(v, &d)),
            SelectorKind::Perpendicular => by_direction(&|v: &Vec3| tol.perpendicular(v, &d)),
            SelectorKind::Along => by_direction(&|v: &Vec3| tol.same_direction(v, &d)),
            SelectorKind::Against => by_direction(&|v: &Vec3| tol.same_direction(v, &-d)),
        };

        tracing::trace!(selector = %self, from = candidates.len(), picked = picked.len(), "select");
        Ok(picked)
    }
}
