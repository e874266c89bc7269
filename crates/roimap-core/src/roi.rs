//! Region-of-interest geometry and its exchange record.
//!
//! An ROI is either a polygon (ordered vertices) or a trapezoid strip
//! (ordered `(x, y, width)` triples). Values are immutable; every transform
//! builds a new [`Roi`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use crate::scaling::{scale_point, scale_width};
use crate::spatial::Point2;

/// Errors raised when converting exchange records into ROIs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoiError {
    #[error("ROI record is missing `{0}`")]
    MissingField(&'static str),

    #[error("Unknown ROI type `{0}`")]
    UnknownType(String),

    #[error("ROI vertex {index} has {actual} values, expected {expected}")]
    TupleLength { index: usize, expected: usize, actual: usize },

    #[error("ROI vertex {index} is not finite")]
    NonFinite { index: usize },

    #[error("Expected {expected} positions, got {actual}")]
    VertexCount { expected: usize, actual: usize },
}

/// One trapezoid vertex: a centreline point and the strip width there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidVertex {
    pub point: Point2,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoiGeometry {
    Polygon(Vec<Point2>),
    Trapezoid(Vec<TrapezoidVertex>),
}

impl RoiGeometry {
    /// Exchange-format type name.
    pub fn kind(&self) -> &'static str {
        match self {
            RoiGeometry::Polygon(_) => "polygon",
            RoiGeometry::Trapezoid(_) => "trapezoid",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RoiGeometry::Polygon(v) => v.len(),
            RoiGeometry::Trapezoid(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A labelled region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub label: String,
    pub geometry: RoiGeometry,
}

impl Roi {
    pub fn polygon(label: impl Into<String>, vertices: Vec<Point2>) -> Self {
        Self { label: label.into(), geometry: RoiGeometry::Polygon(vertices) }
    }

    pub fn trapezoid(label: impl Into<String>, vertices: Vec<TrapezoidVertex>) -> Self {
        Self { label: label.into(), geometry: RoiGeometry::Trapezoid(vertices) }
    }

    /// Vertex positions in order, widths dropped.
    pub fn positions(&self) -> Vec<Point2> {
        match &self.geometry {
            RoiGeometry::Polygon(v) => v.clone(),
            RoiGeometry::Trapezoid(v) => v.iter().map(|t| t.point).collect(),
        }
    }

    /// Same ROI with every position replaced; widths are kept.
    pub fn with_positions(&self, positions: Vec<Point2>) -> Result<Self, RoiError> {
        if positions.len() != self.geometry.len() {
            return Err(RoiError::VertexCount {
                expected: self.geometry.len(),
                actual: positions.len(),
            });
        }
        let geometry = match &self.geometry {
            RoiGeometry::Polygon(_) => RoiGeometry::Polygon(positions),
            RoiGeometry::Trapezoid(v) => RoiGeometry::Trapezoid(
                v.iter()
                    .zip(positions)
                    .map(|(t, point)| TrapezoidVertex { point, width: t.width })
                    .collect(),
            ),
        };
        Ok(Self { label: self.label.clone(), geometry })
    }

    /// Scale every vertex by `(p + 0.5) * factor` and every width by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let geometry = match &self.geometry {
            RoiGeometry::Polygon(v) => {
                RoiGeometry::Polygon(v.iter().map(|p| scale_point(p, factor)).collect())
            }
            RoiGeometry::Trapezoid(v) => RoiGeometry::Trapezoid(
                v.iter()
                    .map(|t| TrapezoidVertex {
                        point: scale_point(&t.point, factor),
                        width: scale_width(t.width, factor),
                    })
                    .collect(),
            ),
        };
        Self { label: self.label.clone(), geometry }
    }

    /// Coordinate tuples as they appear in the exchange record's `data`.
    pub fn to_data(&self) -> Vec<Vec<f64>> {
        match &self.geometry {
            RoiGeometry::Polygon(v) => v.iter().map(|p| vec![p.x(), p.y()]).collect(),
            RoiGeometry::Trapezoid(v) => v
                .iter()
                .map(|t| vec![t.point.x(), t.point.y(), t.width])
                .collect(),
        }
    }
}

/// ROI exchange record: `{"type", "data", "label", ...}`.
///
/// Fields other than these three are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoiRecord {
    /// Record for a freshly built ROI, with no extra fields.
    pub fn from_roi(roi: &Roi) -> Self {
        Self {
            kind: Some(roi.geometry.kind().to_string()),
            data: Some(roi.to_data()),
            label: roi.label.clone(),
            extra: Map::new(),
        }
    }

    /// Copy of this record carrying `roi`'s geometry; extra fields survive.
    pub fn with_roi(&self, roi: &Roi) -> Self {
        Self {
            kind: Some(roi.geometry.kind().to_string()),
            data: Some(roi.to_data()),
            label: roi.label.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Parse and validate into an [`Roi`].
    pub fn to_roi(&self) -> Result<Roi, RoiError> {
        let kind = self.kind.as_deref().ok_or(RoiError::MissingField("type"))?;
        let data = self.data.as_ref().ok_or(RoiError::MissingField("data"))?;

        let expected = match kind {
            "polygon" => 2,
            "trapezoid" => 3,
            other => return Err(RoiError::UnknownType(other.to_string())),
        };
        for (index, tuple) in data.iter().enumerate() {
            if tuple.len() != expected {
                return Err(RoiError::TupleLength { index, expected, actual: tuple.len() });
            }
            if tuple.iter().any(|v| !v.is_finite()) {
                return Err(RoiError::NonFinite { index });
            }
        }

        let geometry = if expected == 2 {
            RoiGeometry::Polygon(data.iter().map(|t| Point2::new([t[0], t[1]])).collect())
        } else {
            RoiGeometry::Trapezoid(
                data.iter()
                    .map(|t| TrapezoidVertex { point: Point2::new([t[0], t[1]]), width: t[2] })
                    .collect(),
            )
        };
        Ok(Roi { label: self.label.clone(), geometry })
    }
}

impl TryFrom<&RoiRecord> for Roi {
    type Error = RoiError;

    fn try_from(record: &RoiRecord) -> Result<Self, Self::Error> {
        record.to_roi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> RoiRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_polygon() {
        let roi = record(r#"{"type": "polygon", "data": [[1, 2], [3, 4.5]], "label": "gm"}"#)
            .to_roi()
            .unwrap();
        assert_eq!(roi.label, "gm");
        assert_eq!(
            roi.geometry,
            RoiGeometry::Polygon(vec![Point2::new([1.0, 2.0]), Point2::new([3.0, 4.5])])
        );
    }

    #[test]
    fn test_parse_trapezoid() {
        let roi = record(r#"{"type": "trapezoid", "data": [[10, 20, 4]], "label": ""}"#)
            .to_roi()
            .unwrap();
        match roi.geometry {
            RoiGeometry::Trapezoid(v) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].point, Point2::new([10.0, 20.0]));
                assert_eq!(v[0].width, 4.0);
            }
            other => panic!("expected trapezoid, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_records_are_rejected() {
        assert_eq!(
            record(r#"{"data": [[1, 2]]}"#).to_roi(),
            Err(RoiError::MissingField("type"))
        );
        assert_eq!(
            record(r#"{"type": "polygon"}"#).to_roi(),
            Err(RoiError::MissingField("data"))
        );
        assert_eq!(
            record(r#"{"type": "ellipse", "data": []}"#).to_roi(),
            Err(RoiError::UnknownType("ellipse".to_string()))
        );
        assert_eq!(
            record(r#"{"type": "trapezoid", "data": [[1, 2, 3], [1, 2]]}"#).to_roi(),
            Err(RoiError::TupleLength { index: 1, expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_trapezoid_scaling() {
        let roi = Roi::trapezoid(
            "strip",
            vec![TrapezoidVertex { point: Point2::new([10.0, 20.0]), width: 4.0 }],
        );
        let data = roi.scaled(0.1).to_data();
        assert_eq!(data.len(), 1);
        assert!((data[0][0] - 1.05).abs() < 1e-12);
        assert!((data[0][1] - 2.05).abs() < 1e-12);
        assert!((data[0][2] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_with_positions_keeps_widths_and_checks_count() {
        let roi = Roi::trapezoid(
            "strip",
            vec![
                TrapezoidVertex { point: Point2::new([0.0, 0.0]), width: 2.0 },
                TrapezoidVertex { point: Point2::new([1.0, 1.0]), width: 3.0 },
            ],
        );
        let moved = roi
            .with_positions(vec![Point2::new([5.0, 5.0]), Point2::new([6.0, 6.0])])
            .unwrap();
        assert_eq!(moved.to_data(), vec![vec![5.0, 5.0, 2.0], vec![6.0, 6.0, 3.0]]);
        assert!(roi.with_positions(vec![Point2::new([5.0, 5.0])]).is_err());
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let original = record(
            r#"{"type": "polygon", "data": [[0, 0]], "label": "a", "id": 17, "color": "red"}"#,
        );
        let roi = Roi::polygon("a", vec![Point2::new([9.0, 8.0])]);
        let updated = original.with_roi(&roi);

        let json = serde_json::to_value(&updated).unwrap();
        assert_eq!(json["id"], 17);
        assert_eq!(json["color"], "red");
        assert_eq!(json["type"], "polygon");
        assert_eq!(json["data"], serde_json::json!([[9.0, 8.0]]));
    }
}
