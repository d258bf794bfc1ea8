use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::map::feature::{Feature, FeatureCollection, FeatureValue, Geometry};

/// A topology-encoded geography document: shared delta-encoded arcs plus
/// named object groups referencing them.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<[f64; 2]>>,
    objects: IndexMap<String, RawObject>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

/// Untyped topology object; the `type` field decides which of the
/// optional payload fields is meaningful.
#[derive(Debug, Clone, Deserialize)]
struct RawObject {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<IndexMap<String, Value>>,
    #[serde(default)]
    coordinates: Option<Value>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    geometries: Option<Vec<RawObject>>,
}

/// Read and decode the geography document at `path`. Any failure is
/// fatal to initialization; rendering never starts from partial data.
pub fn load_geography(path: &Path) -> Result<IndexMap<String, FeatureCollection>> {
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let topology = Topology::from_slice(&bytes)?;
    let groups = topology.decode()?;
    log::info!(
        "decoded geography document {}: {} object group(s)",
        path.display(),
        groups.len()
    );
    Ok(groups)
}

impl Topology {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode every named object group into a feature collection, keyed
    /// by group name in document order.
    pub fn decode(&self) -> Result<IndexMap<String, FeatureCollection>> {
        let arcs = self.decode_arcs();
        let mut groups = IndexMap::with_capacity(self.objects.len());

        for (name, object) in &self.objects {
            let mut collection = FeatureCollection::default();
            self.decode_object(object, &arcs, &mut collection.features)?;
            groups.insert(name.clone(), collection);
        }

        Ok(groups)
    }

    /// Expand the delta-encoded arcs into absolute coordinates.
    fn decode_arcs(&self) -> Vec<Vec<[f64; 2]>> {
        self.arcs
            .iter()
            .map(|arc| match self.transform {
                Some(t) => {
                    let mut x = 0.0;
                    let mut y = 0.0;
                    arc.iter()
                        .map(|delta| {
                            x += delta[0];
                            y += delta[1];
                            [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                        })
                        .collect()
                }
                None => arc.clone(),
            })
            .collect()
    }

    fn decode_object(
        &self,
        object: &RawObject,
        arcs: &[Vec<[f64; 2]>],
        out: &mut Vec<Feature>,
    ) -> Result<()> {
        if object.kind == "GeometryCollection" {
            let geometries = object.geometries.as_deref().unwrap_or_default();
            for child in geometries {
                self.decode_object(child, arcs, out)?;
            }
            return Ok(());
        }

        let geometry = self.decode_geometry(object, arcs)?;
        out.push(Feature {
            id: object.id.as_ref().and_then(id_text),
            properties: object
                .properties
                .as_ref()
                .map(convert_properties)
                .unwrap_or_default(),
            geometry,
        });
        Ok(())
    }

    fn decode_geometry(&self, object: &RawObject, arcs: &[Vec<[f64; 2]>]) -> Result<Geometry> {
        match object.kind.as_str() {
            "Point" => Ok(Geometry::Point(self.transform_point(
                parse(object.coordinates.as_ref(), "Point coordinates")?,
            ))),
            "MultiPoint" => {
                let points: Vec<[f64; 2]> =
                    parse(object.coordinates.as_ref(), "MultiPoint coordinates")?;
                Ok(Geometry::MultiPoint(
                    points.into_iter().map(|p| self.transform_point(p)).collect(),
                ))
            }
            "LineString" => {
                let indexes: Vec<i64> = parse(object.arcs.as_ref(), "LineString arcs")?;
                Ok(Geometry::MultiLineString(vec![stitch(&indexes, arcs)?]))
            }
            "MultiLineString" => {
                let lines: Vec<Vec<i64>> = parse(object.arcs.as_ref(), "MultiLineString arcs")?;
                Ok(Geometry::MultiLineString(
                    lines
                        .iter()
                        .map(|indexes| stitch(indexes, arcs))
                        .collect::<Result<_>>()?,
                ))
            }
            "Polygon" => {
                let rings: Vec<Vec<i64>> = parse(object.arcs.as_ref(), "Polygon arcs")?;
                Ok(Geometry::Polygon(
                    rings
                        .iter()
                        .map(|indexes| stitch(indexes, arcs))
                        .collect::<Result<_>>()?,
                ))
            }
            "MultiPolygon" => {
                let polygons: Vec<Vec<Vec<i64>>> = parse(object.arcs.as_ref(), "MultiPolygon arcs")?;
                Ok(Geometry::MultiPolygon(
                    polygons
                        .iter()
                        .map(|rings| {
                            rings
                                .iter()
                                .map(|indexes| stitch(indexes, arcs))
                                .collect::<Result<_>>()
                        })
                        .collect::<Result<_>>()?,
                ))
            }
            other => Err(Error::Topology(format!("unsupported geometry type {other:?}"))),
        }
    }

    /// Point coordinates are quantized like arc coordinates, but not
    /// delta-encoded.
    fn transform_point(&self, point: [f64; 2]) -> [f64; 2] {
        match self.transform {
            Some(t) => [
                point[0] * t.scale[0] + t.translate[0],
                point[1] * t.scale[1] + t.translate[1],
            ],
            None => point,
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: Option<&Value>, what: &str) -> Result<T> {
    let value = value.ok_or_else(|| Error::Topology(format!("missing {what}")))?;
    serde_json::from_value(value.clone())
        .map_err(|err| Error::Topology(format!("invalid {what}: {err}")))
}

/// Concatenate a run of arcs into one line. A negative (ones-complement)
/// index selects the arc reversed; the shared junction point between
/// consecutive arcs appears only once.
fn stitch(indexes: &[i64], arcs: &[Vec<[f64; 2]>]) -> Result<Vec<[f64; 2]>> {
    let mut line: Vec<[f64; 2]> = Vec::new();

    for &index in indexes {
        let (arc_index, reversed) = if index < 0 {
            ((!index) as usize, true)
        } else {
            (index as usize, false)
        };
        let arc = arcs
            .get(arc_index)
            .ok_or_else(|| Error::Topology(format!("arc index {index} out of range")))?;

        let skip = usize::from(!line.is_empty());
        if reversed {
            line.extend(arc.iter().rev().skip(skip));
        } else {
            line.extend(arc.iter().skip(skip));
        }
    }

    Ok(line)
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn convert_properties(properties: &IndexMap<String, Value>) -> IndexMap<String, FeatureValue> {
    properties
        .iter()
        .filter_map(|(key, value)| {
            let converted = match value {
                Value::String(s) => FeatureValue::String(s.clone()),
                Value::Number(n) => FeatureValue::Number(n.as_f64()?),
                Value::Bool(b) => FeatureValue::Bool(*b),
                _ => {
                    log::warn!("dropping non-scalar property {key:?}");
                    return None;
                }
            };
            Some((key.clone(), converted))
        })
        .collect()
}
