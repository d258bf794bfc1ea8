use indexmap::IndexMap;

/// Geographic geometry in (longitude, latitude) degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point([f64; 2]),
    MultiPoint(Vec<[f64; 2]>),
    MultiLineString(Vec<Vec<[f64; 2]>>),
    /// Outer ring first, holes after.
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl FeatureValue {
    /// Text rendition used when composing class tokens.
    pub fn as_text(&self) -> String {
        match self {
            FeatureValue::String(v) => v.clone(),
            FeatureValue::Number(v) => fmt_number(*v),
            FeatureValue::Bool(v) => v.to_string(),
        }
    }
}

/// One decoded topology feature: optional identifier, ordered property
/// bag and a geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: IndexMap<String, FeatureValue>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// Derive the class string used as the styling hook for a feature:
/// one token for the id (if any) followed by one `key-value` token per
/// property, in the property bag's insertion order.
pub fn classify(feature: &Feature) -> String {
    let mut tokens = Vec::with_capacity(1 + feature.properties.len());

    if let Some(id) = &feature.id {
        tokens.push(css_token(id));
    }

    for (key, value) in &feature.properties {
        tokens.push(css_token(&format!("{}-{}", key, value.as_text())));
    }

    tokens.join(" ")
}

/// Sanitize arbitrary text into a CSS-safe token: lowercased, whitespace
/// runs collapsed to a single dash, everything else outside
/// `[a-z0-9_-]` dropped.
pub fn css_token(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_dash = !out.is_empty();
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        for lower in ch.to_lowercase() {
            if lower.is_ascii_alphanumeric() || lower == '-' || lower == '_' {
                out.push(lower);
            }
        }
    }

    out
}

/// Anchor point of a geometry under the identity projection, i.e. in
/// geographic coordinate space. Polygons use the area-weighted centroid
/// so the anchor is stable regardless of the active map projection.
pub fn centroid(geometry: &Geometry) -> Option<[f64; 2]> {
    match geometry {
        Geometry::Point(point) => Some(*point),
        Geometry::MultiPoint(points) => mean(points),
        Geometry::MultiLineString(lines) => lines_centroid(lines),
        Geometry::Polygon(rings) => rings_centroid(std::slice::from_ref(rings)),
        Geometry::MultiPolygon(polygons) => rings_centroid(polygons),
    }
}

fn mean(points: &[[f64; 2]]) -> Option<[f64; 2]> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    Some([sx / n, sy / n])
}

/// Length-weighted midpoint of a set of polylines.
fn lines_centroid(lines: &[Vec<[f64; 2]>]) -> Option<[f64; 2]> {
    let mut total = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;

    for line in lines {
        for pair in line.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let len = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
            total += len;
            sx += (a[0] + b[0]) / 2.0 * len;
            sy += (a[1] + b[1]) / 2.0 * len;
        }
    }

    if total > 0.0 {
        Some([sx / total, sy / total])
    } else {
        mean(&lines.iter().flatten().copied().collect::<Vec<_>>())
    }
}

fn rings_centroid(polygons: &[Vec<Vec<[f64; 2]>>]) -> Option<[f64; 2]> {
    accumulate_rings(polygons.iter().flatten())
}

/// Shoelace accumulation over all rings. Holes carry opposite winding
/// and subtract themselves from the total.
fn accumulate_rings<'a, I>(rings: I) -> Option<[f64; 2]>
where
    I: Iterator<Item = &'a Vec<[f64; 2]>> + Clone,
{
    let mut area2 = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;

    for ring in rings.clone() {
        for pair in ring.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let cross = a[0] * b[1] - b[0] * a[1];
            area2 += cross;
            sx += (a[0] + b[0]) * cross;
            sy += (a[1] + b[1]) * cross;
        }
        // Rings may omit the closing point.
        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
            if first != last {
                let cross = last[0] * first[1] - first[0] * last[1];
                area2 += cross;
                sx += (last[0] + first[0]) * cross;
                sy += (last[1] + first[1]) * cross;
            }
        }
    }

    if area2.abs() > f64::EPSILON {
        Some([sx / (3.0 * area2), sy / (3.0 * area2)])
    } else {
        // Degenerate ring, fall back to the vertex mean.
        mean(&rings.flatten().copied().collect::<Vec<_>>())
    }
}

/// Format a number the way it would read in a label: no exponent, no
/// trailing fractional zeros.
pub fn fmt_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let mut s = format!("{value:.6}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn feature(id: Option<&str>, props: &[(&str, FeatureValue)], geometry: Geometry) -> Feature {
        Feature {
            id: id.map(str::to_string),
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            geometry,
        }
    }

    #[test]
    fn classify_joins_id_and_property_tokens_in_order() {
        let f = feature(
            Some("New Mexico"),
            &[
                ("fuel", FeatureValue::String("Coal".into())),
                ("capacity", FeatureValue::Number(2.0)),
            ],
            Geometry::Point([-106.0, 34.5]),
        );
        assert_eq!(classify(&f), "new-mexico fuel-coal capacity-2");
    }

    #[test]
    fn classify_without_id_emits_property_tokens_only() {
        let f = feature(
            None,
            &[("online", FeatureValue::Bool(true))],
            Geometry::Point([0.0, 0.0]),
        );
        assert_eq!(classify(&f), "online-true");
    }

    #[test]
    fn css_token_sanitizes() {
        assert_eq!(css_token("St. Louis"), "st-louis");
        assert_eq!(css_token("  Rio   Grande  "), "rio-grande");
        assert_eq!(css_token("Washington, D.C."), "washington-dc");
        assert_eq!(css_token("A&B_c"), "ab_c");
    }

    #[test]
    fn centroid_of_point_is_the_point() {
        assert_eq!(
            centroid(&Geometry::Point([-96.0, 38.0])),
            Some([-96.0, 38.0])
        );
    }

    #[test]
    fn centroid_of_square_is_its_middle() {
        let ring = vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 4.0],
            [0.0, 4.0],
            [0.0, 0.0],
        ];
        let c = centroid(&Geometry::Polygon(vec![ring])).unwrap();
        assert_relative_eq!(c[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(c[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn centroid_ignores_area_removed_by_a_hole() {
        // Square with a hole in its left half pushes the centroid right.
        let outer = vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 4.0],
            [0.0, 4.0],
            [0.0, 0.0],
        ];
        let hole = vec![
            [1.0, 1.0],
            [1.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
        ];
        let c = centroid(&Geometry::Polygon(vec![outer, hole])).unwrap();
        assert!(c[0] > 2.0);
        assert_relative_eq!(c[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn centroid_handles_unclosed_rings() {
        let ring = vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        let c = centroid(&Geometry::Polygon(vec![ring])).unwrap();
        assert_relative_eq!(c[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(c[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn fmt_number_trims_trailing_zeros() {
        assert_eq!(fmt_number(2.0), "2");
        assert_eq!(fmt_number(0.5), "0.5");
        assert_eq!(fmt_number(1.25), "1.25");
    }
}
