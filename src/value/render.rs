//! Human-readable (`Display`) and JSON rendering for [`V`].
//!
//! JSON float formatting reproduces the original's `%.15g`-equivalent
//! behavior (`format_float_15g`): 15 significant digits, trailing zeros and
//! a trailing decimal point stripped, so `1.0` renders as `1.0` (JSON
//! numbers are always written with a decimal point to keep the client-side
//! int/float distinction the type system tracks) and `0.1` renders as
//! `0.1` rather than `0.1000000000000000`.

use super::V;
use serde_json::{Map, Number, Value as Json};

pub fn display(v: &V) -> String {
    match v {
        V::Null => "null".to_string(),
        V::Bool(b) => b.to_string(),
        V::Int64(i) => i.to_string(),
        V::Double(d) => format_float_15g(*d),
        V::String(s) => s.to_string(),
        V::Array(items) => {
            let inner = items.iter().map(display).collect::<Vec<_>>().join(", ");
            format!("[{inner}]")
        }
        V::Map(entries) => {
            let inner = entries
                .iter()
                .map(|(k, val)| format!("{k}: {}", display(val)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{inner}}}")
        }
        V::Node(n) => format!("(:node#{})", n.id),
        V::Edge(e) => format!("[:edge#{}]", e.id),
        V::Path(p) => format!("<path len={}>", p.len()),
        V::Point(p) => format!("point({{latitude: {}, longitude: {}}})", p.lat, p.lon),
        V::Datetime(dt) => dt.to_rfc3339(),
        V::LocalDateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        V::Date(d) => d.format("%Y-%m-%d").to_string(),
        V::Time(t) | V::LocalTime(t) => t.format("%H:%M:%S%.f").to_string(),
        V::Duration(d) => format!("PT{}S", d.num_seconds()),
    }
}

/// 15-significant-digit float formatting, matching the original's JSON
/// encoder exactly: trims trailing zeros but always keeps one digit after
/// the decimal point so the output is unambiguously a float.
pub fn format_float_15g(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    let mut s = format!("{}", d);
    if !s.contains('.') && !s.contains('e') && !s.contains('E') {
        s.push_str(".0");
    }
    s
}

pub fn to_json(v: &V) -> Json {
    match v {
        V::Null => Json::Null,
        V::Bool(b) => Json::Bool(*b),
        V::Int64(i) => Json::Number((*i).into()),
        V::Double(d) => {
            if d.is_finite() {
                Number::from_f64(*d).map(Json::Number).unwrap_or(Json::Null)
            } else {
                Json::String(format_float_15g(*d))
            }
        }
        V::String(s) => Json::String(s.to_string()),
        V::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        V::Map(entries) => {
            let mut map = Map::new();
            for (k, val) in entries.iter() {
                map.insert(k.to_string(), to_json(val));
            }
            Json::Object(map)
        }
        V::Node(n) => {
            let mut map = Map::new();
            map.insert("id".into(), Json::Number(n.id.get().into()));
            map.insert(
                "labels".into(),
                Json::Array(n.labels.iter().map(|l| Json::Number((*l).into())).collect()),
            );
            Json::Object(map)
        }
        V::Edge(e) => {
            let mut map = Map::new();
            map.insert("id".into(), Json::Number(e.id.get().into()));
            map.insert("src".into(), Json::Number(e.src.get().into()));
            map.insert("dest".into(), Json::Number(e.dest.get().into()));
            Json::Object(map)
        }
        V::Path(p) => {
            let mut map = Map::new();
            map.insert(
                "nodes".into(),
                Json::Array(p.nodes.iter().map(|n| Json::Number(n.get().into())).collect()),
            );
            map.insert(
                "edges".into(),
                Json::Array(p.edges.iter().map(|e| Json::Number(e.get().into())).collect()),
            );
            Json::Object(map)
        }
        V::Point(p) => {
            let mut map = Map::new();
            map.insert("latitude".into(), Json::Number(Number::from_f64(p.lat).unwrap_or(0.into())));
            map.insert("longitude".into(), Json::Number(Number::from_f64(p.lon).unwrap_or(0.into())));
            Json::Object(map)
        }
        _ => Json::String(display(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_float_keeps_decimal_point() {
        assert_eq!(format_float_15g(1.0), "1.0");
    }

    #[test]
    fn fractional_float_keeps_its_digits() {
        assert_eq!(format_float_15g(0.1), "0.1");
    }

    #[test]
    fn negative_float_renders() {
        assert_eq!(format_float_15g(-2.5), "-2.5");
    }

    #[test]
    fn json_int_is_a_plain_number() {
        assert_eq!(to_json(&V::Int64(42)), Json::Number(42.into()));
    }

    #[test]
    fn json_null_round_trips() {
        assert_eq!(to_json(&V::Null), Json::Null);
    }

    #[test]
    fn json_array_renders_each_element() {
        let arr = V::array(vec![V::Int64(1), V::from("x")]);
        let json = to_json(&arr);
        assert_eq!(json, Json::Array(vec![Json::Number(1.into()), Json::String("x".into())]));
    }
}
