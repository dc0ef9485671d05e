//! Decoding of the upstream extraction payload.
//!
//! Producers disagree on field names and on whether numbers arrive as JSON
//! numbers or strings, so elements and pages are read through
//! [`serde_json::Value`] and every field is looked up leniently. A value that
//! cannot be interpreted is treated as missing rather than failing the whole
//! document.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::model::{BBox, Provenance, RawElement, RawPage};

/// Everything the core consumes for one document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceDocument {
    #[serde(alias = "elements")]
    pub coordinates: Vec<RawElement>,
    /// Raw table payloads, indexed by `RawElement::table_index`.
    pub tables: Vec<Value>,
    pub pages: Vec<RawPage>,
}

pub fn parse(path: &Path) -> Result<SourceDocument, Error> {
    let data = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    parse_bytes(&data)
}

pub fn parse_bytes(data: &[u8]) -> Result<SourceDocument, Error> {
    let doc: SourceDocument = serde_json::from_slice(data)
        .map_err(|e| Error::InvalidInput(format!("not a layout payload: {e}")))?;
    log::debug!(
        "Decoded payload: {} elements, {} tables, {} pages",
        doc.coordinates.len(),
        doc.tables.len(),
        doc.pages.len()
    );
    Ok(doc)
}

/// Interpret a JSON number or numeric string. Anything else is `None`.
pub(crate) fn num(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn int(v: &Value) -> Option<i64> {
    num(v).filter(|n| n.is_finite()).map(|n| n.round() as i64)
}

fn flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-null value among `keys`.
fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn bbox_from_value(v: &Value) -> Option<BBox> {
    // Some producers emit `[l, t, r, b]` instead of an object.
    if let Value::Array(items) = v {
        let coords: Vec<f64> = items.iter().map(|i| num(i).unwrap_or(f64::NAN)).collect();
        return (coords.len() == 4).then(|| BBox::top_left(coords[0], coords[1], coords[2], coords[3]));
    }
    let obj = v.as_object()?;
    let edge = |key: &str| obj.get(key).and_then(num).unwrap_or(f64::NAN);
    Some(BBox {
        l: edge("l"),
        t: edge("t"),
        r: edge("r"),
        b: edge("b"),
        coord_origin: obj.get("coord_origin").and_then(string),
    })
}

fn provenance_from_value(v: &Value) -> Option<Provenance> {
    let obj = v.as_object()?;
    Some(Provenance {
        page_no: first(obj, &["page_no", "page"]).and_then(int),
        bbox: obj.get("bbox").and_then(bbox_from_value),
    })
}

impl RawElement {
    pub fn from_value(v: &Value) -> RawElement {
        let Some(obj) = v.as_object() else {
            return RawElement::default();
        };
        let prov = match obj.get("prov") {
            Some(Value::Array(items)) => items.iter().filter_map(provenance_from_value).collect(),
            Some(single @ Value::Object(_)) => provenance_from_value(single).into_iter().collect(),
            _ => Vec::new(),
        };
        RawElement {
            page: first(obj, &["page", "page_no", "page_number"]).and_then(int),
            x: obj.get("x").and_then(num),
            y: obj.get("y").and_then(num),
            width: obj.get("width").and_then(num),
            height: obj.get("height").and_then(num),
            label: obj.get("label").and_then(string),
            text: obj.get("text").and_then(string),
            orig: obj.get("orig").and_then(string),
            is_table: first(obj, &["isTable", "is_table"]).is_some_and(flag),
            table_index: first(obj, &["tableIndex", "table_index"])
                .and_then(int)
                .and_then(|i| usize::try_from(i).ok()),
            prov,
        }
    }
}

impl RawPage {
    pub fn from_value(v: &Value) -> RawPage {
        let Some(obj) = v.as_object() else {
            return RawPage::default();
        };
        RawPage {
            page_number: first(obj, &["page_number", "page_no", "page"]).and_then(int),
            width: first(obj, &["width", "page_width"]).and_then(num),
            height: first(obj, &["height", "page_height"]).and_then(num),
            rotation: first(obj, &["rotation", "rotate", "page_rotation"]).and_then(num),
        }
    }
}

impl<'de> Deserialize<'de> for RawElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| RawElement::from_value(&v))
    }
}

impl<'de> Deserialize<'de> for RawPage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| RawPage::from_value(&v))
    }
}
