use serde::{Serialize, Serializer};

/// Page rotation, always a quarter turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Snap an arbitrary angle to the nearest quarter turn. Non-finite input yields `None`.
    pub fn from_degrees(deg: f64) -> Option<Rotation> {
        if !deg.is_finite() {
            return None;
        }
        let quarter = ((deg / 90.0).round() as i64).rem_euclid(4);
        Some(Rotation::ALL[quarter as usize])
    }

    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl Serialize for Rotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.degrees())
    }
}

/// Canonical page metadata. `width`/`height` describe the frame elements are
/// rendered into.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PageMeta {
    pub page_no: i64,
    pub width: f64,
    pub height: f64,
    pub rotation: Rotation,
}

/// Page entry as supplied upstream. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawPage {
    pub page_number: Option<i64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
    pub coord_origin: Option<String>,
}

impl BBox {
    pub fn top_left(l: f64, t: f64, r: f64, b: f64) -> Self {
        Self {
            l,
            t,
            r,
            b,
            coord_origin: None,
        }
    }

    pub fn bottom_left(l: f64, t: f64, r: f64, b: f64) -> Self {
        Self {
            l,
            t,
            r,
            b,
            coord_origin: Some("BOTTOMLEFT".into()),
        }
    }

    pub fn is_bottom_origin(&self) -> bool {
        self.coord_origin
            .as_deref()
            .is_some_and(|o| o.trim().to_ascii_uppercase().starts_with("BOTTOM"))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Provenance {
    pub page_no: Option<i64>,
    pub bbox: Option<BBox>,
}

/// One detection from the upstream extractor. Carries a provenance bbox, the
/// alternate x/y/width/height geometry, or both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawElement {
    pub page: Option<i64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub label: Option<String>,
    pub text: Option<String>,
    pub orig: Option<String>,
    pub is_table: bool,
    pub table_index: Option<usize>,
    pub prov: Vec<Provenance>,
}

impl RawElement {
    /// `text`, falling back to `orig` when `text` is missing or blank.
    pub fn display_text(&self) -> &str {
        match (&self.text, &self.orig) {
            (Some(t), _) if !t.trim().is_empty() => t,
            (_, Some(o)) => o,
            (Some(t), None) => t,
            (None, None) => "",
        }
    }

    /// Page number the element names itself, if any.
    pub fn declared_page(&self) -> Option<i64> {
        self.page
            .or_else(|| self.prov.first().and_then(|p| p.page_no))
    }

    /// The x/y/width/height quadruple when all four values are finite.
    pub fn alternate_geometry(&self) -> Option<(f64, f64, f64, f64)> {
        let (x, y, w, h) = (self.x?, self.y?, self.width?, self.height?);
        [x, y, w, h]
            .iter()
            .all(|v| v.is_finite())
            .then_some((x, y, w, h))
    }

    pub fn is_table_element(&self) -> bool {
        self.is_table || (self.table_index.is_some() && self.label.as_deref() == Some("table"))
    }
}

/// Axis-aligned rectangle in page points, top-left origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PageSpaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PageSpaceRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build from edges in any order.
    pub fn from_edges(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let left = x0.min(x1);
        let top = y0.min(y1);
        Self {
            left,
            top,
            width: x0.max(x1) - left,
            height: y0.max(y1) - top,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Finite with a strictly positive area.
    pub fn is_renderable(&self) -> bool {
        self.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn union(&self, other: &PageSpaceRect) -> PageSpaceRect {
        PageSpaceRect::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.left, self.top),
            (self.right(), self.top),
            (self.right(), self.bottom()),
            (self.left, self.bottom()),
        ]
    }
}

/// A run of one or more text detections merged into a single line fragment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergedElement {
    pub text: String,
    pub merged_rect: PageSpaceRect,
    /// Positions in the input `coordinates` array, ascending, no duplicates.
    pub source_indices: Vec<usize>,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TableModel {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub col_count: usize,
}

impl TableModel {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.headers.iter().all(|h| h.trim().is_empty())
    }
}
