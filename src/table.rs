//! Normalization of heterogeneous table payloads into a header/row matrix.

use serde_json::{Map, Value};

use crate::input::num;
use crate::model::TableModel;

/// Placeholder shown for tables without any decodable content.
pub const NO_DATA: &str = "no data";

/// Grid fields in lookup order; the first populated one wins.
const GRID_KEYS: [&str; 5] = ["grid", "data", "rows", "table", "cells"];
const ROW_CELL_KEYS: [&str; 3] = ["cells", "values", "row"];
const CELL_TEXT_KEYS: [&str; 4] = ["text", "value", "content", "orig"];
const HEADER_DUPLICATE_RATIO: f64 = 0.6;
const MAX_NESTING: usize = 2;
/// Placed grids may be this many times sparser than the cell list before the
/// positions are treated as bogus.
const MAX_GRID_SPARSITY: usize = 16;

/// String form of one cell. Objects contribute their `text`-like field,
/// arrays are joined with spaces.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(cell_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(obj) => CELL_TEXT_KEYS
            .iter()
            .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
            .map(cell_text)
            .unwrap_or_default(),
    }
}

fn populated_grid(obj: &Map<String, Value>, depth: usize) -> Option<&Vec<Value>> {
    for key in GRID_KEYS {
        match obj.get(key) {
            Some(Value::Array(items)) if !items.is_empty() => return Some(items),
            Some(Value::Object(inner)) if depth < MAX_NESTING => {
                if let Some(items) = populated_grid(inner, depth + 1) {
                    return Some(items);
                }
            }
            _ => {}
        }
    }
    None
}

fn index_field(obj: &Map<String, Value>, keys: &[&str], limit: usize) -> Option<usize> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(num))
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n < limit as f64)
        .map(|n| n as usize)
}

const ROW_POSITION_KEYS: [&str; 3] = ["row", "row_index", "start_row_offset_idx"];
const COL_POSITION_KEYS: [&str; 4] = ["col", "col_index", "column", "start_col_offset_idx"];

fn has_position_keys(v: &Value) -> bool {
    v.as_object().is_some_and(|obj| {
        ROW_POSITION_KEYS.iter().any(|k| obj.contains_key(*k))
            && COL_POSITION_KEYS.iter().any(|k| obj.contains_key(*k))
    })
}

fn cell_position(v: &Value, limit: usize) -> Option<(usize, usize)> {
    let obj = v.as_object()?;
    let row = index_field(obj, &ROW_POSITION_KEYS, limit)?;
    let col = index_field(obj, &COL_POSITION_KEYS, limit)?;
    Some((row, col))
}

/// Flat `{row, col, text}` cell lists placed into a dense grid. Positions that
/// would blow the grid up far beyond the number of cells reject the placement.
fn place_cells(items: &[Value]) -> Option<Vec<Vec<String>>> {
    let budget = items.len().checked_mul(MAX_GRID_SPARSITY)?;
    let placed: Vec<((usize, usize), String)> = items
        .iter()
        .map(|item| cell_position(item, budget).map(|pos| (pos, cell_text(item))))
        .collect::<Option<_>>()?;
    let n_rows = placed.iter().map(|((r, _), _)| *r).max()?.checked_add(1)?;
    let n_cols = placed.iter().map(|((_, c), _)| *c).max()?.checked_add(1)?;
    if n_rows.checked_mul(n_cols)? > budget {
        log::debug!("Table: {n_rows}x{n_cols} cell grid is too sparse for {} cells", items.len());
        return None;
    }
    let mut grid = vec![vec![String::new(); n_cols]; n_rows];
    for ((r, c), text) in placed {
        if grid[r][c].is_empty() {
            grid[r][c] = text;
        }
    }
    Some(grid)
}

fn row_cells(item: &Value, headers: &[String]) -> Vec<String> {
    match item {
        Value::Array(cells) => cells.iter().map(cell_text).collect(),
        Value::Object(obj) => {
            if let Some(cells) = ROW_CELL_KEYS
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array))
            {
                return cells.iter().map(cell_text).collect();
            }
            if headers.iter().any(|h| obj.contains_key(h)) {
                return headers
                    .iter()
                    .map(|h| obj.get(h).map(cell_text).unwrap_or_default())
                    .collect();
            }
            obj.values().map(cell_text).collect()
        }
        scalar => vec![cell_text(scalar)],
    }
}

/// Column names of an array of keyed records, when that is what the grid is.
fn record_keys(items: &[Value]) -> Option<Vec<String>> {
    let first = items.first()?.as_object()?;
    if ROW_CELL_KEYS.iter().any(|k| first.get(*k).is_some_and(Value::is_array)) {
        return None;
    }
    items
        .iter()
        .all(Value::is_object)
        .then(|| first.keys().cloned().collect())
}

fn normalize_token(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// True when `row` repeats `headers` position by position often enough that it
/// is a duplicated header row.
fn repeats_headers(headers: &[String], row: &[String]) -> bool {
    let n = headers.len().max(row.len());
    if n == 0 {
        return false;
    }
    let matches = headers
        .iter()
        .zip(row)
        .filter(|(h, c)| {
            let h = normalize_token(h);
            !h.is_empty() && h == normalize_token(c)
        })
        .count();
    matches as f64 / n as f64 >= HEADER_DUPLICATE_RATIO
}

fn fit_row(mut row: Vec<String>, col_count: usize) -> Vec<String> {
    row.resize(col_count, String::new());
    row
}

/// Normalize one raw table payload.
///
/// Never fails: an undecodable payload yields an empty model, which the
/// renderer shows as a [`NO_DATA`] placeholder.
pub fn extract_table(payload: &Value) -> TableModel {
    let (obj, grid) = match payload {
        Value::Array(items) => (None, Some(items)),
        Value::Object(obj) => (Some(obj), populated_grid(obj, 0)),
        _ => (None, None),
    };

    let mut headers: Vec<String> = obj
        .and_then(|o| {
            ["headers", "header"]
                .iter()
                .find_map(|k| o.get(*k).filter(|v| !v.is_null()))
        })
        .and_then(Value::as_array)
        .map(|h| h.iter().map(cell_text).collect())
        .unwrap_or_default();

    let items: &[Value] = grid.map(Vec::as_slice).unwrap_or_default();
    let placed = place_cells(items);
    if placed.is_none() && !items.is_empty() && items.iter().all(has_position_keys) {
        log::debug!("Table: {} positioned cells with unusable positions", items.len());
        return TableModel {
            col_count: 1,
            ..TableModel::default()
        };
    }
    if placed.is_none()
        && headers.is_empty()
        && let Some(keys) = record_keys(items)
    {
        headers = keys;
    }

    let rows: Vec<Vec<String>> = placed
        .unwrap_or_else(|| items.iter().map(|item| row_cells(item, &headers)).collect());

    let data_start = if headers.is_empty() {
        let tabular = match (rows.first(), rows.get(1)) {
            (Some(first), Some(second)) => first.len() == second.len(),
            (Some(_), None) => true,
            _ => false,
        };
        if tabular {
            headers = rows[0].clone();
            1
        } else {
            0
        }
    } else if rows.first().is_some_and(|r| repeats_headers(&headers, r)) {
        1
    } else {
        0
    };

    let data: Vec<Vec<String>> = rows.into_iter().skip(data_start).collect();
    let col_count = data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0)
        .max(1);

    if !headers.is_empty() {
        headers = fit_row(headers, col_count);
    }
    let rows: Vec<Vec<String>> = data.into_iter().map(|r| fit_row(r, col_count)).collect();

    log::debug!(
        "Table: {} header cells, {} rows x {} columns (data from row {})",
        headers.len(),
        rows.len(),
        col_count,
        data_start
    );

    TableModel {
        headers,
        rows,
        col_count,
    }
}
