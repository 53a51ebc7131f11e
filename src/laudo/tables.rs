//! Spreadsheet tables and row lookup.
//!
//! The inspection workbook exported by the field app is a set of sheets keyed
//! by `ID_Vistoria`. This module loads them into plain in-memory tables and
//! provides the lookups the report needs: match-by-identifier and
//! case-insensitive field access.

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::Path;

use super::LaudoError;

/// Column holding the inspection identifier in every keyed sheet.
pub const ID_COLUMN: &str = "ID_Vistoria";

pub const SHEET_VISTORIA: &str = "Vistoria";
pub const SHEET_ENDERECO: &str = "Endereco";
pub const SHEET_IMOVEL: &str = "Imovel";
pub const SHEET_INFO_EST: &str = "Info_Est";
pub const SHEET_AMBIENTES: &str = "Ambientes";
pub const SHEET_FOTOS_IMOVEL: &str = "Fotos_imovel";
pub const SHEET_FOTO_AMBIENTE: &str = "Foto_ambiente";

/// Every sheet the report reads, in workbook order.
pub const SHEET_NAMES: [&str; 7] = [
    SHEET_VISTORIA,
    SHEET_ENDERECO,
    SHEET_IMOVEL,
    SHEET_INFO_EST,
    SHEET_AMBIENTES,
    SHEET_FOTOS_IMOVEL,
    SHEET_FOTO_AMBIENTE,
];

/// A single cell, typed as well as the source format allows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Normalized text form: blank for missing values, NaN and the literal
    /// `"nan"`, otherwise the trimmed display form.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("nan") {
                    String::new()
                } else {
                    trimmed.to_string()
                }
            }
            CellValue::Number(n) if n.is_nan() => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
            CellValue::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Include-flag semantics: a boolean `true` or the number `1`.
    pub fn is_true(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n == 1.0,
            _ => false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_empty()
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(_) | Data::DateTimeIso(_) => cell
                .as_datetime()
                .map(CellValue::Date)
                .unwrap_or_else(|| CellValue::Text(cell.to_string())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Column names are compared ignoring case and surrounding whitespace.
fn column_matches(column: &str, target: &str) -> bool {
    column.trim().to_lowercase() == target.trim().to_lowercase()
}

/// One sheet row as `(column, value)` pairs in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// Raw value of a column, matched case-insensitively.
    pub fn value(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| column_matches(name, column))
            .map(|(_, value)| value)
    }

    /// Normalized text of a column; blank when the column is missing.
    pub fn text(&self, column: &str) -> String {
        self.value(column).map(CellValue::as_text).unwrap_or_default()
    }

    pub fn set(&mut self, column: &str, value: CellValue) {
        match self
            .cells
            .iter_mut()
            .find(|(name, _)| column_matches(name, column))
        {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.is_blank())
    }
}

/// The row matched for an inspection, or none.
///
/// Lookups on a missing row yield blank text, so optional sheets can be read
/// exactly like the mandatory one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchedRow<'a>(Option<&'a Row>);

impl<'a> MatchedRow<'a> {
    pub fn new(row: Option<&'a Row>) -> Self {
        Self(row)
    }

    pub fn row(&self) -> Option<&'a Row> {
        self.0
    }

    pub fn is_found(&self) -> bool {
        self.0.is_some()
    }

    pub fn value(&self, column: &str) -> Option<&'a CellValue> {
        self.0.and_then(|row| row.value(column))
    }

    pub fn text(&self, column: &str) -> String {
        self.0.map(|row| row.text(column)).unwrap_or_default()
    }
}

/// A sheet loaded into memory. The header row provides column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from a header and positional rows. Missing trailing cells
    /// are treated as empty.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| {
                let mut values = values.into_iter();
                Row::new(
                    columns
                        .iter()
                        .map(|c| (c.clone(), values.next().unwrap_or_default()))
                        .collect(),
                )
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| column_matches(c, column))
    }

    /// First row whose `ID_Vistoria`, compared as text, equals `id`.
    pub fn find_by_id(&self, id: &str) -> MatchedRow<'_> {
        self.find_by(ID_COLUMN, id)
    }

    pub fn find_by(&self, column: &str, key: &str) -> MatchedRow<'_> {
        if !self.has_column(column) {
            return MatchedRow::default();
        }
        let key = key.trim();
        MatchedRow::new(self.rows.iter().find(|row| row.text(column) == key))
    }
}

/// Convert a calamine range into a [`Table`], using its first row as header.
fn table_from_range(range: &calamine::Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::default();
    };

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = CellValue::from(cell).as_text();
            if name.is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            }
        })
        .collect();

    let rows = rows
        .map(|cells| {
            Row::new(
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let value = cells.get(i).map(CellValue::from).unwrap_or_default();
                        (name.clone(), value)
                    })
                    .collect(),
            )
        })
        .filter(|row| !row.is_empty())
        .collect();

    Table::new(columns, rows)
}

/// Load the requested sheets from a workbook. Sheets that do not exist come
/// back as empty tables.
pub fn load_tables(path: &Path, names: &[&str]) -> Result<HashMap<String, Table>, LaudoError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| LaudoError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    })?;
    let available = workbook.sheet_names();

    let mut tables = HashMap::with_capacity(names.len());
    for name in names {
        let table = if available.iter().any(|s| s == name) {
            let range = workbook
                .worksheet_range(name)
                .map_err(|source| LaudoError::Spreadsheet {
                    path: path.to_path_buf(),
                    source,
                })?;
            table_from_range(&range)
        } else {
            log::debug!("Sheet '{}' not present in {}", name, path.display());
            Table::default()
        };
        tables.insert(name.to_string(), table);
    }
    Ok(tables)
}

/// All sheets of one inspection workbook.
#[derive(Debug, Clone, Default)]
pub struct InspectionTables {
    pub vistoria: Table,
    pub endereco: Table,
    pub imovel: Table,
    pub info_est: Table,
    pub ambientes: Table,
    pub fotos_imovel: Table,
    pub foto_ambiente: Table,
}

impl InspectionTables {
    pub fn load(path: &Path) -> Result<Self, LaudoError> {
        let mut tables = load_tables(path, &SHEET_NAMES)?;
        let mut take = |name: &str| tables.remove(name).unwrap_or_default();
        Ok(Self {
            vistoria: take(SHEET_VISTORIA),
            endereco: take(SHEET_ENDERECO),
            imovel: take(SHEET_IMOVEL),
            info_est: take(SHEET_INFO_EST),
            ambientes: take(SHEET_AMBIENTES),
            fotos_imovel: take(SHEET_FOTOS_IMOVEL),
            foto_ambiente: take(SHEET_FOTO_AMBIENTE),
        })
    }

    /// The inspection row itself; its absence aborts the report.
    pub fn inspection(&self, id: &str) -> Result<&Row, LaudoError> {
        self.vistoria
            .find_by_id(id)
            .row()
            .ok_or_else(|| LaudoError::InspectionNotFound {
                id: id.to_string(),
                table: SHEET_VISTORIA.to_string(),
            })
    }
}
