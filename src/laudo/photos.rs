//! Photographic sections of the report.
//!
//! Two sections share one figure counter: the general property photos
//! (`geral_rows`) come first, then one block per room (`ambientes`). Both are
//! laid out as a two-column table, so photos are paired into rows.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use super::engine::{Context, Value};
use super::images::ImageResolver;
use super::tables::{CellValue, Row, Table, ID_COLUMN};

/// Width of every photo in the photo tables.
pub const PHOTO_WIDTH_CM: f64 = 8.0;

pub const ROOM_ID_COLUMN: &str = "ID_ambiente";
pub const ROOM_NAME_COLUMN: &str = "Ambiente";
pub const ORDER_COLUMN: &str = "Ordem";
pub const INCLUDE_COLUMN: &str = "Incluir_no_Laudo";
pub const PHOTO_COLUMN: &str = "Foto";
pub const CAPTION_COLUMN: &str = "Legenda";

/// Columns composed, in order, into a room photo caption when `Legenda` is
/// blank, e.g. "Fissura na parede da Sala".
const CAPTION_PARTS: [&str; 5] = ["Registro", "do/da", "Ocorrencia", "no/na", "Local"];

/// One photo with its figure number.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub image: Option<PathBuf>,
    pub figure: u32,
    pub caption: String,
}

/// A table row of two photos; the second column is empty on an odd tail.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRow {
    pub col1: Photo,
    pub col2: Option<Photo>,
}

impl PhotoRow {
    /// `{col1_img, col1_caption, col2_img, col2_caption}`
    pub fn general_value(&self) -> Value {
        let mut map = Context::new();
        map.insert("col1_img".into(), image_value(Some(&self.col1)));
        map.insert("col1_caption".into(), self.col1.caption.as_str().into());
        map.insert("col2_img".into(), image_value(self.col2.as_ref()));
        map.insert(
            "col2_caption".into(),
            self.col2.as_ref().map(|p| p.caption.as_str()).into(),
        );
        Value::Map(map)
    }

    /// Like [`general_value`](Self::general_value) plus `col1_fig`/`col2_fig`.
    pub fn room_value(&self) -> Value {
        let Value::Map(mut map) = self.general_value() else {
            unreachable!("general_value always builds a map")
        };
        map.insert("col1_fig".into(), self.col1.figure.into());
        map.insert("col2_fig".into(), self.col2.as_ref().map(|p| p.figure).into());
        Value::Map(map)
    }
}

fn image_value(photo: Option<&Photo>) -> Value {
    Value::image_or_empty(photo.and_then(|p| p.image.clone()), PHOTO_WIDTH_CM)
}

/// Photos of one room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomBlock {
    pub name: String,
    pub rows: Vec<PhotoRow>,
}

impl RoomBlock {
    /// `{nome, rows}` as the template expects.
    pub fn to_value(&self) -> Value {
        let mut map = Context::new();
        map.insert("nome".into(), self.name.as_str().into());
        map.insert(
            "rows".into(),
            Value::List(self.rows.iter().map(PhotoRow::room_value).collect()),
        );
        Value::Map(map)
    }
}

/// Pair photos into two-column rows.
pub fn paginate(photos: Vec<Photo>) -> Vec<PhotoRow> {
    let mut rows = Vec::with_capacity(photos.len().div_ceil(2));
    let mut iter = photos.into_iter();
    while let Some(col1) = iter.next() {
        rows.push(PhotoRow {
            col1,
            col2: iter.next(),
        });
    }
    rows
}

fn is_included(table: &Table, row: &Row) -> bool {
    !table.has_column(INCLUDE_COLUMN) || row.value(INCLUDE_COLUMN).is_some_and(CellValue::is_true)
}

/// Sort key for `Ordem`: numbers first, then text, blanks last.
fn order_key(value: Option<&CellValue>) -> (u8, f64, String) {
    match value {
        Some(CellValue::Number(n)) if !n.is_nan() => (0, *n, String::new()),
        Some(other) => {
            let text = other.as_text();
            if text.is_empty() {
                (2, 0.0, String::new())
            } else if let Some(n) = text.parse::<f64>().ok().filter(|n| !n.is_nan()) {
                (0, n, String::new())
            } else {
                (1, 0.0, text)
            }
        }
        None => (2, 0.0, String::new()),
    }
}

fn compare_order(a: &Row, b: &Row) -> Ordering {
    let (ka, na, ta) = order_key(a.value(ORDER_COLUMN));
    let (kb, nb, tb) = order_key(b.value(ORDER_COLUMN));
    ka.cmp(&kb)
        .then_with(|| na.total_cmp(&nb))
        .then_with(|| ta.cmp(&tb))
}

/// Stable sort by `Ordem` when the sheet has that column.
fn sort_by_order(table: &Table, rows: &mut [&Row]) {
    if table.has_column(ORDER_COLUMN) {
        rows.sort_by(|a, b| compare_order(a, b));
    }
}

/// General property photos (`Fotos_imovel`).
///
/// Returns the rows and the next free figure number.
pub fn assemble_general(
    fotos_imovel: &Table,
    id_vistoria: &str,
    images: &ImageResolver,
    start_fig: u32,
) -> (Vec<PhotoRow>, u32) {
    let filter_by_id = fotos_imovel.has_column(ID_COLUMN);
    let mut selected: Vec<&Row> = fotos_imovel
        .rows()
        .iter()
        .filter(|row| !filter_by_id || row.text(ID_COLUMN) == id_vistoria)
        .filter(|row| is_included(fotos_imovel, row))
        .collect();
    sort_by_order(fotos_imovel, &mut selected);

    let mut fig = start_fig;
    let mut photos = Vec::with_capacity(selected.len());
    for row in selected {
        let legenda = row.text(CAPTION_COLUMN);
        let caption = if legenda.is_empty() {
            format!("Figura {fig}")
        } else {
            format!("Figura {fig} - {legenda}")
        };
        photos.push(Photo {
            image: images.resolve(&row.text(PHOTO_COLUMN)),
            figure: fig,
            caption,
        });
        fig += 1;
    }

    (paginate(photos), fig)
}

/// Caption of a room photo: `Legenda`, or the composed description.
pub fn room_caption(row: &Row) -> String {
    let legenda = row.text(CAPTION_COLUMN);
    if !legenda.is_empty() {
        return legenda;
    }
    CAPTION_PARTS
        .iter()
        .map(|column| row.text(column))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Room photos of this inspection. Some exports leave `ID_Vistoria` blank on
/// room photos; those inherit it from the room with the same `ID_ambiente`.
fn room_photos_for(foto_ambiente: &Table, rooms: &[&Row], id_vistoria: &str) -> Vec<Row> {
    let has_id = foto_ambiente.has_column(ID_COLUMN);
    let room_inspection: HashMap<String, String> = rooms
        .iter()
        .map(|room| (room.text(ROOM_ID_COLUMN), room.text(ID_COLUMN)))
        .collect();

    foto_ambiente
        .rows()
        .iter()
        .filter_map(|row| {
            let mut row = row.clone();
            if has_id {
                if row.text(ID_COLUMN).is_empty() {
                    // Orphans keep a blank id and are filtered out below.
                    if let Some(inferred) = room_inspection.get(&row.text(ROOM_ID_COLUMN)) {
                        row.set(ID_COLUMN, CellValue::Text(inferred.clone()));
                    }
                }
                if row.text(ID_COLUMN) != id_vistoria {
                    return None;
                }
            }
            is_included(foto_ambiente, &row).then_some(row)
        })
        .collect()
}

/// Per-room photo blocks (`Ambientes` + `Foto_ambiente`).
///
/// Every room of the inspection is listed, even without photos. Returns the
/// blocks and the next free figure number.
pub fn assemble_rooms(
    ambientes: &Table,
    foto_ambiente: &Table,
    id_vistoria: &str,
    images: &ImageResolver,
    start_fig: u32,
) -> (Vec<RoomBlock>, u32) {
    if !ambientes.has_column(ID_COLUMN) {
        return (Vec::new(), start_fig);
    }

    let mut rooms: Vec<&Row> = ambientes
        .rows()
        .iter()
        .filter(|row| row.text(ID_COLUMN) == id_vistoria)
        .collect();
    sort_by_order(ambientes, &mut rooms);

    let photos = room_photos_for(foto_ambiente, &rooms, id_vistoria);
    let link_by_room = foto_ambiente.has_column(ROOM_ID_COLUMN);

    let mut fig = start_fig;
    let mut blocks = Vec::with_capacity(rooms.len());
    for room in rooms {
        let id_amb = room.text(ROOM_ID_COLUMN);
        let name = Some(room.text(ROOM_NAME_COLUMN))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id_amb.clone());

        let mut room_photos: Vec<&Row> = if link_by_room {
            photos
                .iter()
                .filter(|p| p.text(ROOM_ID_COLUMN) == id_amb)
                .collect()
        } else {
            Vec::new()
        };
        sort_by_order(foto_ambiente, &mut room_photos);

        let mut entries = Vec::with_capacity(room_photos.len());
        for row in room_photos {
            entries.push(Photo {
                image: images.resolve(&row.text(PHOTO_COLUMN)),
                figure: fig,
                caption: room_caption(row),
            });
            fig += 1;
        }

        blocks.push(RoomBlock {
            name,
            rows: paginate(entries),
        });
    }

    (blocks, fig)
}
