//! Fixture builders: workbooks, templates and photos written on the fly.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use rust_xlsxwriter::Workbook;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

#[derive(Debug, Clone)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Bool(bool),
    Blank,
}

pub use Cell::{Blank, Bool, Number, Text};

pub struct Sheet {
    pub name: &'static str,
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &'static str, header: &[&'static str], rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name,
            header: header.to_vec(),
            rows,
        }
    }
}

pub fn write_workbook(path: &Path, sheets: &[Sheet]) {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).unwrap();
        for (col, name) in sheet.header.iter().enumerate() {
            worksheet.write_string(0, col as u16, *name).unwrap();
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, *s).unwrap();
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r, c, *n).unwrap();
                    }
                    Cell::Bool(b) => {
                        worksheet.write_boolean(r, c, *b).unwrap();
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// The workbook of inspection `V001`: one included property photo with
/// caption "Facade", one excluded, one room and no room photos.
pub fn v001_sheets() -> Vec<Sheet> {
    vec![
        Sheet::new(
            "Vistoria",
            &["ID_Vistoria", "Contratante", "Laudo", "Foto_da_capa"],
            vec![vec![
                Text("V001"),
                Text("ACME Engenharia"),
                Blank,
                Text("capa.png"),
            ]],
        ),
        Sheet::new(
            "Endereco",
            &["ID_Vistoria", "Endereco_imovel", "Coordenada"],
            vec![vec![
                Text("V001"),
                Text("Rua das Flores, 10"),
                Text("-23.5505, -46.6333"),
            ]],
        ),
        Sheet::new(
            "Imovel",
            &["ID_Vistoria", "Data_da_vistoria", "plano", "Idade"],
            vec![vec![Text("V001"), Text("2024-03-05"), Bool(true), Number(12.0)]],
        ),
        Sheet::new(
            "Info_Est",
            &["ID_Vistoria", "junta", "Estrutura"],
            vec![vec![Text("V001"), Bool(false), Text("Concreto armado")]],
        ),
        Sheet::new(
            "Ambientes",
            &["ID_Vistoria", "ID_ambiente", "Ambiente", "Ordem"],
            vec![vec![Text("V001"), Text("A1"), Text("Sala"), Number(1.0)]],
        ),
        Sheet::new(
            "Fotos_imovel",
            &["ID_Vistoria", "Foto", "Legenda", "Ordem", "Incluir_no_Laudo"],
            vec![
                vec![
                    Text("V001"),
                    Text("Fotos_imovel_Images/f1.png"),
                    Text("Facade"),
                    Number(1.0),
                    Bool(true),
                ],
                vec![
                    Text("V001"),
                    Text("Fotos_imovel_Images/f2.png"),
                    Text("Hidden"),
                    Number(2.0),
                    Bool(false),
                ],
            ],
        ),
    ]
}

/// A single-row room photo sheet for room `A1`, with a blank inspection id.
pub fn room_photo_sheet() -> Sheet {
    Sheet::new(
        "Foto_ambiente",
        &[
            "ID_Vistoria",
            "ID_ambiente",
            "Foto",
            "Legenda",
            "Ordem",
            "Incluir_no_Laudo",
        ],
        vec![vec![
            Blank,
            Text("A1"),
            Text("sala1.png"),
            Text("Parede da sala"),
            Number(1.0),
            Number(1.0),
        ]],
    )
}

pub const REPORT_BODY: &str = concat!(
    "<w:p><w:r><w:t>{{ LAUDO }} {{ Contratante }}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>{{ Foto_da_capa }}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>{{ Endereco_imovel }} {{ Coordenada_DMS }}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>{{ Data_da_vistoria }} {{ plano }} {{ junta }} {{ Idade }}</w:t></w:r></w:p>",
    "<w:tbl>",
    "<w:tr><w:tc><w:p><w:r><w:t>{%tr for row in geral_rows %}</w:t></w:r></w:p></w:tc></w:tr>",
    "<w:tr>",
    "<w:tc><w:p><w:r><w:t>{{ row.col1_img }}</w:t></w:r></w:p><w:p><w:r><w:t>{{ row.col1_caption }}</w:t></w:r></w:p></w:tc>",
    "<w:tc><w:p><w:r><w:t>{{ row.col2_img }}</w:t></w:r></w:p><w:p><w:r><w:t>[{{ row.col2_caption }}]</w:t></w:r></w:p></w:tc>",
    "</w:tr>",
    "<w:tr><w:tc><w:p><w:r><w:t>{%tr endfor %}</w:t></w:r></w:p></w:tc></w:tr>",
    "</w:tbl>",
    "<w:p><w:r><w:t>{% for amb in ambientes %}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>Ambiente: {{ amb.nome }}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>{% for r in amb.rows %}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>{{ r.col1_img }} Figura {{ r.col1_fig }} - {{ r.col1_caption }}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>{% endfor %}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>{% dfor %}</w:t></w:r></w:p>",
);

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#,
    r#"</Types>"#
);

const PACKAGE_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#
);

const DOCUMENT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#,
    r#"</Relationships>"#
);

const HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:p><w:r><w:t>Laudo {{ Referencia }}{{ Contratante }}</w:t></w:r></w:p>"#,
    r#"</w:hdr>"#
);

/// Write a minimal DOCX whose body is `body`, with one header part.
pub fn write_template(path: &Path, body: &str) {
    let document = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body>{}<w:sectPr/></w:body></w:document>"#
        ),
        body
    );

    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/header1.xml", HEADER),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// A small solid PNG (or JPEG, by extension) of `width` x `height`.
pub fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::from_pixel(width, height, image::Rgb([180, 40, 40]))
        .save(path)
        .unwrap();
}

/// A complete `V001` workspace: workbook, template and photos.
pub fn v001_workspace(dir: &Path) {
    write_workbook(&dir.join("Vistoria.xlsx"), &v001_sheets());
    write_template(&dir.join("Modelo_Vistoria.docx"), REPORT_BODY);
    write_image(&dir.join("capa.png"), 64, 32);
    write_image(&dir.join("Fotos_imovel_Images/f1.png"), 40, 30);
}

pub fn read_entry(docx: &Path, name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(File::open(docx).unwrap()).unwrap();
    let mut entry = archive.by_name(name).ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    Some(text)
}

pub fn entry_names(docx: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(docx).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}
