//! DOCX archive I/O and image embedding.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::value::InlineImage;
use super::RenderError;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const EMPTY_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
);

/// EMU per centimetre.
const EMU_PER_CM: f64 = 360_000.0;
const FIRST_DRAWING_ID: u32 = 5000;

/// A DOCX archive held in memory as ordered `(entry, bytes)` pairs.
#[derive(Debug, Default)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
    embedded: HashMap<(String, PathBuf), String>,
    media_count: usize,
    drawing_count: u32,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self, RenderError> {
        let file = File::open(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let archive_err = |source| RenderError::Archive {
            path: path.to_path_buf(),
            source,
        };
        let mut archive = ZipArchive::new(file).map_err(archive_err)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(archive_err)?;
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| archive_err(e.into()))?;
            entries.push((name, data));
        }
        Ok(Self {
            entries,
            ..Default::default()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Entry decoded as UTF-8 markup.
    pub fn text(&self, name: &str) -> Result<String, RenderError> {
        let data = self
            .get(name)
            .ok_or_else(|| RenderError::Syntax(format!("missing part {name}")))?;
        String::from_utf8(data.to_vec())
            .map_err(|_| RenderError::Syntax(format!("part {name} is not valid UTF-8")))
    }

    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// Add `image` to the package for use inside `part` and return the
    /// inline drawing markup, already breaking out of the current text run.
    pub fn embed_image(&mut self, part: &str, image: &InlineImage) -> Result<String, RenderError> {
        let (width, height) =
            image::image_dimensions(&image.path).map_err(|source| RenderError::Image {
                path: image.path.clone(),
                source,
            })?;

        let rel_id = self.relationship_for(part, &image.path)?;

        let cx = (image.width_cm * EMU_PER_CM).round() as u64;
        let cy = if width == 0 {
            cx
        } else {
            (cx as f64 * f64::from(height) / f64::from(width)).round() as u64
        };

        self.drawing_count += 1;
        let id = FIRST_DRAWING_ID + self.drawing_count;
        let name = image
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(drawing_markup(&rel_id, id, &quick_xml::escape::escape(name.as_str()), cx, cy))
    }

    /// Relationship id of `path` from `part`, adding media, relationship and
    /// content type the first time.
    fn relationship_for(&mut self, part: &str, path: &Path) -> Result<String, RenderError> {
        let key = (part.to_string(), path.to_path_buf());
        if let Some(rel_id) = self.embedded.get(&key) {
            return Ok(rel_id.clone());
        }

        let data = fs::read(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| mime.subtype().as_str().to_string());

        self.media_count += 1;
        let media_name = format!("laudo_image{}.{}", self.media_count, extension);
        self.set(&format!("word/media/{media_name}"), data);
        self.ensure_content_type(&extension, mime.essence_str())?;

        let rel_id = format!("rIdLaudo{}", self.media_count);
        let rels_name = rels_part_for(part);
        let rels = match self.get(&rels_name) {
            Some(_) => self.text(&rels_name)?,
            None => EMPTY_RELS.to_string(),
        };
        let relationship = format!(
            r#"<Relationship Id="{rel_id}" Type="{IMAGE_REL_TYPE}" Target="media/{media_name}"/>"#
        );
        let rels = insert_before(&rels, "</Relationships>", &relationship)
            .ok_or_else(|| RenderError::Syntax(format!("malformed {rels_name}")))?;
        self.set(&rels_name, rels.into_bytes());

        self.embedded.insert(key, rel_id.clone());
        Ok(rel_id)
    }

    fn ensure_content_type(&mut self, extension: &str, mime: &str) -> Result<(), RenderError> {
        let types = self.text(CONTENT_TYPES_PART)?;
        let marker = format!(r#"extension="{extension}""#);
        if types.to_ascii_lowercase().contains(&marker) {
            return Ok(());
        }
        let default = format!(r#"<Default Extension="{extension}" ContentType="{mime}"/>"#);
        let types = insert_before(&types, "</Types>", &default)
            .ok_or_else(|| RenderError::Syntax(format!("malformed {CONTENT_TYPES_PART}")))?;
        self.set(CONTENT_TYPES_PART, types.into_bytes());
        Ok(())
    }

    /// Write the archive to a sibling temp file and move it over `path`.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let io_err = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        self.write_to(tmp.as_file_mut())
            .map_err(|source| RenderError::Archive {
                path: path.to_path_buf(),
                source,
            })?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Media is stored, everything else deflated.
    fn write_to(&self, out: &mut File) -> zip::result::ZipResult<()> {
        let mut zip = ZipWriter::new(out);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in &self.entries {
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        zip.finish()?;
        Ok(())
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn insert_before(haystack: &str, marker: &str, insert: &str) -> Option<String> {
    let pos = haystack.rfind(marker)?;
    let mut out = String::with_capacity(haystack.len() + insert.len());
    out.push_str(&haystack[..pos]);
    out.push_str(insert);
    out.push_str(&haystack[pos..]);
    Some(out)
}

/// Closes the enclosing `<w:t>`/`<w:r>`, emits the picture in its own run
/// and reopens a text run for whatever follows.
fn drawing_markup(rel_id: &str, id: u32, name: &str, cx: u64, cy: u64) -> String {
    format!(
        concat!(
            r#"</w:t></w:r><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline>"#,
            r#"</w:drawing></w:r><w:r><w:t xml:space="preserve">"#
        ),
        rel_id = rel_id,
        id = id,
        name = name,
        cx = cx,
        cy = cy,
    )
}
