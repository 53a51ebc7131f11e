//! Repair of a known authoring mistake in the report template.
//!
//! The template ships with a loop closed by `{% dfor %}` instead of
//! `{% endfor %}`. Only that spelling is rewritten; any other broken tag is
//! left for the renderer to reject.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use super::LaudoError;

/// Archive entry holding the document body.
pub const DOCUMENT_PART: &str = "word/document.xml";

const MALFORMED_TAGS: [&str; 2] = ["{% dfor %}", "{% dfor%}"];
const LOOP_CLOSE_TAG: &str = "{% endfor %}";

/// Rewrite the malformed loop-closing tags in a markup string.
pub fn repair_tags(xml: &str) -> Cow<'_, str> {
    if !MALFORMED_TAGS.iter().any(|tag| xml.contains(tag)) {
        return Cow::Borrowed(xml);
    }
    let mut fixed = xml.to_string();
    for tag in MALFORMED_TAGS {
        fixed = fixed.replace(tag, LOOP_CLOSE_TAG);
    }
    Cow::Owned(fixed)
}

/// Repair the template at `path` in place.
///
/// Returns whether the file was rewritten. A missing template is skipped; the
/// render step reports it. When nothing needs fixing the file is untouched.
pub fn repair_template(path: &Path) -> Result<bool, LaudoError> {
    if !path.is_file() {
        return Ok(false);
    }

    let archive_err = |source| LaudoError::TemplateArchive {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| LaudoError::io(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(archive_err)?;

    let original = match read_document(&mut archive).map_err(archive_err)? {
        Some(xml) => xml,
        None => return Ok(false),
    };
    let fixed = match repair_tags(&original) {
        Cow::Borrowed(_) => return Ok(false),
        Cow::Owned(fixed) => fixed,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LaudoError::io(dir, e))?;
    rewrite_archive(&mut archive, fixed.as_bytes(), tmp.as_file_mut()).map_err(archive_err)?;
    drop(archive);
    tmp.persist(path)
        .map_err(|e| LaudoError::io(path, e.error))?;

    log::info!("Repaired malformed loop tags in {}", path.display());
    Ok(true)
}

fn read_document(archive: &mut ZipArchive<File>) -> ZipResult<Option<String>> {
    let mut entry = match archive.by_name(DOCUMENT_PART) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(Some(String::from_utf8_lossy(&data).into_owned()))
}

/// Copy every entry unchanged except the document body.
fn rewrite_archive(
    archive: &mut ZipArchive<File>,
    document: &[u8],
    out: &mut File,
) -> ZipResult<()> {
    let mut writer = ZipWriter::new(out);
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == DOCUMENT_PART {
            let options = SimpleFileOptions::default().compression_method(entry.compression());
            drop(entry);
            writer.start_file(DOCUMENT_PART, options)?;
            writer.write_all(document)?;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairs_both_spellings() {
        let xml = "<w:t>{% dfor %}</w:t><w:t>{% dfor%}</w:t>";
        assert_eq!(
            repair_tags(xml),
            "<w:t>{% endfor %}</w:t><w:t>{% endfor %}</w:t>"
        );
    }

    #[test]
    fn test_correct_markup_is_borrowed() {
        let xml = "<w:t>{% endfor %}</w:t>";
        assert!(matches!(repair_tags(xml), Cow::Borrowed(_)));
    }

    #[test]
    fn test_other_malformed_tags_untouched() {
        let xml = "<w:t>{% endfo %}</w:t>";
        assert_eq!(repair_tags(xml), xml);
    }

    #[test]
    fn test_missing_template_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let repaired = repair_template(&dir.path().join("nope.docx")).unwrap();
        assert!(!repaired);
    }
}
