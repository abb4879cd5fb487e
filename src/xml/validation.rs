use std::fs::{self, File};

use camino::Utf8Path;
use tracing::debug;

use super::{dtd::Dtd, element::Document, schemas::DocumentKind};
use crate::lemon_errors::LemonError;

/// Pre-flight check: `path` must exist, be a regular file and be readable
pub fn check_readable(path: &Utf8Path) -> Result<(), LemonError> {
    let unreadable = |reason: String| LemonError::NotFoundOrUnreadable {
        path: path.to_string(),
        reason,
    };

    let metadata = fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".into()));
    }
    File::open(path).map_err(|e| unreadable(e.to_string()))?;
    Ok(())
}

/// Parse `text` and validate it against the catalog DTD of `kind`
///
/// The document must embed a DOCTYPE declaration, and that declaration must be the catalog
/// DTD itself: a document carrying a different or weaker DTD is rejected even if it conforms
/// to its own. A DTD the parser does not support counts as different.
pub fn validate_str(text: &str, kind: DocumentKind) -> Result<Document, LemonError> {
    let document = Document::parse(text)?;

    let doctype = document.doctype.as_deref().ok_or_else(|| {
        LemonError::SchemaViolation(format!("{kind}: missing DOCTYPE declaration"))
    })?;
    if Dtd::parse(doctype).ok().as_ref() != Some(kind.dtd()) {
        return Err(LemonError::SchemaViolation(format!(
            "{kind}: embedded DTD differs from the {kind} document type"
        )));
    }

    kind.dtd().validate(&document.root)?;
    Ok(document)
}

/// Read a file and validate it against the catalog DTD of `kind`
///
/// The bytes are decoded as UTF-8 whatever encoding the XML declaration names.
#[tracing::instrument]
pub fn read_validated(path: &Utf8Path, kind: DocumentKind) -> Result<Document, LemonError> {
    check_readable(path)?;
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(LemonError::malformed)?;
    let document = validate_str(&text, kind)?;
    debug!(root = %document.root.name, "document is valid");
    Ok(document)
}

/// Write `content` to `path`, overwriting it, then read it back through the validation gate
#[tracing::instrument(skip(content))]
pub fn write_validated(
    path: &Utf8Path,
    content: &str,
    kind: DocumentKind,
) -> Result<Document, LemonError> {
    fs::write(path, content)?;
    read_validated(path, kind)
}

#[cfg(test)]
mod validation_test {
    use camino::Utf8PathBuf;

    use super::*;

    const EMPTY_ANNULI: &str = "<?xml version='1.0' encoding='utf-8' standalone='yes'?>\n\
        <!DOCTYPE annuli [\n\
        <!ELEMENT annuli (band*)>\n\
        <!ELEMENT band (candidate*)>\n\
        <!ATTLIST band name CDATA #REQUIRED>\n\
        <!ATTLIST band aperture CDATA #REQUIRED>\n\
        <!ATTLIST band annulus CDATA #REQUIRED>\n\
        <!ATTLIST band dannulus CDATA #REQUIRED>\n\
        <!ATTLIST band stdev CDATA #REQUIRED>\n\
        <!ELEMENT candidate EMPTY>\n\
        <!ATTLIST candidate aperture CDATA #REQUIRED>\n\
        <!ATTLIST candidate annulus CDATA #REQUIRED>\n\
        <!ATTLIST candidate dannulus CDATA #REQUIRED>\n\
        <!ATTLIST candidate stdev CDATA #REQUIRED>\n\
        ]>\n\
        <annuli/>\n";

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_validate_str() {
        let document = validate_str(EMPTY_ANNULI, DocumentKind::Annuli).unwrap();
        assert_eq!(document.root.name, "annuli");
        assert!(document.root.children.is_empty());
    }

    #[test]
    fn test_document_without_doctype() {
        assert_eq!(
            validate_str("<annuli/>", DocumentKind::Annuli),
            Err(LemonError::SchemaViolation(
                "annuli: missing DOCTYPE declaration".into()
            ))
        );
    }

    #[test]
    fn test_foreign_dtd_is_rejected() {
        for weaker in [
            "<!DOCTYPE annuli [<!ELEMENT annuli (band?)><!ELEMENT band EMPTY>]>\n<annuli/>",
            "<!DOCTYPE annuli [<!ELEMENT annuli ANY>]>\n<annuli/>",
        ] {
            assert_eq!(
                validate_str(weaker, DocumentKind::Annuli),
                Err(LemonError::SchemaViolation(
                    "annuli: embedded DTD differs from the annuli document type".into()
                ))
            );
        }
        assert!(matches!(
            validate_str(EMPTY_ANNULI, DocumentKind::Offsets),
            Err(LemonError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_check_readable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = temp_path(&dir, "missing.xml");
        assert!(matches!(
            check_readable(&missing),
            Err(LemonError::NotFoundOrUnreadable { .. })
        ));

        let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            check_readable(&folder),
            Err(LemonError::NotFoundOrUnreadable {
                path: folder.to_string(),
                reason: "not a regular file".into(),
            })
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "annuli.xml");
        write_validated(&path, EMPTY_ANNULI, DocumentKind::Annuli).unwrap();
        let document = read_validated(&path, DocumentKind::Annuli).unwrap();
        assert!(document.root.children.is_empty());

        fs::write(&path, "<annuli>").unwrap();
        assert!(matches!(
            read_validated(&path, DocumentKind::Annuli),
            Err(LemonError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_declared_encoding_is_not_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "annuli.xml");

        // pure ASCII reads fine whatever the declaration says
        let ascii = EMPTY_ANNULI.replace("encoding='utf-8'", "encoding='iso-8859-1'");
        fs::write(&path, &ascii).unwrap();
        assert!(read_validated(&path, DocumentKind::Annuli).is_ok());

        // a Latin-1 byte is not UTF-8
        let prolog = ascii.replace("<annuli/>\n", "");
        fs::write(&path, [prolog.as_bytes(), &b"<annuli>\xF6</annuli>\n"[..]].concat()).unwrap();
        assert!(matches!(
            read_validated(&path, DocumentKind::Annuli),
            Err(LemonError::MalformedDocument(_))
        ));
    }
}
