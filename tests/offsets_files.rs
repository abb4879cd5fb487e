mod common;

use std::fs;

use approx::assert_relative_eq;
use common::{assert_image_close, data, init_tracing, temp_file};
use lemonxml::{ImageDescriptor, LemonError, XmlEncoding, XmlOffset, XmlOffsetFile};

fn reference() -> ImageDescriptor {
    ImageDescriptor::new(
        "ref.fits",
        1329174680,
        "Johnson I".parse().unwrap(),
        "ngc2264_1minI",
        5.722,
        1.134,
    )
}

fn shifted(path: &str, date: i64) -> ImageDescriptor {
    ImageDescriptor::new(
        path,
        date,
        "Johnson I".parse().unwrap(),
        "ngc2264_1minI",
        5.9,
        1.131,
    )
}

#[test]
fn test_dump_and_load() {
    init_tracing();
    let (_dir, path) = temp_file("offsets.xml");

    let mut file = XmlOffsetFile::new(reference());
    file.add(XmlOffset::new("ref.fits", shifted("b.fits", 1329174900), 1.5, -0.75, 12, 10))
        .unwrap();
    file.add(XmlOffset::new("ref.fits", shifted("a.fits", 1329174782), -3.25, 0.125, 7, 9))
        .unwrap();
    file.dump(&path, XmlEncoding::Utf8).unwrap();

    let loaded = XmlOffsetFile::load(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_image_close(loaded.reference(), &reference());

    // document order is kept, no sorting on load
    let first = loaded.get(0).unwrap();
    assert_image_close(&first.shifted, &shifted("b.fits", 1329174900));
    assert_eq!(first.reference, "ref.fits");
    assert_relative_eq!(first.x, 1.5);
    assert_relative_eq!(first.y, -0.75);
    assert_eq!((first.x_overlap, first.y_overlap), (12, 10));

    let second = loaded.get(1).unwrap();
    assert_eq!(second.shifted.path(), "a.fits");
    assert_relative_eq!(second.x, -3.25);
    assert_relative_eq!(second.y, 0.125);

    assert_eq!(loaded, file);
}

#[test]
fn test_offset_reference_is_only_a_path() {
    let (_dir, path) = temp_file("offsets.xml");

    // the offset knows nothing of the reference image but its path
    let mut file = XmlOffsetFile::new(reference());
    let shifted_a = shifted("a.fits", 1329174782);
    let offset = XmlOffset::new(String::from("ref.fits"), shifted_a, 1.5, -0.75, 12, 10);
    file.add(offset.clone()).unwrap();
    file.dump(&path, XmlEncoding::Utf8).unwrap();

    let loaded = XmlOffsetFile::load(&path).unwrap();
    assert_eq!(loaded.get(0), Some(&offset));
    assert_eq!(loaded, file);

    let foreign = XmlOffset::new("elsewhere/ref.fits", shifted("b.fits", 1329174900), 0.0, 0.0, 1, 1);
    assert_eq!(
        file.add(foreign),
        Err(LemonError::ReferentialIntegrity {
            expected: "ref.fits".into(),
            found: "elsewhere/ref.fits".into(),
        })
    );
}

#[test]
fn test_dump_overwrites() {
    let (_dir, path) = temp_file("offsets.xml");
    fs::write(&path, "not xml at all").unwrap();

    let file = XmlOffsetFile::new(reference());
    file.dump(&path, XmlEncoding::Utf8).unwrap();

    let loaded = XmlOffsetFile::load(&path).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn test_ascii_encoding() {
    let (_dir, path) = temp_file("offsets.xml");
    let image = ImageDescriptor::new(
        "données/ref.fits",
        0,
        "Strömgren y".parse().unwrap(),
        "Melotte 111",
        3.0,
        1.0,
    );
    let mut file = XmlOffsetFile::new(image.clone());
    file.add(XmlOffset::new(image.path(), image.clone(), 0.0, 0.0, 1, 1))
        .unwrap();
    file.dump(&path, XmlEncoding::Ascii).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.is_ascii());
    assert!(text.starts_with("<?xml version='1.0' encoding='us-ascii' standalone='yes'?>"));

    let loaded = XmlOffsetFile::load(&path).unwrap();
    assert_eq!(loaded.reference().path(), "données/ref.fits");
    assert_eq!(loaded.reference().filter().to_string(), "Strömgren y");
}

#[test]
fn test_control_character_in_path() {
    let (_dir, path) = temp_file("offsets.xml");
    let image = ImageDescriptor::new(
        "ref\u{1}.fits",
        1329174680,
        "Johnson I".parse().unwrap(),
        "ngc2264_1minI",
        5.722,
        1.134,
    );
    let file = XmlOffsetFile::new(image);
    assert_eq!(
        file.dump(&path, XmlEncoding::Utf8),
        Err(LemonError::MalformedDocument(
            "character U+0001 is not allowed in XML".into()
        ))
    );
    assert!(!path.exists());

    // nor is it accepted from disk, raw or as a character reference
    let text = fs::read_to_string(data("offsets.xml")).unwrap();
    for path_text in ["<path>ref\u{1}.fits</path>", "<path>ref&#1;.fits</path>"] {
        fs::write(&path, text.replacen("<path>ref.fits</path>", path_text, 1)).unwrap();
        assert!(matches!(
            XmlOffsetFile::load(&path),
            Err(LemonError::MalformedDocument(_))
        ));
    }
}

#[test]
fn test_load_fixture() {
    let file = XmlOffsetFile::load(&data("offsets.xml")).unwrap();
    assert_eq!(file.reference().path(), "ref.fits");
    assert_eq!(file.reference().date(), 1329174680);

    let offset = file.iter().next().unwrap();
    assert_eq!(offset.shifted.path(), "ferM_017.fits");
    assert_eq!(offset.shifted.date(), 1329174782);
    assert_relative_eq!(offset.shifted.fwhm(), 5.9);
    assert_eq!((offset.x_overlap, offset.y_overlap), (12, 10));
}

#[test]
fn test_missing_overlap_is_a_schema_violation() {
    let err = XmlOffsetFile::load(&data("offsets_missing_overlap.xml")).unwrap_err();
    match err {
        LemonError::SchemaViolation(msg) => assert!(msg.contains("overlap"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_size_mismatch() {
    assert_eq!(
        XmlOffsetFile::load(&data("offsets_size_mismatch.xml")),
        Err(LemonError::InconsistentSize {
            declared: 2,
            found: 1
        })
    );
}

#[test]
fn test_missing_file() {
    let (_dir, path) = temp_file("absent.xml");
    assert!(matches!(
        XmlOffsetFile::load(&path),
        Err(LemonError::NotFoundOrUnreadable { .. })
    ));
}

#[test]
fn test_modified_dtd_is_rejected() {
    let (_dir, path) = temp_file("offsets.xml");
    let text = fs::read_to_string(data("offsets.xml")).unwrap();
    fs::write(&path, text.replace("offset*", "offset+")).unwrap();

    assert!(matches!(
        XmlOffsetFile::load(&path),
        Err(LemonError::SchemaViolation(_))
    ));
}

#[test]
fn test_annuli_document_is_not_an_offsets_document() {
    assert!(matches!(
        XmlOffsetFile::load(&data("annuli.xml")),
        Err(LemonError::SchemaViolation(_))
    ));
}

#[test]
fn test_invalid_date() {
    let (_dir, path) = temp_file("offsets.xml");
    let text = fs::read_to_string(data("offsets.xml")).unwrap();
    fs::write(
        &path,
        text.replace("Mon Feb 13 23:13:02 2012 UTC", "13/02/2012"),
    )
    .unwrap();

    assert_eq!(
        XmlOffsetFile::load(&path),
        Err(LemonError::InvalidValue {
            field: "date".into(),
            value: "13/02/2012".into(),
        })
    );
}
