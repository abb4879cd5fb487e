#![allow(dead_code)]

use approx::assert_relative_eq;
use camino::{Utf8Path, Utf8PathBuf};
use lemonxml::{CandidateAnnuli, ImageDescriptor};
use tempfile::TempDir;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A fresh temporary directory and a UTF-8 path to `name` inside it
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_file(name: &str) -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8Path::from_path(dir.path()).unwrap().join(name);
    (dir, path)
}

pub fn data(name: &str) -> Utf8PathBuf {
    Utf8Path::new("tests/data").join(name)
}

pub fn assert_image_close(actual: &ImageDescriptor, expected: &ImageDescriptor) {
    assert_eq!(actual.path(), expected.path());
    assert_eq!(actual.date(), expected.date());
    assert_eq!(actual.filter(), expected.filter());
    assert_eq!(actual.object(), expected.object());
    assert_relative_eq!(actual.fwhm(), expected.fwhm(), epsilon = 1e-12);
    assert_relative_eq!(actual.airmass(), expected.airmass(), epsilon = 1e-12);
}

pub fn assert_candidates_close(actual: &[CandidateAnnuli], expected: &[CandidateAnnuli]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(a.aperture, e.aperture, epsilon = 1e-5);
        assert_relative_eq!(a.annulus, e.annulus, epsilon = 1e-5);
        assert_relative_eq!(a.dannulus, e.dannulus, epsilon = 1e-5);
        assert_relative_eq!(a.stdev, e.stdev, epsilon = 1e-8);
    }
}
