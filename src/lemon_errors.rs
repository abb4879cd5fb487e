use thiserror::Error;

/// Errors raised while writing or reading LEMON XML documents.
///
/// Variants
/// -----------------
/// * `SchemaViolation` – The document does not conform to its embedded DTD. On the write path
///   this signals an internal serialization defect, on the read path bad or foreign input.
/// * `ReferentialIntegrity` – An offset was appended to a file whose reference image differs.
/// * `NotFoundOrUnreadable` – The pre-flight check before parsing failed (missing file,
///   permissions, not a regular file).
/// * `MalformedDocument` – The byte stream is not well-formed XML, or its DTD cannot be parsed.
/// * `InvalidValue` – A schema-valid value that cannot be converted to its typed form.
/// * `InvalidPassband` – A photometric filter name that cannot be parsed.
/// * `DuplicateBand` – Two `band` elements of an annuli document share the same filter.
/// * `InconsistentSize` – The `size` attribute disagrees with the number of offsets.
/// * `IoError` – Any other file-system failure.
#[derive(Error, Debug)]
pub enum LemonError {
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Reference image '{found}' differs from that of the offsets file ('{expected}')")]
    ReferentialIntegrity { expected: String, found: String },

    #[error("File not found or unreadable: {path} ({reason})")]
    NotFoundOrUnreadable { path: String, reason: String },

    #[error("Malformed XML document: {0}")]
    MalformedDocument(String),

    #[error("Invalid value for '{field}': {value:?}")]
    InvalidValue { field: String, value: String },

    #[error("Invalid photometric filter: {0:?}")]
    InvalidPassband(String),

    #[error("Photometric filter '{0}' appears in more than one band")]
    DuplicateBand(String),

    #[error("Offsets file declares size {declared} but contains {found} offsets")]
    InconsistentSize { declared: usize, found: usize },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl LemonError {
    pub(crate) fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        LemonError::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wrap any engine-level error (tokenizer, attribute, writer) as a malformed document.
    pub(crate) fn malformed<E: std::fmt::Display>(err: E) -> Self {
        LemonError::MalformedDocument(err.to_string())
    }
}

impl PartialEq for LemonError {
    fn eq(&self, other: &Self) -> bool {
        use LemonError::*;
        match (self, other) {
            (SchemaViolation(a), SchemaViolation(b)) => a == b,
            (
                ReferentialIntegrity {
                    expected: e1,
                    found: f1,
                },
                ReferentialIntegrity {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (
                NotFoundOrUnreadable {
                    path: p1,
                    reason: r1,
                },
                NotFoundOrUnreadable {
                    path: p2,
                    reason: r2,
                },
            ) => p1 == p2 && r1 == r2,
            (MalformedDocument(a), MalformedDocument(b)) => a == b,
            (
                InvalidValue {
                    field: f1,
                    value: v1,
                },
                InvalidValue {
                    field: f2,
                    value: v2,
                },
            ) => f1 == f2 && v1 == v2,
            (InvalidPassband(a), InvalidPassband(b)) => a == b,
            (DuplicateBand(a), DuplicateBand(b)) => a == b,
            (
                InconsistentSize {
                    declared: d1,
                    found: f1,
                },
                InconsistentSize {
                    declared: d2,
                    found: f2,
                },
            ) => d1 == d2 && f1 == f2,

            // io::Error is not comparable: equal if same variant
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
