//! Size label catalog.
//!
//! Maps the `size` path value of a request to the geometric operation used to
//! produce the output. Unknown or missing labels map to [`TransformSpec::Identity`],
//! which serves the stored bytes untouched.

/// Geometric operation derived from a size label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformSpec {
    /// Downsample by an integer factor using block averaging.
    ReductionFactor(u32),

    /// Fit within a `width x height` box, preserving aspect ratio.
    BoundingBox { width: u32, height: u32 },

    /// No transform; the stored bytes are served verbatim.
    Identity,
}

impl TransformSpec {
    /// Whether this spec leaves the stored bytes untouched.
    pub fn is_identity(&self) -> bool {
        matches!(self, TransformSpec::Identity)
    }
}

const fn bbox(width: u32, height: u32) -> TransformSpec {
    TransformSpec::BoundingBox { width, height }
}

/// Every recognized size label, in table order.
pub const SIZE_LABELS: &[(&str, TransformSpec)] = &[
    ("full", TransformSpec::ReductionFactor(1)),
    ("half", TransformSpec::ReductionFactor(2)),
    ("quarter", TransformSpec::ReductionFactor(4)),
    ("eighth", TransformSpec::ReductionFactor(8)),
    ("xsmall", bbox(80, 80)),
    ("small", bbox(160, 160)),
    ("medium", bbox(320, 320)),
    ("large", bbox(640, 480)),
    ("xlarge", bbox(800, 600)),
    ("xxlarge", bbox(1024, 768)),
    ("xxxlarge", bbox(1280, 1024)),
    ("xxxxlarge", bbox(1600, 1200)),
    ("tivo", bbox(320, 320)),
    ("blog", bbox(852, 852)),
    ("home", bbox(990, 990)),
];

/// Look up the transform for a size label.
///
/// Total over all inputs: labels are matched exactly (case-sensitive), and
/// anything not in [`SIZE_LABELS`] yields [`TransformSpec::Identity`].
pub fn lookup(size: Option<&str>) -> TransformSpec {
    let Some(size) = size else {
        return TransformSpec::Identity;
    };

    SIZE_LABELS
        .iter()
        .find(|(label, _)| *label == size)
        .map(|(_, spec)| *spec)
        .unwrap_or(TransformSpec::Identity)
}
