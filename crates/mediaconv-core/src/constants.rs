//! Shared constants

/// Index list sentinel meaning "every processed variant, in stored order".
pub const ALL_VARIANTS_SENTINEL: i64 = -1;

/// Default bound, in pixels, for both dimensions of a processed variant.
pub const DEFAULT_MAX_DIMENSION: u32 = 3500;

/// Default PDF rasterization resolution.
pub const DEFAULT_PDF_DPI: u32 = 300;

/// Default attempt ceiling for a conversion job.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
