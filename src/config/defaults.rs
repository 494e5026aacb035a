//! Default constants for projline configuration.

// =============================================================================
// Input Defaults
// =============================================================================

/// Default path of the API export document
pub const DEFAULT_API_EXPORT: &str = "static/projects.json";

/// Default path of the spreadsheet export
pub const DEFAULT_SHEET_EXPORT: &str = "static/allprojects.csv";

// =============================================================================
// Timeline Defaults
// =============================================================================

/// Days between samples of the active-count series
pub const DEFAULT_SAMPLE_STEP_DAYS: u32 = 1;

// =============================================================================
// Swarm Defaults
// =============================================================================

/// Marker radius, in position units
pub const DEFAULT_SWARM_RADIUS: f64 = 3.0;

/// Seconds of publish time per position unit (one day)
pub const DEFAULT_SWARM_UNIT_SECONDS: u32 = 86_400;
