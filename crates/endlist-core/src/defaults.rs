//! Centralized default constants for endlist.
//!
//! Every crate references these instead of defining its own literals.

// =============================================================================
// GEOGRAPHY SENTINELS
// =============================================================================

/// Contingent name when the institutional record is missing.
pub const UNKNOWN_NAME: &str = "Unknown";

/// State label when no state can be resolved.
pub const UNKNOWN_STATE: &str = "Unknown State";

/// District (PPD) label when none applies.
pub const UNKNOWN_PPD: &str = "Unknown PPD";

/// District label for independent contingents.
pub const INDEPENDENT_PPD: &str = "INDEPENDENT";

/// Verbose federal-territory prefix rewritten on display.
pub const FEDERAL_TERRITORY_LONG: &str = "WILAYAH PERSEKUTUAN";

/// Short canonical form of [`FEDERAL_TERRITORY_LONG`].
pub const FEDERAL_TERRITORY_SHORT: &str = "WP";

// =============================================================================
// MEMBER LABELS
// =============================================================================

/// Class grade token for special needs classes; never reformatted.
pub const SPECIAL_NEEDS_GRADE: &str = "PPKI";

// =============================================================================
// REQUEST HANDLING
// =============================================================================

/// Upper bound for a whole reconciliation request, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Concurrent per-team member/manager fetches during projection.
pub const FETCH_CONCURRENCY: usize = 8;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const SERVER_PORT: u16 = 3000;

/// Default database URL.
pub const DATABASE_URL: &str = "postgres://localhost/endlist";

/// Default maximum pool connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;
