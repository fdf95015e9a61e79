// =============================================================================
// AgroConnect Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default SQLite database location (created on first connect)
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/agroconnect.db?mode=rwc";

/// Default number of pooled database connections
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Upper bound for a single multipart request (attachments)
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// SESSIONS
// =============================================================================

/// Sessions unused for this long are dropped (24 hours)
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

// =============================================================================
// EXTERNAL SERVICES
// =============================================================================

/// Public Nominatim instance used for reverse geocoding
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// User agent sent to the geocoder (Nominatim requires one)
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "agroconnect";

/// Timeout applied to every outbound HTTP request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// MEDIA STORAGE
// =============================================================================

/// Root directory for uploaded chat media
pub const DEFAULT_MEDIA_ROOT: &str = "assets";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];

// =============================================================================
// LANGUAGES
// =============================================================================

/// Fallback language for users, detection and translation targets
pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages a user can pick as their preference
pub const APP_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("te", "Telugu"),
    ("mr", "Marathi"),
    ("ta", "Tamil"),
    ("ur", "Urdu"),
    ("gu", "Gujarati"),
    ("kn", "Kannada"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("or", "Odia"),
];

/// Target languages the translation adapter will forward to the backend
pub const SUPPORTED_TRANSLATION_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "as", "az", "be", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el",
    "en", "es", "et", "eu", "fa", "fi", "fr", "ga", "gl", "gu", "ha", "he", "hi", "hr", "hu",
    "hy", "id", "ig", "is", "it", "ja", "jv", "ka", "kk", "km", "kn", "ko", "ky", "lo", "lt",
    "lv", "mg", "mk", "ml", "mn", "mr", "ms", "mt", "my", "ne", "nl", "no", "or", "pa", "pl",
    "ps", "pt", "ro", "ru", "sd", "si", "sk", "sl", "so", "sq", "sr", "sv", "sw", "ta", "te",
    "tg", "th", "tl", "tr", "uk", "ur", "uz", "vi", "xh", "yo", "zh", "zu",
];

// =============================================================================
// CONTACTS
// =============================================================================

/// Transaction statuses that count as a prior interaction
pub const INTERACTION_TRANSACTION_STATUSES: &[&str] = &["pending", "completed"];

/// Status assigned to newly recorded purchases
pub const DEFAULT_TRANSACTION_STATUS: &str = "pending";
