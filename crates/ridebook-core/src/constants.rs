//! Shared constants

/// Default API base URL when `RIDEBOOK_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default API version segment (`/api/{version}`).
pub const DEFAULT_API_VERSION: &str = "v1";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Direct uploads carry the file payload, so they get a longer budget.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 120;

pub const MIB: u64 = 1024 * 1024;

pub const DEFAULT_LICENSE_MAX_MB: u64 = 5;
pub const DEFAULT_INSURANCE_MAX_MB: u64 = 10;
pub const DEFAULT_IDENTITY_MAX_MB: u64 = 5;
pub const DEFAULT_VEHICLE_REGISTRATION_MAX_MB: u64 = 5;

/// Plain-text error bodies longer than this are cut before being shown to a user.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 200;
