//! API constants

/// API version segment used in every versioned route
pub const API_VERSION: &str = "v1";

/// Versioned API prefix, e.g. `/api/v1`
pub const API_PREFIX: &str = "/api/v1";

/// Where the OpenAPI document is served
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Mount point of the thumbnail assets directory
pub const ASSETS_MOUNT: &str = "/assets";

/// Headroom over the largest upload ceiling for multipart framing
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
