// Retrieve endpoint, relative to the API base URL
pub const RETRIEVE_PATH: &str = "datalake/retrieve";
pub const FILE_ID_PARAM: &str = "fileId";
pub const PRESIGNED_PARAM: &str = "getPresigned";
pub const PRESIGNED_VALUE: &str = "True";
pub const PRESIGNED_URL_FIELD: &str = "url";

// Credential headers
pub const ORG_SLUG_HEADER: &str = "x-org-slug";
pub const AUTH_TOKEN_HEADER: &str = "ts-auth-token";

// Retry defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_STATUSES: &[u16] = &[502];
pub const DEFAULT_RETRY_MIN_DELAY_MS: u64 = 100;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 3000;

// Connection defaults
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_FILE: &str = "auth.json";

// Suffix for files still being written
pub const PARTIAL_SUFFIX: &str = ".part";
