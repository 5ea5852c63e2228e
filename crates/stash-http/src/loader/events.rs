//! Values of the `event` field on loader log records.

pub const GET_OBJECT: &str = "get_object";
pub const INFO_READ: &str = "info_read";
pub const CACHE_READ: &str = "cache_read";
pub const CACHE_WRITE: &str = "cache_write";
pub const CACHE_REMOVE: &str = "cache_remove";
pub const HTTP_LOAD: &str = "http_load";
pub const LOCAL_INFO_BAD: &str = "local_info_bad";
pub const LOCAL_INFO_EMPTY: &str = "local_info_empty";
pub const LOCAL_INFO_MALFORMED: &str = "local_info_malformed";
pub const LOCAL_BODY_BAD: &str = "local_body_bad";
pub const LOCAL_BODY_EMPTY: &str = "local_body_empty";
pub const LOCAL_CACHE_HIT: &str = "local_cache_hit";
pub const HTTP_CACHE_HIT: &str = "http_cache_hit";
