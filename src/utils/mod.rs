pub mod time;

use ulid::Ulid;

/// Prefix for generated worker ids.
const WORKER_ID_PREFIX: &str = "NODE_";
/// Prefix for generated handle ids.
const HANDLE_ID_PREFIX: &str = "HNDL_";

/// Generate a worker id: `NODE_<ulid>`, globally unique and sortable by
/// creation time.
pub fn worker_id() -> String {
    format!("{}{}", WORKER_ID_PREFIX, Ulid::new())
}

/// Generate a handle id: `HNDL_<ulid>`.
pub fn handle_id() -> String {
    format!("{}{}", HANDLE_ID_PREFIX, Ulid::new())
}

/// Generate a bare ulid, used for edge ids.
pub fn longid() -> String {
    Ulid::new().to_string()
}
