use uuid::Uuid;

/// Generates an opaque 32-character identifier. Never client-supplied.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
