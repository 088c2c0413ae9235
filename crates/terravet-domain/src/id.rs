use uuid::Uuid;

/// Short collision-resistant token for composing cloud-unique names.
///
/// Eight hex chars of a v4 UUID: cheap, lowercase, and safe in every Azure
/// name position we use it in. Collisions across concurrent runs are
/// accepted as negligible-probability, not guarded against further.
pub fn unique_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
