use super::*;

#[test]
fn package_id_displays_as_raw_string() {
    let id = PackageId::new("ubuntu");
    assert_eq!(id.to_string(), "ubuntu");
    assert_eq!(id, *"ubuntu");
}

#[test]
fn package_id_usable_as_hashmap_key_by_str_borrow() {
    use std::collections::HashMap;
    let mut map: HashMap<PackageId, u32> = HashMap::new();
    map.insert(PackageId::new("ubuntu"), 1);
    assert_eq!(map.get("ubuntu"), Some(&1));
}

#[test]
fn job_id_from_string_roundtrips() {
    let id = JobId::from("mirror".to_string());
    assert_eq!(id.as_str(), "mirror");
}
