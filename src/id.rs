use chrono::Utc;

pub const CUSTOM_PREFIX: &str = "custom-";

/// Generate `custom-<unix-millis>`, bumping the timestamp past any id
/// already in use.
pub fn generate_id(existing_ids: &[&str]) -> String {
    generate_id_at(Utc::now().timestamp_millis(), existing_ids)
}

fn generate_id_at(millis: i64, existing_ids: &[&str]) -> String {
    let mut stamp = millis;
    loop {
        let id = format!("{CUSTOM_PREFIX}{stamp}");
        if !existing_ids.contains(&id.as_str()) {
            return id;
        }
        stamp += 1;
    }
}
