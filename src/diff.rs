use serde_json::Value;

/// Collect `(path, old, new)` for every leaf of `current` that differs from
/// `previous`. Keys only present in `previous` are not reported.
pub(crate) fn diff_json(
    previous: &Value,
    current: &Value,
    path_prefix: &str,
    changes: &mut Vec<(String, Value, Value)>,
) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = if path_prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{path_prefix}.{key}")
                };
                match prev_map.get(key) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None => {
                        if curr_val.is_object() {
                            diff_json(&Value::Object(serde_json::Map::new()), curr_val, &path, changes);
                        } else {
                            changes.push((path, Value::Null, curr_val.clone()));
                        }
                    }
                }
            }
        }
        (prev, curr) if prev != curr => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_detects_byte_change() {
        let prev = json!({"ch_temp_msb": 16, "ch_temp_lsb": 121, "IO": 8});
        let curr = json!({"ch_temp_msb": 16, "ch_temp_lsb": 130, "IO": 8});
        let mut changes = vec![];
        diff_json(&prev, &curr, "", &mut changes);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, "ch_temp_lsb");
        assert_eq!(changes[0].1, json!(121));
        assert_eq!(changes[0].2, json!(130));
    }

    #[test]
    fn diff_ignores_unchanged() {
        let val = json!({"displ_code": 126, "IO": 0});
        let mut changes = vec![];
        diff_json(&val, &val, "", &mut changes);
        assert!(changes.is_empty());
    }

    #[test]
    fn diff_detects_new_key() {
        let prev = json!({"IO": 0});
        let curr = json!({"IO": 0, "room_temp_2_msb": 7});
        let mut changes = vec![];
        diff_json(&prev, &curr, "", &mut changes);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, "room_temp_2_msb");
        assert_eq!(changes[0].1, Value::Null);
    }

    #[test]
    fn diff_nested_path() {
        let prev = json!({"heaterlist": {"0": "S1"}});
        let curr = json!({"heaterlist": {"0": "S2"}});
        let mut changes = vec![];
        diff_json(&prev, &curr, "", &mut changes);
        assert_eq!(changes[0].0, "heaterlist.0");
    }
}
