use serde_json::{Map, Value};

/// Merge `value` over `template`.
///
/// Objects are merged key by key: keys missing from `value` are copied from
/// `template`, keys present in both are reconciled recursively, and keys only
/// in `value` are kept. Any non-object pair resolves to `value` unchanged.
pub fn reconcile(value: Value, template: Value) -> Value {
    match (value, template) {
        (Value::Object(mut user), Value::Object(defaults)) => {
            let mut merged = Map::new();
            for (key, default) in defaults {
                let entry = match user.remove(&key) {
                    Some(present) => reconcile(present, default),
                    None => default,
                };
                merged.insert(key, entry);
            }
            // Whatever is left in `user` is unknown to the template.
            merged.extend(user);
            Value::Object(merged)
        }
        (value, _) => value,
    }
}
