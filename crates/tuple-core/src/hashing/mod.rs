//! Canonicalización JSON y hash (blake3) para fingerprints de unidades.

mod canonical_json;

pub use canonical_json::to_canonical_json;

use blake3::Hasher;
use serde_json::Value;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash estable de un JSON: independiente del orden de claves.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_hash() {
        let a = json!({"class": "Sum", "operand": "Long", "nested": {"y": 1, "x": [1, 2]}});
        let b = json!({"nested": {"x": [1, 2], "y": 1}, "operand": "Long", "class": "Sum"});
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_ne!(hash_value(&a), hash_value(&json!({"class": "Sum"})));
        assert_eq!(hash_str("").len(), 64);
    }
}
