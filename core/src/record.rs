use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a mirrored record, as delivered by the upstream store.
///
/// Upstreams hand out string ids or any JSON number. Ordering is total:
/// integers by value, then fractional numbers, then strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    /// Negative integers; non-negative ones deserialize as `Number`.
    Integer(i64),
    Float(FloatId),
    Text(String),
}

/// A non-integral JSON number used as an id. Equality and hashing go by bit
/// pattern so the id can key a map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloatId(pub f64);

impl PartialEq for FloatId {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatId {}

impl Hash for FloatId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Ord for FloatId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for FloatId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl RecordId {
    fn class(&self) -> u8 {
        match self {
            RecordId::Number(_) | RecordId::Integer(_) => 0,
            RecordId::Float(_) => 1,
            RecordId::Text(_) => 2,
        }
    }

    fn as_integer(&self) -> Option<i128> {
        match self {
            RecordId::Number(n) => Some(i128::from(*n)),
            RecordId::Integer(n) => Some(i128::from(*n)),
            _ => None,
        }
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RecordId::Float(a), RecordId::Float(b)) => a.cmp(b),
            (RecordId::Text(a), RecordId::Text(b)) => a.cmp(b),
            _ => match (self.as_integer(), other.as_integer()) {
                // `Integer(5)` and `Number(5)` are distinct ids; keep them apart.
                (Some(a), Some(b)) => a
                    .cmp(&b)
                    .then_with(|| matches!(self, RecordId::Number(_)).cmp(&matches!(other, RecordId::Number(_)))),
                _ => self.class().cmp(&other.class()),
            },
        }
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Integer(n) => write!(f, "{n}"),
            RecordId::Float(x) => write!(f, "{}", x.0),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        RecordId::Number(n)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        match u64::try_from(n) {
            Ok(n) => RecordId::Number(n),
            Err(_) => RecordId::Integer(n),
        }
    }
}

impl From<f64> for RecordId {
    fn from(x: f64) -> Self {
        RecordId::Float(FloatId(x))
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

/// A message as mirrored from the upstream.
///
/// Only `id` and `message` are interpreted; every other upstream field is kept
/// in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub message: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, message: impl Into<String>) -> Self {
        Self { id: id.into(), message: message.into(), extra: serde_json::Map::new() }
    }

    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_unknown_fields() {
        let raw = json!({
            "id": "b1c2",
            "user_id": "u-9",
            "user_name": "Sophia",
            "timestamp": "2024-05-01T10:00:00Z",
            "message": "Book a table for two",
        });
        let rec: Record = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(rec.id, RecordId::from("b1c2"));
        assert_eq!(rec.message, "Book a table for two");
        assert_eq!(rec.extra["user_name"], json!("Sophia"));
        assert_eq!(serde_json::to_value(&rec).unwrap(), raw);
    }

    #[test]
    fn numeric_and_string_ids() {
        let n: Record = serde_json::from_value(json!({"id": 7, "message": "x"})).unwrap();
        let s: Record = serde_json::from_value(json!({"id": "7", "message": "x"})).unwrap();
        assert_eq!(n.id, RecordId::Number(7));
        assert_eq!(s.id, RecordId::Text("7".into()));
        assert!(n.id < s.id);
    }

    #[test]
    fn negative_and_fractional_ids() {
        let neg: Record = serde_json::from_value(json!({"id": -1, "message": "x"})).unwrap();
        let frac: Record = serde_json::from_value(json!({"id": 1.5, "message": "x"})).unwrap();
        assert_eq!(neg.id, RecordId::Integer(-1));
        assert_eq!(frac.id, RecordId::Float(FloatId(1.5)));
        assert_eq!(serde_json::to_value(&neg).unwrap()["id"], json!(-1));
        assert_eq!(serde_json::to_value(&frac).unwrap()["id"], json!(1.5));

        let mut ids = vec![
            RecordId::from("a"),
            RecordId::from(1.5),
            RecordId::Number(3),
            RecordId::from(-7i64),
            RecordId::Number(0),
            RecordId::from(-0.5),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                RecordId::Integer(-7),
                RecordId::Number(0),
                RecordId::Number(3),
                RecordId::from(-0.5),
                RecordId::from(1.5),
                RecordId::from("a"),
            ]
        );
        assert_eq!(RecordId::from(4i64), RecordId::Number(4));
        assert_ne!(RecordId::Integer(4).cmp(&RecordId::Number(4)), Ordering::Equal);
    }

    #[test]
    fn missing_message_is_rejected() {
        let r = serde_json::from_value::<Record>(json!({"id": 1}));
        assert!(r.is_err());
    }
}
