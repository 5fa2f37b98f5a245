use std::cmp::Ordering;

/// The two data types a field can hold. Integer is a fixed 4-byte signed
/// value; String is variable length, capped at `MAX_STRING_VALUE` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    Integer,
    String,
}

impl DataType {
    /// The on-disk tag written for this type in `.def` files and used to
    /// detect an unknown/corrupt tag on read.
    pub fn tag(self) -> i32 {
        match self {
            DataType::Integer => 1,
            DataType::String => 2,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            1 => Some(DataType::Integer),
            2 => Some(DataType::String),
            _ => None,
        }
    }
}

/// The length cap (excluding the NUL terminator) for a `String` value.
pub const MAX_STRING_VALUE: usize = 64;

/// A single field's value, tagged with the `DataType` it was read/written as.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i32),
    Text(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Integer,
            Value::Text(_) => DataType::String,
        }
    }

    /// Compare two values of the same type, returning `None` if the types
    /// differ (callers treat a type mismatch as "predicate does not hold").
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering::{Equal, Less};

    #[test]
    fn tag_round_trips() {
        for dt in [DataType::Integer, DataType::String] {
            assert_eq!(DataType::from_tag(dt.tag()), Some(dt));
        }
        assert_eq!(DataType::from_tag(0), None);
        assert_eq!(DataType::from_tag(99), None);
    }

    #[test]
    fn cmp_same_type_works() {
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Int(2)), Some(Less));
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Text("1".into())), None);
    }

    #[test]
    fn comparisons_require_same_type() {
        assert_eq!(
            Value::Text("a".into()).cmp_same_type(&Value::Text("a".into())),
            Some(Equal)
        );
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Text("1".into())), None);
    }

    #[test]
    fn string_ordering_is_unsigned_byte_order() {
        // Lexicographic over bytes, not locale-aware.
        let a = Value::Text("A".into());
        let b = Value::Text("a".into());
        assert_eq!(a.cmp_same_type(&b), Some(Less));
    }

    #[test]
    fn data_type_matches_value_variant() {
        assert_eq!(Value::Int(0).data_type(), DataType::Integer);
        assert_eq!(Value::Text(String::new()).data_type(), DataType::String);
    }

    proptest! {
        #[test]
        fn order_is_antisymmetric(i in any::<i32>(), j in any::<i32>()) {
            let a = Value::Int(i);
            let b = Value::Int(j);
            match (a.cmp_same_type(&b), b.cmp_same_type(&a)) {
                (Some(o1), Some(o2)) => prop_assert_eq!(o1, o2.reverse()),
                _ => prop_assert!(false, "same-type ints always compare"),
            }
        }

        #[test]
        fn text_cmp_matches_byte_order(a in ".*", b in ".*") {
            let va = Value::Text(a.clone());
            let vb = Value::Text(b.clone());
            prop_assert_eq!(va.cmp_same_type(&vb), Some(a.as_bytes().cmp(b.as_bytes())));
        }
    }
}
