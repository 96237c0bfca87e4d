use std::cmp::Ordering;

use serde_json::Value;

use crate::geodata::feature::value_as_key;

/// Compare two terms lexicographically after stringifying non-string values.
///
/// Returns `None` ("not found") when either term is null or has no string form.
pub fn term_compare(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    let a = value_as_key(a?)?;
    let b = value_as_key(b?)?;
    Some(a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use rstest::rstest;
    use serde_json::{json, Value};

    use super::term_compare;

    #[rstest]
    #[case(json!("Texas"), json!("Texas"), Ordering::Equal)]
    #[case(json!("Alaska"), json!("Texas"), Ordering::Less)]
    #[case(json!("b"), json!("B"), Ordering::Greater)]
    #[case(json!(48), json!("48"), Ordering::Equal)]
    #[case(json!(10), json!(9), Ordering::Less)] // compared as "10" and "9"
    #[case(json!(true), json!("true"), Ordering::Equal)]
    fn test_term_compare(#[case] a: Value, #[case] b: Value, #[case] expected: Ordering) {
        assert_eq!(term_compare(Some(&a), Some(&b)), Some(expected));
    }

    #[rstest]
    #[case(None, Some(json!("A")))]
    #[case(Some(json!("A")), None)]
    #[case(Some(json!(null)), Some(json!("A")))]
    #[case(Some(json!("A")), Some(json!(null)))]
    fn test_missing_terms_are_not_found(#[case] a: Option<Value>, #[case] b: Option<Value>) {
        assert_eq!(term_compare(a.as_ref(), b.as_ref()), None);
    }
}
