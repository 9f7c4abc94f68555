// Copyright 2025 Neil Henderson, Blue Tarp Media.

use super::super::types::{self, Type};

#[test]
fn assignability() {
    assert!(types::are_assignable(&Type::Integer, &Type::Integer));
    assert!(types::are_assignable(&Type::Str, &Type::Str));

    // Widening: integer to float, never the reverse.
    assert!(types::are_assignable(&Type::Integer, &Type::Float));
    assert!(!types::are_assignable(&Type::Float, &Type::Integer));

    // Null is assignable to reference types only.
    assert!(types::are_assignable(&Type::Null, &Type::Class("P".to_string())));
    assert!(types::are_assignable(&Type::Null, &Type::array_of(Type::Integer)));
    assert!(!types::are_assignable(&Type::Null, &Type::Integer));

    assert!(!types::are_assignable(&Type::Str, &Type::Integer));
    assert!(!types::are_assignable(&Type::Boolean, &Type::Integer));

    // Distinct array element types are distinct types.
    assert!(!types::are_assignable(&Type::array_of(Type::Integer), &Type::array_of(Type::Float)));
}

#[test]
fn error_type_is_silently_compatible() {
    assert!(types::are_assignable(&Type::Error, &Type::Integer));
    assert!(types::are_assignable(&Type::Str, &Type::Error));
    assert_eq!(types::promote(&Type::Error, &Type::Integer), Some(Type::Error));
}

#[test]
fn numeric_promotion() {
    assert_eq!(types::promote(&Type::Integer, &Type::Integer), Some(Type::Integer));
    assert_eq!(types::promote(&Type::Integer, &Type::Float), Some(Type::Float));
    assert_eq!(types::promote(&Type::Float, &Type::Integer), Some(Type::Float));
    assert_eq!(types::promote(&Type::Float, &Type::Float), Some(Type::Float));

    assert_eq!(types::promote(&Type::Integer, &Type::Boolean), None);
    assert_eq!(types::promote(&Type::Str, &Type::Str), None);
}

#[test]
fn common_type_for_ternary_branches() {
    assert_eq!(types::common_type(&Type::Integer, &Type::Float), Some(Type::Float));
    assert_eq!(types::common_type(&Type::Null, &Type::Class("P".to_string())), Some(Type::Class("P".to_string())));
    assert_eq!(types::common_type(&Type::Str, &Type::Integer), None);
}

#[test]
fn defaults_and_sizes() {
    assert_eq!(Type::Integer.default_value_token(), "0");
    assert_eq!(Type::Float.default_value_token(), "0.0");
    assert_eq!(Type::Boolean.default_value_token(), "false");
    assert_eq!(Type::Str.default_value_token(), "\"\"");
    assert_eq!(Type::Class("P".to_string()).default_value_token(), "null");

    // Scalars and references are all one word.
    assert_eq!(Type::Integer.size_in_words(), 1);
    assert_eq!(Type::array_of(Type::Float).size_in_words(), 1);
}

#[test]
fn display_forms() {
    assert_eq!(Type::array_of(Type::Integer).to_string(), "integer[]");
    assert_eq!(Type::Class("Point".to_string()).to_string(), "Point");
    assert_eq!(
        Type::Function { params: vec![Type::Integer, Type::Float], ret: Box::new(Type::Void) }.to_string(),
        "function(integer, float) -> void"
    );
}
