use jsonpath_plus::{find, Parser, Query};
use serde_json::json;

mod errors {
    use super::*;

    #[test]
    #[should_panic(expected = "syntax error: unmatched bracket (3)")]
    fn unmatched_bracket() {
        Query::new("$.x[").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '$', found 'a'")]
    fn missing_root() {
        Query::new("a.b").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '$', found end of path")]
    fn empty_path() {
        Query::new("   ").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty bracket content (2)")]
    fn empty_brackets() {
        Query::new("$[]").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty bracket content")]
    fn blank_brackets() {
        Query::new("$.a[  ]").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty property name (2)")]
    fn trailing_dot() {
        Query::new("$.").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty property name")]
    fn double_dot_before_bracket_name() {
        Query::new("$.a.[0]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected character 'x' (1)")]
    fn unexpected_character() {
        Query::new("$x").unwrap();
    }

    #[test]
    #[should_panic(expected = "too many colons in slice '1:2:3:4'")]
    fn too_many_colons() {
        Query::new("$[1:2:3:4]").unwrap();
    }

    #[test]
    #[should_panic(expected = "invalid slice bound 'a'")]
    fn bad_slice_bound() {
        Query::new("$[1:a]").unwrap();
    }

    #[test]
    #[should_panic(expected = "index out of range '99999999999999999999'")]
    fn index_too_big() {
        Query::new("$[99999999999999999999]").unwrap();
    }

    #[test]
    #[should_panic(expected = "invalid \\uXXXX escape")]
    fn bad_unicode_escape() {
        Query::new("$['\\u12']").unwrap();
    }

    #[test]
    #[should_panic(expected = "unbalanced parentheses")]
    fn unbalanced_parens() {
        Parser::new().parse_filter("(@.a == 1").unwrap();
    }

    #[test]
    #[should_panic(expected = "unknown context variable '@foo'")]
    fn unknown_context_variable() {
        Parser::new().parse_filter("@foo == 1").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '==', found '='")]
    fn assignment_is_not_comparison() {
        Parser::new().parse_filter("@.a = 1").unwrap();
    }

    #[test]
    #[should_panic(expected = "type error: cannot read property 'length' of null")]
    fn length_of_null() {
        let data = json!({"a": null});
        find("$.a[?(@.length>0)]", &data).unwrap();
    }

    #[test]
    #[should_panic(expected = "type error: cannot read property 'length' of null")]
    fn length_of_null_member() {
        let data = json!({"items": [{"name": "a"}, {"name": null}]});
        find("$.items[?(@.name.length > 0)]", &data).unwrap();
    }

    #[test]
    fn malformed_predicate_never_matches() {
        let data = json!({"a": [1, 2, 3]});
        let nodes = find("$.a[?(@ === )]", &data).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn syntax_errors_have_a_kind() {
        let err = Query::new("$[").unwrap_err();
        assert!(err.is_syntax_error());
    }
}
