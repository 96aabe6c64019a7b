use jsonpath_plus::find;
use serde_json::{json, Value};

fn store() -> Value {
    json!({
        "store": {
            "book": [
                {"author": "Nigel Rees", "title": "Sayings of the Century", "price": 8.95},
                {"author": "Evelyn Waugh", "title": "Sword of Honour", "price": 12.99},
                {"author": "Herman Melville", "title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99},
                {"author": "J. R. R. Tolkien", "title": "The Lord of the Rings", "isbn": "0-395-19395-8", "price": 22.99}
            ],
            "bicycle": {"color": "red", "price": 19.95}
        },
        "limit": 10
    })
}

fn values(expr: &str, data: &Value) -> Vec<Value> {
    find(expr, data)
        .unwrap()
        .iter()
        .map(|node| node.value.clone().into_owned())
        .collect()
}

fn paths(expr: &str, data: &Value) -> Vec<String> {
    find(expr, data)
        .unwrap()
        .iter()
        .map(|node| node.path())
        .collect()
}

mod predicates {
    use super::*;

    #[test]
    fn existence() {
        let data = store();
        assert_eq!(
            paths("$.store.book[?(@.isbn)]", &data),
            vec!["$.store.book[2]", "$.store.book[3]"]
        );
    }

    #[test]
    fn comparison_with_literal() {
        let data = store();
        assert_eq!(
            values("$.store.book[?(@.price < 10)].title", &data),
            vec![json!("Sayings of the Century"), json!("Moby Dick")]
        );
    }

    #[test]
    fn comparison_with_root() {
        let data = store();
        assert_eq!(
            paths("$.store.book[?(@.price > $.limit)]", &data),
            vec!["$.store.book[1]", "$.store.book[3]"]
        );
    }

    #[test]
    fn logical_operators() {
        let data = store();
        assert_eq!(
            paths("$.store.book[?(@.isbn && @.price < 10)]", &data),
            vec!["$.store.book[2]"]
        );
        assert_eq!(
            paths("$.store.book[?(@.price < 9 || @.price > 20)]", &data),
            vec!["$.store.book[0]", "$.store.book[2]", "$.store.book[3]"]
        );
        assert_eq!(
            paths("$.store.book[?(!@.isbn)]", &data),
            vec!["$.store.book[0]", "$.store.book[1]"]
        );
        assert_eq!(
            paths("$.store.book[?(!(@.isbn || @.price > 10))]", &data),
            vec!["$.store.book[0]"]
        );
    }

    #[test]
    fn current_value_truthiness() {
        let data = json!({"a": [0, 1, "", "x", null, false, true, [], {}]});
        assert_eq!(
            values("$.a[?(@)]", &data),
            vec![json!(1), json!("x"), json!(true), json!([]), json!({})]
        );
        assert_eq!(values("$.a[?()]", &data), values("$.a[?(@)]", &data));
    }

    #[test]
    fn member_existence_truthiness() {
        let data = json!({"a": [
            {"v": 0},
            {"v": ""},
            {"v": []},
            {"v": {}},
            {"v": null},
            {"v": false},
            {"v": "x"},
            {}
        ]});
        assert_eq!(paths("$.a[?(@.v)]", &data), vec!["$.a[0]", "$.a[6]"]);
    }

    #[test]
    fn loose_and_strict_equality() {
        let data = json!({"v": [1, "1", true, "a", null, 1.0]});
        assert_eq!(
            values("$.v[?(@ == 1)]", &data),
            vec![json!(1), json!("1"), json!(true), json!(1.0)]
        );
        assert_eq!(values("$.v[?(@ === 1)]", &data), vec![json!(1), json!(1.0)]);
        assert_eq!(values("$.v[?(@ == null)]", &data), vec![json!(null)]);
        assert_eq!(
            values("$.v[?(@ !== 1)]", &data),
            vec![json!("1"), json!(true), json!("a"), json!(null)]
        );
    }

    #[test]
    fn missing_operand() {
        let data = json!({"items": [{"color": "red"}, {"color": "blue"}, {}]});
        assert_eq!(
            paths("$.items[?(@.color != 'red')]", &data),
            vec!["$.items[1]", "$.items[2]"]
        );
        assert_eq!(
            paths("$.items[?(@.color !== 'red')]", &data),
            vec!["$.items[1]", "$.items[2]"]
        );
        assert!(paths("$.items[?(@.size < 3)]", &data).is_empty());
        assert!(paths("$.items[?(@.size == null)]", &data).is_empty());
    }

    #[test]
    fn two_missing_operands_are_equal() {
        let data = json!([{"x": 1}, {"a": 2}]);
        assert_eq!(values("$[?(@.a == @.b)]", &data), vec![json!({"x": 1})]);
        assert_eq!(values("$[?(@.a !== @.b)]", &data), vec![json!({"a": 2})]);
    }

    #[test]
    fn relational_coercion() {
        let data = json!({"v": [1, "2", "b", 3, "10"]});
        assert_eq!(values("$.v[?(@ > 1)]", &data), vec![json!("2"), json!(3), json!("10")]);
        assert_eq!(values("$.v[?(@ >= 'b')]", &data), vec![json!("b")]);
        assert_eq!(values("$.v[?(@ < '2')]", &data), vec![json!(1), json!("10")]);
    }

    #[test]
    fn multi_valued_operands() {
        let data = json!({"groups": [
            {"tags": []},
            {"tags": ["x"]},
            {"tags": ["x", "y"]}
        ]});
        assert_eq!(paths("$.groups[?(@.tags[*] == 'y')]", &data), vec!["$.groups[2]"]);
        assert_eq!(
            paths("$.groups[?(@.tags[*] != 'x')]", &data),
            vec!["$.groups[0]", "$.groups[2]"]
        );
        assert_eq!(
            paths("$.groups[?(@.tags.* === 'x')]", &data),
            vec!["$.groups[1]", "$.groups[2]"]
        );
    }

    #[test]
    fn nested_filter() {
        let data = json!({"orders": [
            {"id": 1, "items": [{"qty": 1}, {"qty": 1}]},
            {"id": 2, "items": [{"qty": 1}, {"qty": 4}]},
            {"id": 3, "items": []}
        ]});
        assert_eq!(
            values("$.orders[?(@.items[?(@.qty > 1)])].id", &data),
            vec![json!(2)]
        );
    }

    #[test]
    fn filter_on_object_tests_the_object() {
        let data = store();
        assert_eq!(
            paths("$.store.bicycle[?(@.color === 'red')]", &data),
            vec!["$.store.bicycle"]
        );
        assert!(paths("$.store.bicycle[?(@.color === 'blue')]", &data).is_empty());
    }

    #[test]
    fn filter_after_wildcard_tests_each_node() {
        let data = json!({"a": {"x": {"n": 1}, "y": {"n": 2}, "z": [{"n": 3}]}});
        assert_eq!(paths("$.a.*[?(@.n)]", &data), vec!["$.a.x", "$.a.y"]);
    }
}

mod context {
    use super::*;

    #[test]
    fn property_of_member() {
        let data = store();
        assert_eq!(
            values("$.store.bicycle.*[?(@property === 'color')]", &data),
            vec![json!("red")]
        );
    }

    #[test]
    fn property_of_element() {
        let data = store();
        assert_eq!(
            paths("$.store.book[?(@property === 1)]", &data),
            vec!["$.store.book[1]"]
        );
        assert_eq!(
            paths("$.store.book[?(@property === '1')]", &data),
            vec!["$.store.book[1]"]
        );
        assert_eq!(
            paths("$.store.book[?(@property > 1)]", &data),
            vec!["$.store.book[2]", "$.store.book[3]"]
        );
    }

    #[test]
    fn property_truthiness() {
        let data = json!({"a": ["x", "y", "z"]});
        assert_eq!(values("$.a[?(@property)]", &data), vec![json!("y"), json!("z")]);
    }

    #[test]
    fn parent_property() {
        let data = store();
        assert_eq!(
            paths("$.store.book[?(@parentProperty === 'book')]", &data).len(),
            4
        );
        assert!(paths("$.store.book[?(@parentProperty !== 'book')]", &data).is_empty());
    }

    #[test]
    fn parent() {
        let data = store();
        assert_eq!(
            paths("$.store.book[?(@parent.bicycle.color === 'red')]", &data).len(),
            4
        );

        let data = json!({"teams": [
            {"manager": "ann", "members": [{"name": "ann"}, {"name": "bob"}]},
            {"manager": "cat", "members": [{"name": "dan"}]}
        ]});
        assert_eq!(
            paths("$.teams[*].members[?(@.name === @parent.manager)]", &data),
            vec!["$.teams[0].members[0]"]
        );
    }

    #[test]
    fn path() {
        let data = store();
        assert_eq!(
            paths("$.store.book[?(@path === \"$['store']['book'][0]\")]", &data),
            vec!["$.store.book[0]"]
        );
    }

    #[test]
    fn property_in_recursive_descent() {
        let data = json!({"a": {"id": 1, "b": {"id": 2}}, "id": 3});
        assert_eq!(
            paths("$..*[?(@property === 'id')]", &data),
            vec!["$.a.id", "$.a.b.id", "$.id"]
        );
    }
}

mod methods {
    use super::*;

    fn people() -> Value {
        json!({"people": [
            {"name": "Anne", "tags": ["admin", "ops"], "score": 2.5},
            {"name": "bob", "tags": ["ops"], "score": 3.4},
            {"name": "Joanna", "tags": [], "score": -1.5},
            {"name": 42, "tags": ["admin"], "score": "n/a"}
        ]})
    }

    fn names(expr: &str) -> Vec<Value> {
        values(&format!("$.people[?({})].name", expr), &people())
    }

    #[test]
    fn contains_and_includes() {
        assert_eq!(names("@.name.contains('nn')"), vec![json!("Anne"), json!("Joanna")]);
        assert_eq!(names("@.tags.includes('admin')"), vec![json!("Anne"), json!(42)]);
        assert_eq!(names("@.name.contains(2)"), vec![json!(42)]);
    }

    #[test]
    fn starts_and_ends_with() {
        assert_eq!(names("@.name.startsWith('A')"), vec![json!("Anne")]);
        assert_eq!(names("@.name.endsWith('a')"), vec![json!("Joanna")]);
    }

    #[test]
    fn case_conversion_chains() {
        assert_eq!(
            names("@.name.toLowerCase().startsWith('b')"),
            vec![json!("bob")]
        );
        assert_eq!(
            names("@.name.toUpperCase() === 'ANNE'"),
            vec![json!("Anne")]
        );
        assert!(names("@.name.toLowerCase() === '42'").is_empty());
    }

    #[test]
    fn match_regex_literal() {
        assert_eq!(names("@.name.match(/^j/i)"), vec![json!("Joanna")]);
        assert_eq!(names("@.name.match(/^j/)"), Vec::<Value>::new());
        assert_eq!(names("@.name.test(/o/)"), vec![json!("bob"), json!("Joanna")]);
    }

    #[test]
    fn regex_literal_with_closing_bracket() {
        let data = json!([{"a": "x]"}, {"a": "y"}, {"a": "[/]"}]);
        assert_eq!(
            values(r"$[?(@.a.match(/\]/))]", &data),
            vec![json!({"a": "x]"}), json!({"a": "[/]"})]
        );
        assert_eq!(
            values("$[?(@.a.match(/[/]/))].a", &data),
            vec![json!("[/]")]
        );
    }

    #[test]
    fn match_string_pattern() {
        assert_eq!(names("@.name.match('^[A-Z]')"), vec![json!("Anne"), json!("Joanna")]);
        assert!(names("@.name.match('(')").is_empty());
    }

    #[test]
    fn type_of() {
        assert_eq!(names("@.name.typeof() === 'number'"), vec![json!(42)]);
        assert_eq!(names("@.tags.typeof() === 'object'").len(), 4);
    }

    #[test]
    fn rounding() {
        assert_eq!(names("@.score.floor() === 2"), vec![json!("Anne")]);
        assert_eq!(names("@.score.round() === 3"), vec![json!("Anne"), json!("bob")]);
        assert_eq!(names("@.score.ceil() === -1"), vec![json!("Joanna")]);
        assert_eq!(names("@.score.round() === -1"), vec![json!("Joanna")]);
    }

    #[test]
    fn length() {
        let data = json!({"words": ["ab", "abcd", "héllo", ["a"], {"length": 9}, 7]});
        assert_eq!(
            values("$.words[?(@.length > 3)]", &data),
            vec![json!("abcd"), json!("héllo"), json!({"length": 9})]
        );
        assert_eq!(names("@.tags.length === 0"), vec![json!("Joanna")]);
    }

    #[test]
    fn unknown_method_is_no_match() {
        assert!(names("@.name.nosuchmethod()").is_empty());
        assert_eq!(names("!@.name.nosuchmethod()").len(), 4);
    }

    #[test]
    fn missing_argument_is_no_match() {
        assert!(names("@.name.startsWith()").is_empty());
    }
}
