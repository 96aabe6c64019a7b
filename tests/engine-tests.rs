use std::cell::Cell;

use jsonpath_plus::{Config, Environment, JSONPathEngine, JSONPathErrorType, Query};
use serde_json::json;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine(config: Config) -> JSONPathEngine {
    init_logger();
    JSONPathEngine::new(config).unwrap()
}

#[test]
fn query_text() {
    let engine = engine(Config::default());
    let matches = engine
        .query("$.a[*]", r#"{"a": [1, 2, 3]}"#)
        .unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[1].path, "$.a[1]");
    assert_eq!(matches[1].value, json!(2));
    assert_eq!(matches[1].index, 1);
    assert_eq!(matches[1].original_index, 1);
    assert!(matches.iter().all(|m| m.position.is_some()));
}

#[test]
fn query_value_has_no_positions() {
    let engine = engine(Config::default());
    let data = json!({"a": {"b": true}});
    let matches = engine.query_value("$.a.b", &data).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].parent_property, Some(json!("b")));
    assert_eq!(matches[0].position, None);
}

#[test]
fn invalid_json() {
    let engine = engine(Config::default());
    let err = engine.query("$.a", "{\"a\": ").unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::JSONError);
}

#[test]
fn invalid_config() {
    let config = Config {
        max_result_count: 0,
        ..Config::default()
    };
    let err = JSONPathEngine::new(config).err().unwrap();
    assert_eq!(err.kind, JSONPathErrorType::ConfigError);
    assert_eq!(
        err.to_string(),
        "invalid config: max_result_count must be greater than 0"
    );
}

#[test]
fn config_presets() {
    let config = Config::default();
    assert_eq!(config.max_path_length, 1000);
    assert_eq!(config.max_recursion_depth, 100);
    assert_eq!(config.max_result_count, 10_000);
    assert_eq!(config.timeout_ms, 30_000);
    assert_eq!(config.cache_size, 100);

    let config = Config::production();
    assert_eq!(config.max_path_length, 500);
    assert_eq!(config.max_recursion_depth, 50);
    assert_eq!(config.max_result_count, 1000);
    assert_eq!(config.timeout_ms, 5000);
    assert_eq!(config.cache_size, 100);
}

#[test]
fn config_from_json() {
    let config = Config::from_json(r#"{"timeout_ms": 250, "cache_size": 0}"#).unwrap();
    assert_eq!(config.timeout_ms, 250);
    assert_eq!(config.cache_size, 0);
    assert_eq!(config.max_path_length, 1000);

    let err = Config::from_json(r#"{"timeout_ms": 0}"#).unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::ConfigError);

    let err = Config::from_json(r#"{"timeout_ms": "soon"}"#).unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::ConfigError);
}

#[test]
fn path_too_long() {
    let engine = engine(Config {
        max_path_length: 5,
        ..Config::default()
    });
    let err = engine.query_value("$.abcdef", &json!({})).unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::LimitError);
    assert!(engine.query_value("$.abc", &json!({})).is_ok());
}

#[test]
fn results_are_truncated() {
    let engine = engine(Config {
        max_result_count: 2,
        ..Config::default()
    });
    let matches = engine
        .query_value("$[*]", &json!([1, 2, 3, 4, 5]))
        .unwrap();
    assert_eq!(
        matches.iter().map(|m| m.value.clone()).collect::<Vec<_>>(),
        vec![json!(1), json!(2)]
    );
}

#[test]
fn recursion_limit() {
    let engine = engine(Config {
        max_recursion_depth: 3,
        ..Config::default()
    });
    let data = json!({"a": {"b": {"c": {"d": {"e": 1}}}}});

    let err = engine.query_value("$..*", &data).unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::LimitError);
    assert!(err.to_string().contains("maximum recursion depth of 3 exceeded"));

    let shallow = json!({"a": {"b": 1}});
    assert_eq!(engine.query_value("$..*", &shallow).unwrap().len(), 2);
}

#[test]
fn nested_filters_count_towards_the_limit() {
    let env = Environment::new().with_max_recursion_depth(1);
    let data = json!({"a": [{"b": [{"c": [1]}]}]});

    let query = Query::new("$.a[?(@.b[?(@.c)])]").unwrap();
    assert_eq!(query.find(&data, &env).unwrap().len(), 1);

    let query = Query::new("$.a[?(@.b[?(@.c[?(@ == 1)])])]").unwrap();
    let err = query.find(&data, &env).unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::LimitError);
}

#[test]
fn cache_stats() {
    let engine = engine(Config::default());
    let data = json!({"a": 1});

    engine.query_value("$.a", &data).unwrap();
    engine.query_value("$.a", &data).unwrap();
    engine.query_value("$.b", &data).unwrap();

    let stats = engine.cache_stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);

    engine.clear_cache();
    assert_eq!(engine.cache_stats().size, 0);
}

#[test]
fn compile_errors_propagate() {
    let engine = engine(Config::default());
    let err = engine.query_value("$.a[", &json!({})).unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::SyntaxError);
    assert_eq!(engine.cache_stats().size, 0);
}

#[test]
fn checkpoint_cancels_evaluation() {
    let env = Environment::new();
    let data = json!({"a": {"b": {"c": 1}}});
    let query = Query::new("$.a.b.c").unwrap();

    let err = query
        .find_with_checkpoint(&data, &env, || false)
        .unwrap_err();
    assert_eq!(err.kind, JSONPathErrorType::Cancelled);

    let polls = Cell::new(0);
    let nodes = query
        .find_with_checkpoint(&data, &env, || {
            polls.set(polls.get() + 1);
            polls.get() < 3
        })
        .unwrap_err();
    assert_eq!(nodes.kind, JSONPathErrorType::Cancelled);
    assert_eq!(polls.get(), 3);

    let polls = Cell::new(0);
    let nodes = query
        .find_with_checkpoint(&data, &env, || {
            polls.set(polls.get() + 1);
            true
        })
        .unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(polls.get(), 3);
}

#[test]
fn matches_serialize() {
    let engine = engine(Config::default());
    let matches = engine.query("$.id", r#"{"id":123,"name":"test"}"#).unwrap();
    let line = serde_json::to_value(&matches[0]).unwrap();
    assert_eq!(
        line,
        json!({
            "path": "$.id",
            "value": 123,
            "parent_property": "id",
            "index": 0,
            "original_index": 0,
            "position": {"start": 1, "end": 5, "length": 4}
        })
    );
}
