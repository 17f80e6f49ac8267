use super::{pick_best, PathPattern, Specificity, UrlMatch};
use crate::error::RoutingConstructionError;

fn url_match(literal_len: usize, captures: usize, order: usize) -> UrlMatch {
    ranked(literal_len, captures, 0, order)
}

fn ranked(literal_len: usize, captures: usize, registry: usize, order: usize) -> UrlMatch {
    UrlMatch {
        path_variables: Default::default(),
        specificity: Specificity {
            literal_len,
            captures,
            registry,
            order,
        },
    }
}

#[test]
fn test_root_path() {
    let p = PathPattern::compile("/").unwrap();
    assert!(p.captures("/").is_some());
    assert!(p.captures("/x").is_none());
    assert_eq!(p.capture_count(), 0);
}

#[test]
fn test_parameterized_path() {
    let p = PathPattern::compile("/items/{id}").unwrap();
    let caps = p.captures("/items/123").unwrap();
    assert_eq!(caps.len(), 1);
    assert_eq!(caps[0].0.as_ref(), "id");
    assert_eq!(caps[0].1, "123");
    // default variable regex stays inside one segment
    assert!(p.captures("/items/1/2").is_none());
}

#[test]
fn test_whole_path_must_match() {
    let p = PathPattern::compile("/users").unwrap();
    assert!(p.captures("/users/42").is_none());
    assert!(p.captures("/api/users").is_none());
}

#[test]
fn test_custom_variable_regex() {
    let p = PathPattern::compile("/files/{name:.+}").unwrap();
    let caps = p.captures("/files/a/b.txt").unwrap();
    assert_eq!(caps[0].1, "a/b.txt");

    let p = PathPattern::compile("/v{major:[0-9]{1,2}}/x").unwrap();
    assert_eq!(p.captures("/v12/x").unwrap()[0].1, "12");
    assert!(p.captures("/v123/x").is_none());
}

#[test]
fn test_braces_inside_character_class() {
    let p = PathPattern::compile("/tag/{id:[^}]+}").unwrap();
    assert_eq!(p.capture_count(), 1);
    assert_eq!(p.captures("/tag/a{b").unwrap()[0].1, "a{b");
    assert!(p.captures("/tag/a}b").is_none());

    let p = PathPattern::compile(r"/lit/{v:a\}b}/x").unwrap();
    assert_eq!(p.captures("/lit/a}b/x").unwrap()[0].1, "a}b");
    assert_eq!(p.literal_len(), "/lit//x".len());
}

#[test]
fn test_literals_are_escaped() {
    let p = PathPattern::compile("/a.b").unwrap();
    assert!(p.captures("/a.b").is_some());
    assert!(p.captures("/axb").is_none());
}

#[test]
fn test_literal_len_and_captures() {
    let p = PathPattern::compile("/users/{id}/posts/{post}").unwrap();
    assert_eq!(p.literal_len(), "/users//posts/".len());
    assert_eq!(p.capture_count(), 2);
    assert!(p.has_variable("post"));
    assert!(!p.has_variable("user"));
    assert_eq!(p.variables().collect::<Vec<_>>(), vec!["id", "post"]);
}

#[test]
fn test_malformed_patterns() {
    for bad in ["/users/{id", "/users/id}", "/users/{}", "/a/{x}/{x}", "/a/{x:(}"] {
        let err = PathPattern::compile(bad).unwrap_err();
        assert!(
            matches!(err, RoutingConstructionError::InvalidPattern { .. }),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn test_longer_literal_wins() {
    let literal = url_match(10, 0, 5);
    let generic = url_match(7, 1, 0);
    let best = pick_best(Some(generic.clone()), Some(literal.clone())).unwrap();
    assert_eq!(best, literal);
}

#[test]
fn test_fewer_captures_win_on_equal_literal() {
    let one = url_match(5, 1, 9);
    let two = url_match(5, 2, 0);
    assert_eq!(pick_best(Some(two), Some(one.clone())).unwrap(), one);
}

#[test]
fn test_first_registered_wins_on_full_tie() {
    let first = url_match(5, 1, 1);
    let second = url_match(5, 1, 2);
    assert_eq!(pick_best(Some(second.clone()), Some(first.clone())).unwrap(), first);
    assert_eq!(pick_best(Some(first.clone()), Some(second)).unwrap(), first);
}

#[test]
fn test_earlier_registry_wins_before_method_order() {
    let first_registry = ranked(5, 1, 0, 7);
    let second_registry = ranked(5, 1, 1, 0);
    assert_eq!(
        pick_best(Some(second_registry.clone()), Some(first_registry.clone())).unwrap(),
        first_registry
    );
    assert_eq!(
        pick_best(Some(first_registry.clone()), Some(second_registry)).unwrap(),
        first_registry
    );
}

#[test]
fn test_pick_best_is_order_independent() {
    let candidates = vec![
        Some(url_match(3, 0, 4)),
        None,
        Some(url_match(8, 2, 1)),
        Some(url_match(8, 1, 3)),
        Some(url_match(8, 1, 2)),
    ];
    let forward = candidates.iter().cloned().fold(None, pick_best);
    let backward = candidates.iter().rev().cloned().fold(None, pick_best);
    assert_eq!(forward, backward);
    assert_eq!(forward.unwrap().specificity.order, 2);

    // associativity: grouping does not change the winner
    let a = candidates[0].clone();
    let b = candidates[2].clone();
    let c = candidates[3].clone();
    let left = pick_best(pick_best(a.clone(), b.clone()), c.clone());
    let right = pick_best(a, pick_best(b, c));
    assert_eq!(left, right);
}

#[test]
fn test_no_match_loses_to_any_match() {
    let m = url_match(0, 3, 100);
    assert_eq!(pick_best(None, Some(m.clone())), Some(m.clone()));
    assert_eq!(pick_best(Some(m.clone()), None), Some(m));
    assert_eq!(pick_best::<UrlMatch>(None, None), None);
}

#[test]
fn test_path_variable_lookup() {
    let p = PathPattern::compile("/u/{id}/{tab}").unwrap();
    let m = UrlMatch {
        path_variables: p.captures("/u/7/info").unwrap(),
        specificity: url_match(0, 0, 0).specificity,
    };
    assert_eq!(m.path_variable("tab"), Some("info"));
    assert_eq!(m.path_variable("missing"), None);
    assert_eq!(m.path_variables_map().get("id").map(String::as_str), Some("7"));
}
