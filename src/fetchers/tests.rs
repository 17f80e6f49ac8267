use super::*;
use crate::convert::{ConversionService, Erased, TypeDescriptor};
use crate::error::{FetchError, ValueSource};
use crate::router::PathPattern;
use crate::router::{Specificity, UrlMatch};
use crate::server::{RequestScope, ServletRequest};
use std::collections::HashMap;
use std::sync::Arc;

fn resolve(fetcher: &dyn ArgumentFetcher, req: &ServletRequest) -> Result<Erased, FetchError> {
    let scope = RequestScope::new();
    let conversion = ConversionService::new();
    let ctx = FetchContext::new(req, None, &scope, &conversion);
    fetcher.resolve(&ctx)
}

fn take<T: 'static>(value: Result<Erased, FetchError>) -> T {
    *value.unwrap().downcast::<T>().unwrap()
}

#[test]
fn test_single_value_converts_scalar() {
    let f = RequestParamFetcher::new("page", TypeDescriptor::of::<u32>(), None);
    let req = ServletRequest::get("/list?page=3");
    assert_eq!(take::<u32>(resolve(&f, &req)), 3);
}

#[test]
fn test_default_equals_explicit_value() {
    let f = RequestParamFetcher::new("page", TypeDescriptor::of::<u32>(), Some("1".into()));
    let explicit = take::<u32>(resolve(&f, &ServletRequest::get("/list?page=1")));
    let defaulted = take::<u32>(resolve(&f, &ServletRequest::get("/list")));
    assert_eq!(explicit, defaulted);
}

#[test]
fn test_missing_parameter_without_default() {
    let f = RequestParamFetcher::new("q", TypeDescriptor::of::<String>(), None);
    let err = resolve(&f, &ServletRequest::get("/search")).unwrap_err();
    assert_eq!(err, FetchError::missing("q", ValueSource::RequestParameters));
    assert!(err.is_client_error());
}

#[test]
fn test_repeated_values_into_scalar_is_conversion_error() {
    let f = RequestParamFetcher::new("a", TypeDescriptor::of::<i32>(), None);
    let err = resolve(&f, &ServletRequest::get("/x?a=1&a=2")).unwrap_err();
    assert!(matches!(err, FetchError::Conversion(ref c) if c.raw == "1,2"));
}

#[test]
fn test_collection_from_repeated_values() {
    let f = RequestParamFetcher::new("a", TypeDescriptor::list_of::<i32>(), None);
    let req = ServletRequest::get("/x?a=1&a=2&a=3");
    assert_eq!(take::<Vec<i32>>(resolve(&f, &req)), vec![1, 2, 3]);
}

#[test]
fn test_collection_from_comma_delimited_value() {
    let f = RequestParamFetcher::new("a", TypeDescriptor::list_of::<i32>(), None);
    let req = ServletRequest::get("/x?a=4,5,,6");
    assert_eq!(take::<Vec<i32>>(resolve(&f, &req)), vec![4, 5, 6]);
}

#[test]
fn test_collection_default_and_missing() {
    let f = RequestParamFetcher::new("a", TypeDescriptor::list_of::<String>(), Some("x,y".into()));
    assert_eq!(
        take::<Vec<String>>(resolve(&f, &ServletRequest::get("/x"))),
        vec!["x".to_string(), "y".to_string()]
    );
    let f = RequestParamFetcher::new("a", TypeDescriptor::list_of::<String>(), None);
    assert!(matches!(
        resolve(&f, &ServletRequest::get("/x")),
        Err(FetchError::MissingParameter { .. })
    ));
}

#[test]
fn test_map_from_pairs_and_brackets() {
    let f = RequestParamFetcher::new("m", TypeDescriptor::map_of::<u8>(), None);
    let req = ServletRequest::get("/x?m=a=1,b=2&m%5Bc%5D=3");
    let map = take::<HashMap<String, u8>>(resolve(&f, &req));
    assert_eq!(map.len(), 3);
    assert_eq!(map["a"], 1);
    assert_eq!(map["c"], 3);
}

#[test]
fn test_map_missing() {
    let f = RequestParamFetcher::new("m", TypeDescriptor::map_of::<u8>(), None);
    let err = resolve(&f, &ServletRequest::get("/x?other=1")).unwrap_err();
    assert_eq!(err, FetchError::missing("m", ValueSource::RequestParameters));
}

#[test]
fn test_path_variable_from_match() {
    let pattern = PathPattern::compile("/user/{id}").unwrap();
    let url = UrlMatch {
        path_variables: pattern.captures("/user/42").unwrap(),
        specificity: Specificity {
            literal_len: pattern.literal_len(),
            captures: 1,
            registry: 0,
            order: 0,
        },
    };
    let req = ServletRequest::get("/user/42");
    let scope = RequestScope::new();
    let conversion = ConversionService::new();
    let ctx = FetchContext::new(&req, Some(&url), &scope, &conversion);

    let f = PathVariableFetcher::new("id", TypeDescriptor::of::<u64>());
    assert_eq!(f.path_variable(), Some("id"));
    assert_eq!(take::<u64>(f.resolve(&ctx)), 42);

    let bad = PathVariableFetcher::new("id", TypeDescriptor::of::<bool>());
    assert!(matches!(bad.resolve(&ctx), Err(FetchError::Conversion(_))));
}

#[test]
fn test_path_variable_absent_is_internal() {
    let f = PathVariableFetcher::new("id", TypeDescriptor::of::<u64>());
    let err = resolve(&f, &ServletRequest::get("/user/42")).unwrap_err();
    assert!(matches!(err, FetchError::Internal(_)));
    assert!(!err.is_client_error());
}

#[test]
fn test_request_attribute_same_type_is_cloned() {
    let f = RequestAttributeFetcher::new("user_id", TypeDescriptor::of::<u64>(), None);
    let req = ServletRequest::get("/").with_attribute("user_id", 9u64);
    assert_eq!(take::<u64>(resolve(&f, &req)), 9);
}

#[test]
fn test_request_attribute_string_is_converted() {
    let f = RequestAttributeFetcher::new("limit", TypeDescriptor::of::<u16>(), None);
    let req = ServletRequest::get("/").with_attribute("limit", "25".to_string());
    assert_eq!(take::<u16>(resolve(&f, &req)), 25);
}

#[test]
fn test_request_attribute_default_and_missing() {
    let f = RequestAttributeFetcher::new("lang", TypeDescriptor::of::<String>(), Some("en".into()));
    assert_eq!(take::<String>(resolve(&f, &ServletRequest::get("/"))), "en");

    let f = RequestAttributeFetcher::new("lang", TypeDescriptor::of::<String>(), None);
    assert_eq!(
        resolve(&f, &ServletRequest::get("/")).unwrap_err(),
        FetchError::missing("lang", ValueSource::RequestAttributes)
    );
}

#[test]
fn test_request_attribute_of_other_type() {
    let f = RequestAttributeFetcher::new("n", TypeDescriptor::of::<u64>(), None);
    let req = ServletRequest::get("/").with_attribute("n", vec![1u8]);
    assert!(matches!(resolve(&f, &req), Err(FetchError::Conversion(_))));
}

#[derive(Debug)]
struct Session {
    user: &'static str,
}

#[test]
fn test_injected_from_scope() {
    let req = ServletRequest::get("/");
    let scope = RequestScope::new();
    let conversion = ConversionService::new();
    let f = InjectedFetcher::<Session>::new();

    let ctx = FetchContext::new(&req, None, &scope, &conversion);
    assert!(matches!(
        f.resolve(&ctx),
        Err(FetchError::MissingParameter { source: ValueSource::RequestScope, .. })
    ));

    scope.store(Session { user: "ada" });
    let value = take::<Arc<Session>>(f.resolve(&ctx));
    assert_eq!(value.user, "ada");
}
