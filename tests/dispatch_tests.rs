//! End-to-end dispatch tests: prefix map → servlet → registries → fetchers → controller
//! method → render directive / view renderer.
//!
//! # Key Test Cases
//!
//! - `test_no_match_is_404_and_no_fetcher_runs`: arguments are only resolved for the winner
//! - `test_missing_parameter_is_400`: argument failures never reach the method
//! - `test_unknown_verb_is_501`
//! - `test_handled_failure_*` / `test_unhandled_failure_propagates`
//! - `test_best_method_across_registries`: one fold over every registry on a prefix

mod common;

use common::counters::Calls;
use common::http::{dispatch, service};
use http::Method;
use mvc_dispatch::controller::{ControllerRegistry, Factory};
use mvc_dispatch::convert::{Erased, TypeDescriptor};
use mvc_dispatch::error::{FetchError, RenderError, ServeError};
use mvc_dispatch::fetchers::{ArgumentFetcher, FetchContext};
use mvc_dispatch::ids::{RequestId, REQUEST_ID_HEADER};
use mvc_dispatch::invocation::{Arguments, Mapping, ReturnValue};
use mvc_dispatch::mvc::Mvc;
use mvc_dispatch::runtime_config::RuntimeConfig;
use mvc_dispatch::server::{
    DispatchServlet, ExceptionService, Handled, ServletRequest, ServletResponse,
};
use mvc_dispatch::view::{Model, TemplateRenderer, Views};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug)]
struct CountingFetcher {
    calls: Calls,
    target: TypeDescriptor,
}

impl CountingFetcher {
    fn new(calls: &Calls) -> Self {
        Self {
            calls: calls.clone(),
            target: TypeDescriptor::of::<String>(),
        }
    }
}

impl ArgumentFetcher for CountingFetcher {
    fn resolve(&self, _ctx: &FetchContext<'_>) -> Result<Erased, FetchError> {
        self.calls.hit();
        Ok(Box::new(String::from("counted")))
    }

    fn target(&self) -> &TypeDescriptor {
        &self.target
    }
}

#[derive(Debug)]
struct Gone(u64);

impl fmt::Display for Gone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {} is gone", self.0)
    }
}

impl std::error::Error for Gone {}

struct Shop {
    invoked: Calls,
}

impl Shop {
    fn item(&self, id: u64) -> anyhow::Result<String> {
        self.invoked.hit();
        if id == 0 {
            return Err(Gone(id).into());
        }
        Ok(format!("item-{id}"))
    }
}

fn shop(invoked: &Calls, fetched: &Calls) -> Arc<ControllerRegistry> {
    let controller = Arc::new(Shop {
        invoked: invoked.clone(),
    });
    let registry = ControllerRegistry::builder("Shop", controller)
        .handle(
            Mapping::get("item", "/items/{id}")
                .path_var::<u64>("id")
                .fetcher(CountingFetcher::new(fetched))
                .write(),
            |shop: &Shop, args: &mut Arguments<'_>| Ok(Some(shop.item(args.take(0)?)?.into())),
        )
        .handle(
            Mapping::get("search", "/search").param::<String>("q").write(),
            |_: &Shop, args: &mut Arguments<'_>| {
                let q: String = args.take(0)?;
                Ok(Some(format!("results for {q}").into()))
            },
        )
        .handle(
            Mapping::get("sum", "/sum").param_list::<i64>("a").write(),
            |_: &Shop, args: &mut Arguments<'_>| {
                let values: Vec<i64> = args.take(0)?;
                Ok(Some(ReturnValue::Integer(values.iter().sum())))
            },
        )
        .handle(
            Mapping::get("filters", "/filters").param_map::<u32>("f").write(),
            |_: &Shop, args: &mut Arguments<'_>| {
                let filters: HashMap<String, u32> = args.take(0)?;
                let mut keys: Vec<String> = filters.iter().map(|(k, v)| format!("{k}={v}")).collect();
                keys.sort();
                Ok(Some(keys.join("&").into()))
            },
        )
        .build()
        .unwrap();
    Arc::new(registry)
}

fn shop_mvc(invoked: &Calls, fetched: &Calls) -> Mvc {
    Mvc::builder().control("/shop", shop(invoked, fetched)).build()
}

#[test]
fn test_no_match_is_404_and_no_fetcher_runs() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);

    let res = dispatch(&mvc, ServletRequest::get("/shop/nothing/here"));
    assert_eq!(res.status(), 404);

    // path matches, verb does not
    let res = dispatch(&mvc, ServletRequest::post("/shop/items/3"));
    assert_eq!(res.status(), 404);

    // no servlet mounted for this prefix
    let res = dispatch(&mvc, ServletRequest::get("/elsewhere/items/3"));
    assert_eq!(res.status(), 404);

    assert_eq!(fetched.count(), 0);
    assert_eq!(invoked.count(), 0);
}

#[test]
fn test_winner_resolves_arguments_and_writes_value() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);
    let res = dispatch(&mvc, ServletRequest::get("/shop/items/12"));
    assert_eq!(res.status(), 200);
    assert_eq!(res.body_string(), "item-12");
    assert_eq!(fetched.count(), 1);
    assert_eq!(invoked.count(), 1);
}

#[test]
fn test_missing_parameter_is_400() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);
    let res = dispatch(&mvc, ServletRequest::get("/shop/search"));
    assert_eq!(res.status(), 400);
    assert!(res.message().unwrap().contains("'q'"));

    let res = dispatch(&mvc, ServletRequest::get("/shop/search?q=shoes"));
    assert_eq!(res.body_string(), "results for shoes");
}

#[test]
fn test_unconvertible_path_variable_is_400_before_invocation() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);
    let res = dispatch(&mvc, ServletRequest::get("/shop/items/twelve"));
    assert_eq!(res.status(), 400);
    assert!(res.message().unwrap().contains("twelve"));
    assert_eq!(invoked.count(), 0);
    assert_eq!(fetched.count(), 0);
}

#[test]
fn test_repeated_parameter_collects_in_order() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);
    let res = dispatch(&mvc, ServletRequest::get("/shop/sum?a=1&a=2&a=3"));
    assert_eq!(res.body_string(), "6");
    let res = dispatch(&mvc, ServletRequest::get("/shop/sum?a=10,20"));
    assert_eq!(res.body_string(), "30");
}

#[test]
fn test_map_parameter_from_pairs_and_brackets() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);
    let res = dispatch(&mvc, ServletRequest::get("/shop/filters?f=size=4,price=10&f[stock]=1"));
    assert_eq!(res.body_string(), "price=10&size=4&stock=1");
}

#[test]
fn test_unknown_verb_is_501() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);
    let brew = Method::from_bytes(b"BREW").unwrap();
    let res = dispatch(&mvc, ServletRequest::new(brew, "/shop/items/1"));
    assert_eq!(res.status(), 501);
    assert_eq!(invoked.count(), 0);
}

#[test]
fn test_unhandled_failure_propagates() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let mvc = shop_mvc(&invoked, &fetched);
    let mut res = ServletResponse::new();
    let err = mvc
        .dispatch(ServletRequest::get("/shop/items/0"), &mut res)
        .unwrap_err();
    assert!(matches!(err, ServeError::Unhandled(ref e) if e.downcast_ref::<Gone>().is_some()));
    assert_eq!(err.status(), 500);
}

#[test]
fn test_handled_failure_via_exception_service() {
    let (invoked, fetched) = (Calls::default(), Calls::default());
    let exceptions = ExceptionService::new().on::<Gone, _>(|gone, res| {
        res.send_error(410, Some(&gone.to_string()));
    });
    let mvc = Mvc::builder()
        .control("/shop", shop(&invoked, &fetched))
        .exceptions(Arc::new(exceptions))
        .build();
    let res = dispatch(&mvc, ServletRequest::get("/shop/items/0"));
    assert_eq!(res.status(), 410);
    assert_eq!(res.message(), Some("item 0 is gone"));
}

#[test]
fn test_handled_failure_written_by_method() {
    let registry = ControllerRegistry::builder("Guard", Arc::new(()))
        .handle(Mapping::post("claim", "/claim"), |_: &(), args: &mut Arguments<'_>| {
            args.response().send_error(409, Some("already claimed"));
            Err(Handled.into())
        })
        .build()
        .unwrap();
    let servlet = DispatchServlet::new(vec![Arc::new(registry)]);
    let res = service(&servlet, ServletRequest::post("/claim"));
    assert_eq!(res.status(), 409);
    assert_eq!(res.message(), Some("already claimed"));
}

fn directives() -> DispatchServlet {
    struct Directives;
    let registry = ControllerRegistry::builder("Directives", Arc::new(Directives))
        .handle(
            Mapping::get("user", "/user/{id}")
                .path_var::<i64>("id")
                .redirect("/user/{}"),
            |_: &Directives, args: &mut Arguments<'_>| {
                Ok(Some(ReturnValue::Integer(args.take::<i64>(0)? * 2)))
            },
        )
        .handle(
            Mapping::get("home", "/home").redirect(""),
            |_: &Directives, _: &mut Arguments<'_>| Ok(Some("home".into())),
        )
        .handle(
            Mapping::get("status", "/status/{code}")
                .path_var::<i64>("code")
                .error(400, "bad"),
            |_: &Directives, args: &mut Arguments<'_>| {
                Ok(Some(ReturnValue::Integer(args.take::<i64>(0)?)))
            },
        )
        .handle(
            Mapping::get("message", "/message").error(400, "bad"),
            |_: &Directives, _: &mut Arguments<'_>| Ok(Some("oops".into())),
        )
        .handle(
            Mapping::get("blob", "/blob").write_buffered(3),
            |_: &Directives, _: &mut Arguments<'_>| {
                Ok(Some(ReturnValue::bytes(Cursor::new(b"0123456789".to_vec()))))
            },
        )
        .handle(
            Mapping::get("nothing", "/nothing").write(),
            |_: &Directives, _: &mut Arguments<'_>| Ok(None),
        )
        .build()
        .unwrap();
    DispatchServlet::new(vec![Arc::new(registry)])
}

#[test]
fn test_redirect_substitution() {
    let servlet = directives();
    let res = service(&servlet, ServletRequest::get("/user/21"));
    assert_eq!(res.status(), 302);
    assert_eq!(res.location(), Some("/user/42"));

    let res = service(&servlet, ServletRequest::get("/home"));
    assert_eq!(res.location(), Some("home"));
}

#[test]
fn test_error_directive_overrides() {
    let servlet = directives();
    let res = service(&servlet, ServletRequest::get("/status/404"));
    assert_eq!((res.status(), res.message()), (404, Some("bad")));

    let res = service(&servlet, ServletRequest::get("/status/7"));
    assert_eq!((res.status(), res.message()), (400, Some("bad")));

    let res = service(&servlet, ServletRequest::get("/message"));
    assert_eq!((res.status(), res.message()), (400, Some("oops")));
}

#[test]
fn test_write_directive_streams_value() {
    let servlet = directives();
    let res = service(&servlet, ServletRequest::get("/blob"));
    assert_eq!(res.body(), b"0123456789");

    let mut res = ServletResponse::new();
    let err = servlet.service(ServletRequest::get("/nothing"), &mut res).unwrap_err();
    assert!(matches!(err, ServeError::Render(RenderError::NullWrite { .. })));
}

fn users_registry() -> Arc<ControllerRegistry> {
    struct Users;
    let registry = ControllerRegistry::builder("Users", Arc::new(Users))
        .handle(
            Mapping::get("show", "/users/{id}").path_var::<u64>("id").write(),
            |_: &Users, args: &mut Arguments<'_>| Ok(Some(args.take::<u64>(0)?.to_string().into())),
        )
        .build()
        .unwrap();
    Arc::new(registry)
}

#[test]
fn test_session_id_is_stripped_before_matching() {
    let mvc = Mvc::builder().control("/", users_registry()).build();
    let res = dispatch(&mvc, ServletRequest::get("/users/7;jsessionid=A1B2C3"));
    assert_eq!(res.body_string(), "7");

    let mvc = Mvc::builder()
        .control("/", users_registry())
        .config(RuntimeConfig {
            strip_session_id: false,
            ..RuntimeConfig::default()
        })
        .build();
    let res = dispatch(&mvc, ServletRequest::get("/users/7;jsessionid=A1B2C3"));
    assert_eq!(res.status(), 400);
}

#[test]
fn test_best_method_across_registries() {
    struct Catalog;
    struct Editor;
    let catalog = ControllerRegistry::builder("Catalog", Arc::new(Catalog))
        .handle(
            Mapping::get("show", "/items/{id}").write(),
            |_: &Catalog, _: &mut Arguments<'_>| Ok(Some("catalog.show".into())),
        )
        .handle(
            Mapping::get("any", "/items/{id}/{rest}").write(),
            |_: &Catalog, _: &mut Arguments<'_>| Ok(Some("catalog.any".into())),
        )
        .build()
        .unwrap();
    let editor = ControllerRegistry::builder("Editor", Arc::new(Editor))
        .handle(
            Mapping::get("create", "/items/new").write(),
            |_: &Editor, _: &mut Arguments<'_>| Ok(Some("editor.create".into())),
        )
        .handle(
            Mapping::get("edit", "/items/{id}/edit").write(),
            |_: &Editor, _: &mut Arguments<'_>| Ok(Some("editor.edit".into())),
        )
        .build()
        .unwrap();
    let mvc = Mvc::builder()
        .control("/app", Arc::new(catalog))
        .control("/app/", Arc::new(editor))
        .build();

    let body = |path: &str| dispatch(&mvc, ServletRequest::get(path)).body_string();
    assert_eq!(body("/app/items/new"), "editor.create");
    assert_eq!(body("/app/items/5"), "catalog.show");
    assert_eq!(body("/app/items/5/edit"), "editor.edit");
    assert_eq!(body("/app/items/5/photos"), "catalog.any");
}

#[test]
fn test_full_tie_goes_to_registry_added_first() {
    struct Tagged(&'static str);
    let make = |tag: &'static str| {
        let registry = ControllerRegistry::builder(tag, Arc::new(Tagged(tag)))
            .handle(
                Mapping::get("show", "/x/{id}").write(),
                |t: &Tagged, _: &mut Arguments<'_>| Ok(Some(t.0.into())),
            )
            .build()
            .unwrap();
        Arc::new(registry)
    };
    // built in the opposite order to the one they are added in
    let b = make("B");
    let a = make("A");

    let servlet = DispatchServlet::new(vec![Arc::clone(&a), Arc::clone(&b)]);
    assert_eq!(service(&servlet, ServletRequest::get("/x/1")).body_string(), "A");

    let servlet = DispatchServlet::new(vec![Arc::clone(&b), Arc::clone(&a)]);
    assert_eq!(service(&servlet, ServletRequest::get("/x/1")).body_string(), "B");

    let mvc = Mvc::builder().control("/", a).control("/", b).build();
    assert_eq!(dispatch(&mvc, ServletRequest::get("/x/1")).body_string(), "A");
}

#[test]
fn test_path_variables_are_percent_decoded() {
    struct People;
    let registry = ControllerRegistry::builder("People", Arc::new(People))
        .handle(
            Mapping::get("show", "/user/{name}").path_var::<String>("name").write(),
            |_: &People, args: &mut Arguments<'_>| Ok(Some(args.take::<String>(0)?.into())),
        )
        .handle(
            Mapping::get("page", "/page/{n}").path_var::<u32>("n").write(),
            |_: &People, args: &mut Arguments<'_>| Ok(Some((args.take::<u32>(0)? + 1).into())),
        )
        .build()
        .unwrap();
    let mvc = Mvc::builder().control("/", Arc::new(registry)).build();

    let res = dispatch(&mvc, ServletRequest::get("/user/John%20Doe"));
    assert_eq!(res.body_string(), "John Doe");
    let res = dispatch(&mvc, ServletRequest::get("/user/a+b"));
    assert_eq!(res.body_string(), "a+b");
    let res = dispatch(&mvc, ServletRequest::get("/page/%34%32"));
    assert_eq!(res.body_string(), "43");

    let res = dispatch(&mvc, ServletRequest::get("/user/%FF%FE"));
    assert_eq!(res.status(), 400);
    assert!(res.message().unwrap_or_default().contains("name"));
}

#[test]
fn test_session_id_in_prefix_segment() {
    let mvc = Mvc::builder().control("/api", users_registry()).build();
    let res = dispatch(&mvc, ServletRequest::get("/api;jsessionid=1/users/7"));
    assert_eq!(res.body_string(), "7");
    let found = mvc.explain(&ServletRequest::get("/api;jsessionid=1/users/7")).unwrap();
    assert_eq!(found.descriptor.name(), "show");
}

#[test]
fn test_longest_prefix_wins() {
    struct Versioned(&'static str);
    let make = |tag: &'static str| {
        let registry = ControllerRegistry::builder(tag, Arc::new(Versioned(tag)))
            .handle(
                Mapping::get("ping", "/ping").write(),
                |v: &Versioned, _: &mut Arguments<'_>| Ok(Some(v.0.into())),
            )
            .build()
            .unwrap();
        Arc::new(registry)
    };
    let mvc = Mvc::builder()
        .control("/api", make("v1"))
        .control("/api/v2", make("v2"))
        .build();
    assert_eq!(mvc.prefixes().collect::<Vec<_>>(), vec!["/api/v2", "/api"]);
    assert_eq!(dispatch(&mvc, ServletRequest::get("/api/ping")).body_string(), "v1");
    assert_eq!(dispatch(&mvc, ServletRequest::get("/api/v2/ping")).body_string(), "v2");
    assert_eq!(dispatch(&mvc, ServletRequest::get("/api/v2x/ping")).status(), 404);
}

#[test]
fn test_injected_request_scope_values() {
    struct Echo;
    let registry = ControllerRegistry::builder("Echo", Arc::new(Echo))
        .handle(
            Mapping::get("who", "/who")
                .inject::<ServletRequest>()
                .inject::<RequestId>()
                .attribute_or::<String>("user", "anonymous")
                .write(),
            |_: &Echo, args: &mut Arguments<'_>| {
                let req: Arc<ServletRequest> = args.take(0)?;
                let id: Arc<RequestId> = args.take(1)?;
                let user: String = args.take(2)?;
                Ok(Some(format!("{} {} {}", req.path_info(), id, user).into()))
            },
        )
        .build()
        .unwrap();
    let mvc = Mvc::builder().control("/echo", Arc::new(registry)).build();

    let id = RequestId::new();
    let req = ServletRequest::get("/echo/who")
        .with_header(REQUEST_ID_HEADER, id.to_string())
        .with_attribute("user", String::from("ada"));
    assert_eq!(dispatch(&mvc, req).body_string(), format!("/who {id} ada"));

    let body = dispatch(&mvc, ServletRequest::get("/echo/who")).body_string();
    assert!(body.ends_with(" anonymous"));
}

#[test]
fn test_view_rendering_with_model() {
    struct Pages;
    let views = Views::new().renderer(
        "jinja",
        TemplateRenderer::from_sources([("pages/user/42", "<h1>{{ name }}</h1>")]),
    );
    let registry = ControllerRegistry::builder("Pages", Arc::new(Pages))
        .marker(mvc_dispatch::controller::ClassMarker::ViewDirectory("pages".into()))
        .marker(mvc_dispatch::controller::ClassMarker::RenderedWith {
            regex: "pages/.*".into(),
            renderer: "jinja".into(),
        })
        .views(Arc::new(views))
        .handle(
            Mapping::get("user", "/user/{id}")
                .path_var::<i64>("id")
                .inject::<Model>()
                .view("user/{}"),
            |_: &Pages, args: &mut Arguments<'_>| {
                let id: i64 = args.take(0)?;
                let model: Arc<Model> = args.take(1)?;
                model.put("name", format!("user {id}"))?;
                Ok(Some(ReturnValue::Integer(id)))
            },
        )
        .handle(
            Mapping::get("orphan", "/orphan").view("/elsewhere.txt"),
            |_: &Pages, _: &mut Arguments<'_>| Ok(None),
        )
        .build()
        .unwrap();
    let servlet = DispatchServlet::new(vec![Arc::new(registry)]);

    let res = service(&servlet, ServletRequest::get("/user/42"));
    assert_eq!(res.body_string(), "<h1>user 42</h1>");

    let mut res = ServletResponse::new();
    let err = servlet.service(ServletRequest::get("/orphan"), &mut res).unwrap_err();
    assert!(matches!(
        err,
        ServeError::Render(RenderError::NoRendererFound { ref view }) if view == "/elsewhere.txt"
    ));
}

#[test]
fn test_factory_provider_builds_controller_per_invocation() {
    let built = Calls::default();
    let counter = built.clone();
    struct Fresh;
    let registry = ControllerRegistry::builder::<Fresh>(
        "Fresh",
        Factory(move || {
            counter.hit();
            Fresh
        }),
    )
    .handle(Mapping::get("x", "/x").write(), |_: &Fresh, _: &mut Arguments<'_>| {
        Ok(Some("ok".into()))
    })
    .build()
    .unwrap();
    let servlet = DispatchServlet::new(vec![Arc::new(registry)]);
    for _ in 0..3 {
        service(&servlet, ServletRequest::get("/x"));
    }
    assert_eq!(built.count(), 3);
}
