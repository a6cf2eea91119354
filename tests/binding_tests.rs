use ctrlrouter::action::ScalarType;
use ctrlrouter::binding::{BindingModel, ParameterBinder, ValidationRule};
use ctrlrouter::{parse_request, ActionDescriptor, ActionResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct SignupForm {
    email: String,
    age: i32,
    newsletter: bool,
    nickname: String,
}

impl BindingModel for SignupForm {
    fn rules() -> Vec<(&'static str, ValidationRule)> {
        vec![
            ("email", ValidationRule::Required),
            ("email", ValidationRule::pattern(r"^[^@\s]+@[^@\s]+$").unwrap()),
            ("age", ValidationRule::range(13.0, 130.0)),
        ]
    }
}

struct Accounts;

fn signup() -> ActionDescriptor {
    ActionDescriptor::new::<Accounts, _>("Signup", |_, _, _| ActionResult::html(""))
        .post()
        .model::<SignupForm>("form")
}

fn post(body: &str) -> ctrlrouter::Request {
    parse_request(&format!("POST /Accounts/Signup HTTP/1.1\r\nHost: h\r\n\r\n{body}")).unwrap()
}

#[test]
fn test_failed_field_keeps_default_while_siblings_bind() {
    let req = post("email=a%40b.io&age=abc&newsletter=TRUE&nickname=zed");
    let mut args = ParameterBinder::bind(&signup(), &req);
    let bound = args.take_model::<SignupForm>(0).unwrap();
    assert_eq!(
        bound.model,
        SignupForm {
            email: "a@b.io".into(),
            age: 0,
            newsletter: true,
            nickname: "zed".into(),
        }
    );
    // age fell back to 0, which is outside its range
    assert!(!bound.is_valid);
    assert_eq!(bound.issues.len(), 1);
    assert_eq!(bound.issues[0].field, "age");
    assert_eq!(bound.issues[0].rule, "range");
}

#[test]
fn test_fields_without_rules_do_not_affect_validity() {
    let req = post("email=a%40b.io&age=30&newsletter=maybe");
    let mut args = ParameterBinder::bind(&signup(), &req);
    assert!(args.model_state().is_valid());
    let bound = args.take_model::<SignupForm>(0).unwrap();
    assert!(bound.is_valid);
    assert!(!bound.model.newsletter);
    assert_eq!(bound.model.nickname, "");
}

#[test]
fn test_model_state_collects_every_issue() {
    let req = post("email=nope&age=200");
    let args = ParameterBinder::bind(&signup(), &req);
    let state = args.model_state();
    assert!(!state.is_valid());
    assert_eq!(state.issues_for("email").count(), 1);
    assert_eq!(state.issues_for("age").count(), 1);
}

#[test]
fn test_negative_numbers_bind() {
    let req = post("email=a%40b.io&age=-5");
    let mut args = ParameterBinder::bind(&signup(), &req);
    let bound = args.take_model::<SignupForm>(0).unwrap();
    assert_eq!(bound.model.age, -5);
    assert!(!bound.is_valid);
}

#[test]
fn test_scalar_binding_stops_at_first_missing_value() {
    let action = ActionDescriptor::new::<Accounts, _>("Search", |_, _, _| ActionResult::html(""))
        .scalar("q", ScalarType::Text)
        .scalar("page", ScalarType::UInt)
        .scalar("size", ScalarType::UInt);
    let req = parse_request("GET /Accounts/Search?q=rust&size=10 HTTP/1.1\r\nHost: h\r\n\r\n")
        .unwrap();
    let args = ParameterBinder::bind(&action, &req);
    assert_eq!(args.len(), 3);
    assert_eq!(args.get::<String>(0).as_deref(), Some("rust"));
    assert!(!args.is_bound(1));
    assert!(!args.is_bound(2), "binding stops after the first unbound scalar");
}

#[test]
fn test_scalar_coercion_failure_stops_binding() {
    let action = ActionDescriptor::new::<Accounts, _>("Page", |_, _, _| ActionResult::html(""))
        .scalar("page", ScalarType::Int)
        .scalar("q", ScalarType::Text);
    let req = parse_request("GET /Accounts/Page?page=two&q=x HTTP/1.1\r\nHost: h\r\n\r\n").unwrap();
    let args = ParameterBinder::bind(&action, &req);
    assert!(!args.is_bound(0));
    assert!(!args.is_bound(1));
}

#[test]
fn test_scalars_from_form_and_query() {
    let action = ActionDescriptor::new::<Accounts, _>("Rate", |_, _, _| ActionResult::html(""))
        .post()
        .scalar("id", ScalarType::Int)
        .scalar("stars", ScalarType::Float)
        .scalar("public", ScalarType::Bool);
    let req = parse_request(
        "POST /Accounts/Rate?id=42 HTTP/1.1\r\nHost: h\r\n\r\nstars=4.5&public=False",
    )
    .unwrap();
    let args = ParameterBinder::bind(&action, &req);
    assert_eq!(args.get_named::<i64>("id"), Some(42));
    assert_eq!(args.get_named::<f64>("stars"), Some(4.5));
    assert_eq!(args.get_named::<bool>("public"), Some(false));
}

#[test]
fn test_take_model_with_wrong_type() {
    let req = post("email=a%40b.io&age=30");
    let mut args = ParameterBinder::bind(&signup(), &req);
    assert!(args.take_model::<String>(0).is_none());
    assert!(args.take_model_named::<SignupForm>("form").is_some());
    assert!(args.take_model_named::<SignupForm>("form").is_none());
}
