//! Integration tests for a complete server-side wizard run
//!
//! These tests drive the step request handler the way the REST layer does:
//! - Create a three step wizard with a review page
//! - Submit each step, check the review page lists every label
//! - Finish through the terminal step and verify the cache entry is gone
//! - Persist a record wizard to a JSON file store

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use multistep::forms::{FormData, FormRegistry};
use multistep::records::{JsonFileRecordStore, RecordStore};
use multistep::templates::TemplateRenderer;
use multistep::wizard::{
    BehaviorRegistry, StepCache, StepDefinition, StepRequestHandler, WizardContext, WizardError,
    WizardInstance, WizardSettings,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn values(value: Value) -> FormData {
    value.as_object().cloned().expect("object literal")
}

fn handler(records: Option<Arc<dyn RecordStore>>) -> StepRequestHandler {
    let mut settings = WizardSettings::default();
    settings.default_return_url = "/home".to_string();
    StepRequestHandler::new(WizardContext::new(
        StepCache::in_memory(),
        FormRegistry::with_builtins(),
        BehaviorRegistry::with_defaults(records),
        TemplateRenderer::new().expect("builtin templates"),
        settings,
    ))
}

fn signup(has_review: bool) -> WizardInstance {
    let mut instance = WizardInstance::new(
        "signup",
        vec![
            StepDefinition::new("demo_contact", "Contact"),
            StepDefinition::new("demo_preferences", "Preferences"),
            StepDefinition::new("demo_confirm", "Confirm"),
        ],
    );
    instance.has_review = has_review;
    instance.can_move_steps = true;
    instance.return_url = "/thanks".to_string();
    instance
}

fn submit_all(handler: &StepRequestHandler, recordid: i64) {
    handler
        .submit_step(
            "signup",
            recordid,
            1,
            values(json!({"firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.org"})),
        )
        .expect("contact step accepted");
    handler
        .submit_step(
            "signup",
            recordid,
            2,
            values(json!({
                "topic": "courses",
                "subtopics": ["beginner", "advanced"],
                "reminder": 3600,
                "newsletter": "1"
            })),
        )
        .expect("preferences step accepted");
    handler
        .submit_step(
            "signup",
            recordid,
            3,
            values(json!({"comment": "See you soon", "agree": "1"})),
        )
        .expect("confirm step accepted");
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn test_full_run_with_review_page() {
    let handler = handler(None);

    let first = handler.create(signup(true)).unwrap();
    assert_eq!(first.step, 1);
    assert_eq!(first.form_class, "demo_contact");
    assert_eq!(first.data["totalsteps"], json!(3));
    assert_eq!(first.data["disableprevious"], json!(true));

    submit_all(&handler, 0);

    // Every step is marked completed once submitted
    let step3 = handler.load_step("signup", 0, 3).unwrap();
    let steps = step3.data["steps"].as_array().unwrap();
    assert!(steps.iter().all(|s| s["iscompleted"] == json!(true)));
    assert_eq!(step3.data["disablenext"], json!(true));

    let review = handler.load_step("signup", 0, -1).unwrap();
    assert_eq!(review.step, -1);
    assert!(!review.is_terminal());
    assert_eq!(review.data["confirmation"], json!(true));

    let fields = review.data["fields"].as_array().unwrap();
    let labels: Vec<&str> = fields.iter().map(|f| f["label"].as_str().unwrap()).collect();
    assert_eq!(
        labels,
        vec![
            "First name",
            "Last name",
            "Email address",
            "Topic",
            "Subtopics",
            "Reminder interval",
            "Start date",
            "Subscribe to newsletter",
            "Comment",
            "I accept the terms",
        ]
    );
    let value_of = |label: &str| {
        fields
            .iter()
            .find(|f| f["label"] == json!(label))
            .and_then(|f| f["value"].as_str())
            .unwrap()
            .to_string()
    };
    assert_eq!(value_of("Subtopics"), "Beginner courses, Advanced courses");
    assert_eq!(value_of("Reminder interval"), "1 hour");
    assert_eq!(value_of("Subscribe to newsletter"), "Yes");
    assert_eq!(value_of("Start date"), "");

    let done = handler.load_step("signup", 0, -3).unwrap();
    assert!(done.is_terminal());
    assert_eq!(done.return_url, "/thanks");

    assert!(!handler.context().cache.exists("signup", 0));
    assert!(matches!(
        handler.load_step("signup", 0, 1),
        Err(WizardError::InvalidInstance { .. })
    ));
}

#[test]
fn test_run_without_review_ends_on_minus_one() {
    let handler = handler(None);
    let mut instance = signup(false);
    instance.return_url = String::new();
    handler.create(instance).unwrap();

    submit_all(&handler, 0);

    let done = handler.load_step("signup", 0, -1).unwrap();
    assert!(done.is_terminal());
    assert_eq!(done.return_url, "/home");

    handler.create(signup(false)).unwrap();
    assert!(matches!(
        handler.load_step("signup", 0, -2),
        Err(WizardError::InvalidStep(-2))
    ));
    assert!(matches!(
        handler.load_step("signup", 0, 4),
        Err(WizardError::InvalidStep(4))
    ));
}

#[test]
fn test_validation_failure_leaves_step_incomplete() {
    let handler = handler(None);
    handler.create(signup(true)).unwrap();

    let err = handler
        .submit_step("signup", 0, 1, values(json!({"firstname": "Ada", "email": "nope"})))
        .unwrap_err();
    match err {
        WizardError::ValidationFailed(errors) => {
            assert_eq!(errors.get("email"), Some("Invalid email address"));
            assert!(errors.get("firstname").is_none());
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    let step1 = handler.load_step("signup", 0, 1).unwrap();
    assert_eq!(step1.data["steps"][0]["iscompleted"], json!(false));
}

#[test]
fn test_recreate_keeps_submitted_steps() {
    let handler = handler(None);
    handler.create(signup(true)).unwrap();
    handler
        .submit_step(
            "signup",
            0,
            1,
            values(json!({"firstname": "Ada", "email": "ada@example.org"})),
        )
        .unwrap();

    // A page reload posts the configuration again
    handler.create(signup(true)).unwrap();
    let step1 = handler.load_step("signup", 0, 1).unwrap();
    assert_eq!(step1.data["formdata"]["firstname"], json!("Ada"));
    assert_eq!(step1.data["steps"][0]["iscompleted"], json!(true));
}

#[test]
fn test_record_wizard_persists_to_file_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(JsonFileRecordStore::new(temp_dir.path().join("records")).unwrap());
    let handler = handler(Some(store.clone() as Arc<dyn RecordStore>));

    let mut instance = signup(true);
    instance.manager_type = "record".to_string();
    handler.create(instance).unwrap();
    submit_all(&handler, 0);

    let done = handler.load_step("signup", 0, -3).unwrap();
    assert!(done.is_terminal());
    assert_eq!(done.data["recordid"], json!(1));

    let record = store.get(1).unwrap().expect("record written");
    assert_eq!(record.uniqueid, "signup");
    assert_eq!(record.data["1"]["firstname"], json!("Ada"));
    assert_eq!(record.data["3"]["agree"], json!("1"));
    assert!(temp_dir.path().join("records").join("1.json").exists());
    assert!(!handler.context().cache.exists("signup", 0));
}

#[test]
fn test_abandon_discards_progress() {
    let handler = handler(None);
    handler.create(signup(true)).unwrap();
    handler.abandon("signup", 0).unwrap();

    assert!(matches!(
        handler.load_step("signup", 0, 1),
        Err(WizardError::InvalidInstance { .. })
    ));
}
