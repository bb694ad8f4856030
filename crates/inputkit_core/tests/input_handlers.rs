use inputkit_core::{
    AttributeModel, ChangeSet, FieldModel, FieldView, FormRequest, HandlerError, InputHandler,
    InputValue, ModelError, NamedObjectFactory, Outcome, RecordModel, WidgetView,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Settings {
    retries: i64,
    ratio: f64,
    title: String,
}

fn settings_model() -> AttributeModel<Settings> {
    AttributeModel::new(Settings::default())
        .with_setter("retries", |target, value| {
            target.retries = value.trim().parse().map_err(|_| "not an i64".to_string())?;
            Ok(())
        })
        .with_setter("ratio", |target, value| {
            target.ratio = value.trim().parse().map_err(|_| "not an f64".to_string())?;
            Ok(())
        })
        .with_setter("title", |target, value| {
            target.title = value.to_string();
            Ok(())
        })
}

fn all_handlers() -> Vec<InputHandler> {
    vec![
        InputHandler::anything("title"),
        InputHandler::integer("retries"),
        InputHandler::float("ratio"),
        InputHandler::list("tags"),
        InputHandler::new_object("project", NamedObjectFactory::new("project")),
    ]
}

#[test]
fn absent_field_is_not_applicable_for_every_handler() {
    let request = FormRequest::new().with_arg("unrelated", "1");

    for handler in all_handlers() {
        let mut model = RecordModel::new();
        let mut view = WidgetView::new();

        let report = handler.handle(&request, &mut model, &mut view).unwrap();

        assert_eq!(report.outcome, Outcome::NotApplicable, "{}", handler.field());
        assert_eq!(report.value, None);
        assert!(!report.changed);
        assert!(model.values().is_empty());
        assert!(model.notifications().is_empty());
        assert_eq!(view.error(), None);
    }
}

#[test]
fn integer_handler_applies_parseable_values() {
    let mut model = settings_model();
    let mut view = WidgetView::new();
    let request = FormRequest::new().with_args("retries", ["12", "99"]);

    let report = InputHandler::integer("retries")
        .handle(&request, &mut model, &mut view)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Valid);
    assert_eq!(report.value, Some(InputValue::Single("12".to_string())));
    assert!(report.changed);
    assert_eq!(model.target().retries, 12);
}

#[test]
fn integer_handler_reports_rejected_value() {
    let mut model = settings_model();
    let mut view = WidgetView::new();
    let request = FormRequest::new().with_arg("retries", "twelve");

    let report = InputHandler::integer("retries")
        .handle(&request, &mut model, &mut view)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Invalid);
    assert_eq!(
        view.error(),
        Some("twelve is not an integer. Please enter an integer.")
    );
    assert_eq!(model.target().retries, 0);
}

#[test]
fn grouped_digits_are_invalid_input_not_a_setter_failure() {
    let mut model = settings_model();
    let mut view = WidgetView::new();
    let request = FormRequest::new().with_arg("retries", "1_000");

    let report = InputHandler::integer("retries")
        .handle(&request, &mut model, &mut view)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Invalid);
    assert!(!report.changed);
    assert_eq!(
        view.error(),
        Some("1_000 is not an integer. Please enter an integer.")
    );
    assert_eq!(model.target().retries, 0);
}

#[test]
fn float_handler_validates_and_reports() {
    let mut model = settings_model();
    let mut view = WidgetView::new();

    let ok = FormRequest::new().with_arg("ratio", "0.25");
    let report = InputHandler::float("ratio")
        .handle(&ok, &mut model, &mut view)
        .unwrap();
    assert_eq!(report.outcome, Outcome::Valid);
    assert_eq!(model.target().ratio, 0.25);

    let bad = FormRequest::new().with_arg("ratio", "quarter");
    let report = InputHandler::float("ratio")
        .handle(&bad, &mut model, &mut view)
        .unwrap();
    assert_eq!(report.outcome, Outcome::Invalid);
    assert_eq!(
        view.error(),
        Some("quarter is not a float. Please enter a float.")
    );
    assert_eq!(model.target().ratio, 0.25);
}

#[test]
fn same_value_twice_mutates_model_once() {
    let notifications = Rc::new(RefCell::new(Vec::<ChangeSet>::new()));
    let mut model = settings_model();
    let sink = Rc::clone(&notifications);
    model.subscribe(move |changes| sink.borrow_mut().push(changes.clone()));

    let mut view = WidgetView::new();
    let handler = InputHandler::anything("title");
    let request = FormRequest::new().with_arg("title", "Quarterly plan");

    let first = handler.handle(&request, &mut model, &mut view).unwrap();
    let second = handler.handle(&request, &mut model, &mut view).unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(second.outcome, Outcome::Valid);
    assert_eq!(notifications.borrow().len(), 1);
    assert_eq!(
        notifications.borrow()[0].get("title").map(String::as_str),
        Some("Quarterly plan")
    );

    let renamed = FormRequest::new().with_arg("title", "Annual plan");
    assert!(handler.handle(&renamed, &mut model, &mut view).unwrap().changed);
    assert_eq!(notifications.borrow().len(), 2);
    assert_eq!(model.target().title, "Annual plan");
}

#[test]
fn cached_view_value_suppresses_assignment() {
    let mut model = RecordModel::new();
    let mut view = WidgetView::with_cached("7");
    let request = FormRequest::new().with_arg("retries", "7");

    let report = InputHandler::integer("retries")
        .handle(&request, &mut model, &mut view)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Valid);
    assert!(!report.changed);
    assert!(model.values().is_empty());
}

#[test]
fn list_handler_never_applies() {
    let mut model = RecordModel::new();
    let mut view = WidgetView::new();
    let request = FormRequest::new().with_args("tags", ["red", "blue"]);

    let report = InputHandler::list("tags")
        .handle(&request, &mut model, &mut view)
        .unwrap();

    assert_eq!(report.outcome, Outcome::NotApplicable);
    assert_eq!(
        report.value,
        Some(InputValue::Many(vec!["red".to_string(), "blue".to_string()]))
    );
    assert!(model.values().is_empty());
    assert_eq!(view.cached_value(), None);
}

#[test]
fn reserved_delimiter_in_field_is_fatal_on_apply() {
    let mut model = RecordModel::new();
    let mut view = WidgetView::new();
    let request = FormRequest::new().with_arg("title;drop", "x");

    let err = InputHandler::anything("title;drop")
        .handle(&request, &mut model, &mut view)
        .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::ReservedDelimiter { ref field, delimiter: ';' } if field == "title;drop"
    ));
    assert!(model.values().is_empty());
}

#[test]
fn reserved_delimiter_is_harmless_when_input_is_invalid_or_absent() {
    let mut model = RecordModel::new();
    let mut view = WidgetView::new();
    let handler = InputHandler::integer("count;x");

    let invalid = FormRequest::new().with_arg("count;x", "many");
    let report = handler.handle(&invalid, &mut model, &mut view).unwrap();
    assert_eq!(report.outcome, Outcome::Invalid);

    let absent = FormRequest::new();
    let report = handler.handle(&absent, &mut model, &mut view).unwrap();
    assert_eq!(report.outcome, Outcome::NotApplicable);
}

#[test]
fn unknown_model_field_is_fatal() {
    let mut model = settings_model();
    let mut view = WidgetView::new();
    let request = FormRequest::new().with_arg("colour", "red");

    let err = InputHandler::anything("colour")
        .handle(&request, &mut model, &mut view)
        .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Model(ModelError::UnknownField(ref field)) if field == "colour"
    ));
    assert_eq!(view.cached_value(), None);
}

#[test]
fn record_model_receives_field_keyed_notification() {
    let mut model = RecordModel::new();
    let mut view = WidgetView::new();
    let request = FormRequest::new().with_arg("title", "Hi");

    InputHandler::anything("title")
        .handle(&request, &mut model, &mut view)
        .unwrap();

    let mut expected = ChangeSet::new();
    expected.insert("title".to_string(), "Hi".to_string());
    assert_eq!(model.notifications(), &[expected]);
    assert_eq!(model.get("title"), Some("Hi"));

    let mut other = RecordModel::new();
    other.notify(&ChangeSet::new());
    assert_eq!(other.notifications().len(), 1);
}
