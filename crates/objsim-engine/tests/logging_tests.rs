//! Engine Logging Tests
//!
//! ## Scenarios Covered
//!
//! 1. Host-facing history operations log start and end
//! 2. Failures log `end_error` with the stable error code
//! 3. Operation entry and exit are logged with the operation name

mod common;

use common::{c1, new_system, system_with_object};
use objsim_core::logging_facility::init_test_capture;
use objsim_core::statement::Statement;
use objsim_core::value::Value;

#[test]
fn test_evaluate_statement_logs_lifecycle() {
    // GIVEN test capture
    let capture = init_test_capture();
    let mut system = new_system();

    // WHEN a statement is evaluated
    system
        .evaluate_statement(&Statement::assign("logged", Value::Integer(1)))
        .unwrap();

    // THEN start and end were logged with a request id
    capture.assert_event_exists("evaluate_statement", "start");
    capture.assert_event_exists("evaluate_statement", "end");
    let with_request_id = capture.count_events(|e| {
        e.op.as_deref() == Some("evaluate_statement") && e.fields.contains_key("request_id")
    });
    assert!(with_request_id >= 2);
}

#[test]
fn test_undo_failure_logs_error_code() {
    let capture = init_test_capture();
    let mut system = new_system();

    let _ = system.undo_last_statement().unwrap_err();

    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("undo_last_statement")
            && e.event.as_deref() == Some("end_error")
            && e.fields.get("err_code").map(String::as_str) == Some("ERR_NOTHING_TO_UNDO")
    });
    assert!(errors >= 1);
}

#[test]
fn test_operation_entry_and_exit_are_logged() {
    let capture = init_test_capture();
    let mut system = system_with_object();

    system
        .evaluate_statement(&Statement::call(c1(), "noop", vec![]))
        .unwrap();

    capture.assert_event_exists("enter_operation", "start");
    capture.assert_event_exists("enter_operation", "end");
    capture.assert_event_exists("exit_operation", "end");
    let named = capture.count_events(|e| {
        e.op.as_deref() == Some("enter_operation")
            && e.fields
                .get("operation")
                .is_some_and(|op| op.contains("C::noop"))
    });
    assert!(named >= 1);
}
