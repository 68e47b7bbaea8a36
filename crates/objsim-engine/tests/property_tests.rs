//! Property Tests
//!
//! ## Scenarios Covered
//!
//! 1. Undoing every stored evaluation restores the initial state, and
//!    redoing them restores the final state, generated names included
//! 2. Arity mismatches never leave a call frame behind
//! 3. Generated names are reproducible across undo/redo

mod common;

use common::{call_on_c1, new_system, system_with_object};
use objsim_core::statement::{Operand, Statement};
use objsim_core::value::Value;
use objsim_core::SimError;
use proptest::prelude::*;

fn named(k: u8) -> Value {
    Value::object(format!("o{}", k), "C")
}

fn statement_strategy() -> impl Strategy<Value = Statement> {
    prop_oneof![
        (0u8..3).prop_map(|k| Statement::create_object("C", None, Some(&format!("v{}", k)))),
        (0u8..3).prop_map(|k| Statement::create_object("C", Some(&format!("o{}", k)), None)),
        (0u8..3, -5i64..5)
            .prop_map(|(k, n)| Statement::set_attribute(named(k), "a", Value::Integer(n))),
        (0u8..3, -5i64..5).prop_map(|(k, n)| Statement::set_attribute(
            Operand::var(format!("v{}", k)),
            "a",
            Value::Integer(n)
        )),
        (0u8..3, any::<i64>()).prop_map(|(k, n)| Statement::assign(
            format!("x{}", k),
            Value::Integer(n)
        )),
        (0u8..3).prop_map(|k| Statement::Unassign {
            variable: format!("x{}", k)
        }),
        (0u8..3).prop_map(|k| Statement::DestroyObject {
            object: named(k).into()
        }),
        (0u8..3, -2i64..4).prop_map(|(k, n)| Statement::call(
            named(k),
            "inc",
            vec![Value::Integer(n).into()]
        )),
    ]
}

proptest! {
    #[test]
    fn undo_all_then_redo_all_round_trips(statements in proptest::collection::vec(statement_strategy(), 0..12)) {
        let mut system = new_system();
        let initial_state = system.state().clone();
        let initial_bindings = system.var_bindings();

        for statement in &statements {
            // failures are compensated and not stored
            let _ = system.evaluate_statement(statement);
        }
        prop_assert!(system.call_stack().is_empty());
        let final_state = system.state().clone();
        let final_bindings = system.var_bindings();
        let stored = system.num_evaluated_statements();

        for _ in 0..stored {
            prop_assert!(system.undo_last_statement().is_ok());
        }
        prop_assert_eq!(system.state(), &initial_state);
        prop_assert_eq!(system.var_bindings(), initial_bindings);

        for _ in 0..stored {
            prop_assert!(system.redo_statement().is_ok());
        }
        prop_assert_eq!(system.state(), &final_state);
        prop_assert_eq!(system.var_bindings(), final_bindings);
    }

    #[test]
    fn arity_mismatch_leaves_no_frame(count in (0usize..6).prop_filter("inc takes one argument", |n| *n != 1)) {
        let mut system = system_with_object();
        let call = call_on_c1(&system, "inc", vec![Value::Integer(1); count]);

        let err = system.enter_operation(call, false).unwrap_err();

        let is_arity = matches!(err, SimError::ArityMismatch { .. });
        prop_assert!(is_arity);
        prop_assert!(system.call_stack().is_empty());
        prop_assert_eq!(system.variables().depth(), 0);
    }

    #[test]
    fn generated_names_survive_undo_redo(k in 1usize..6) {
        let mut system = new_system();
        let creates = Statement::Sequence(vec![Statement::create_object("C", None, None); k]);
        system.evaluate_statement(&creates).unwrap();
        let before: Vec<String> = system.state().object_names().map(str::to_string).collect();

        system.undo_last_statement().unwrap();
        system.redo_statement().unwrap();

        let after: Vec<String> = system.state().object_names().map(str::to_string).collect();
        prop_assert_eq!(&before, &after);
        prop_assert_eq!(after.len(), k);
        let last = format!("C{}", k);
        prop_assert!(after.contains(&last));
    }
}
