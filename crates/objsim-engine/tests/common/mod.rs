//! Shared fixture: a small model and a table-driven expression evaluator

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use objsim_core::model::{Association, Class, Model, Operation};
use objsim_core::statement::{Operand, Statement};
use objsim_core::value::{Type, Value};
use objsim_core::{Expression, StateChangeEvent, SystemState, VarBindings};
use objsim_engine::{System, SystemConfig};

fn int_of(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Integer(i)) => *i,
        _ => 0,
    }
}

fn self_attr(state: &SystemState, bindings: &VarBindings, attribute: &str) -> Value {
    match bindings.get("self").and_then(Value::as_object) {
        Some(obj) => state.attribute_value(&obj.name, attribute),
        None => Value::Undefined,
    }
}

/// Evaluates the handful of expressions the fixture model uses
pub fn evaluate(
    expr: &Expression,
    state: &SystemState,
    pre: Option<&SystemState>,
    bindings: &VarBindings,
) -> Value {
    let n = int_of(bindings.get("n"));
    match expr.text() {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        "undefined" => Value::Undefined,
        "n > 0" => Value::Boolean(n > 0),
        "self.a" => self_attr(state, bindings, "a"),
        "self.a + n" => Value::Integer(int_of(Some(&self_attr(state, bindings, "a"))) + n),
        "self.a = self.a@pre + n" => match pre {
            Some(pre) => {
                let now = int_of(Some(&self_attr(state, bindings, "a")));
                let before = int_of(Some(&self_attr(pre, bindings, "a")));
                Value::Boolean(now == before + n)
            }
            None => Value::Undefined,
        },
        "result = n" => Value::Boolean(bindings.get("result") == bindings.get("n")),
        other => other
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or(Value::Undefined),
    }
}

/// ```text
/// class C { a : Integer, b : String, r : Real }
///   inc(n : Integer)        pre n > 0, post self.a = self.a@pre + n
///   get() : Integer         result := self.a
///   broken(n : Integer) : Integer   sets a and result, post false
///   guarded()               pre false
///   scale(f : Real)
///   pair(x : Integer, y : Integer)
///   noop()
///   spawn()                 creates an unnamed D
///   selfdestruct()          destroys self
///   fail()                  assigns a string to a
///   echo(n : Integer) : Integer  result := n, post result = n
///   forget() : Integer      never sets result
/// class D extends C
/// abstract class Shape
/// association R (c : C, d : D)
/// ```
pub fn model() -> Model {
    let self_op = || Operand::var("self");
    Model::new("Fixture")
        .with_class(
            Class::new("C")
                .with_attribute("a", Type::Integer)
                .with_attribute("b", Type::String)
                .with_attribute("r", Type::Real)
                .with_operation(
                    Operation::new("inc")
                        .with_parameter("n", Type::Integer)
                        .with_precondition("positive", "n > 0")
                        .with_postcondition("added", "self.a = self.a@pre + n")
                        .requiring_pre_state()
                        .with_body(Statement::set_attribute(
                            self_op(),
                            "a",
                            Operand::expr("self.a + n"),
                        )),
                )
                .with_operation(
                    Operation::new("get")
                        .with_result_type(Type::Integer)
                        .with_body(Statement::assign("result", Operand::expr("self.a"))),
                )
                .with_operation(
                    Operation::new("broken")
                        .with_parameter("n", Type::Integer)
                        .with_result_type(Type::Integer)
                        .with_postcondition("never", "false")
                        .with_body(Statement::Sequence(vec![
                            Statement::set_attribute(self_op(), "a", Operand::var("n")),
                            Statement::assign("result", Operand::var("n")),
                        ])),
                )
                .with_operation(Operation::new("guarded").with_precondition("closed", "false"))
                .with_operation(Operation::new("scale").with_parameter("f", Type::Real))
                .with_operation(
                    Operation::new("pair")
                        .with_parameter("x", Type::Integer)
                        .with_parameter("y", Type::Integer),
                )
                .with_operation(Operation::new("noop"))
                .with_operation(
                    Operation::new("spawn").with_body(Statement::create_object("D", None, None)),
                )
                .with_operation(Operation::new("selfdestruct").with_body(
                    Statement::DestroyObject { object: self_op() },
                ))
                .with_operation(Operation::new("fail").with_body(Statement::set_attribute(
                    self_op(),
                    "a",
                    Value::string("oops"),
                )))
                .with_operation(
                    Operation::new("echo")
                        .with_parameter("n", Type::Integer)
                        .with_result_type(Type::Integer)
                        .with_postcondition("same", "result = n")
                        .with_body(Statement::assign("result", Operand::var("n"))),
                )
                .with_operation(Operation::new("forget").with_result_type(Type::Integer)),
        )
        .with_class(Class::new("D").with_parent("C"))
        .with_class(Class::new("Shape").abstract_class())
        .with_association(Association::new("R").with_end("c", "C").with_end("d", "D"))
}

pub fn new_system() -> System {
    System::new(model(), evaluate)
}

pub fn new_system_with(config: SystemConfig) -> System {
    System::with_config(model(), evaluate, config)
}

/// A system holding one object `c1` of class C
pub fn system_with_object() -> System {
    let mut system = new_system();
    system
        .evaluate_statement(&Statement::create_object("C", Some("c1"), None))
        .unwrap();
    system
}

pub fn c1() -> Value {
    Value::object("c1", "C")
}

/// Listener recording every event it receives
pub fn recording_listener(
    system: &mut System,
) -> (objsim_engine::ListenerId, Rc<RefCell<Vec<StateChangeEvent>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = system.add_change_listener(move |event: &StateChangeEvent| {
        sink.borrow_mut().push(event.clone());
    });
    (id, seen)
}

/// An uncommitted call of `op` on `c1`
pub fn call_on_c1(system: &System, op: &str, args: Vec<Value>) -> objsim_core::OperationCall {
    let operation = system.model().operation("C", op).cloned().unwrap();
    objsim_core::OperationCall::new(operation, objsim_core::ObjectRef::new("c1", "C"), args)
}
