use super::context::{Change, ExecutionContext};
use super::result::Event;
use super::{ObjectSnapshot, Operand, Statement};
use crate::call::OperationCall;
use crate::errors::{Result, SimError};
use crate::state::{Link, StateDifference};
use crate::value::{ObjectRef, Value};

impl Operand {
    /// Current value of the operand
    ///
    /// # Errors
    ///
    /// Returns `UnboundVariable` for a variable with no visible binding.
    pub fn resolve(&self, ctx: &dyn ExecutionContext) -> Result<Value> {
        match self {
            Operand::Literal(v) => Ok(v.clone()),
            Operand::Variable(name) => {
                ctx.variables()
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| SimError::UnboundVariable {
                        variable: name.clone(),
                    })
            }
            Operand::Expression(expr) => Ok(ctx.evaluate(expr)),
        }
    }
}

/// Resolve an operand to a live object; the class comes from the state
fn resolve_object(ctx: &dyn ExecutionContext, operand: &Operand) -> Result<ObjectRef> {
    let obj = match operand.resolve(ctx)? {
        Value::Object(obj) => obj,
        other => {
            return Err(SimError::NotAnObject {
                found: other.to_string(),
            })
        }
    };
    ctx.state()
        .object_ref(&obj.name)
        .ok_or(SimError::ObjectNotFound { object: obj.name })
}

fn assign_variable(ctx: &mut dyn ExecutionContext, variable: &str, value: Value) {
    let tracked = ctx.tracks_variable_changes();
    let previous = ctx.variables_mut().assign(variable, value);
    if tracked {
        let inverse = match previous {
            Some(v) => Statement::assign(variable, v),
            None => Statement::Unassign {
                variable: variable.to_string(),
            },
        };
        ctx.record(Change::new().with_inverse(inverse));
    }
}

fn resolve_link(
    ctx: &dyn ExecutionContext,
    association: &str,
    participants: &[Operand],
    check_ends: bool,
) -> Result<(Link, Vec<Operand>)> {
    let assoc = ctx
        .model()
        .association(association)
        .ok_or_else(|| SimError::UnknownAssociation {
            association: association.to_string(),
        })?;
    if assoc.arity() != participants.len() {
        return Err(SimError::LinkArityMismatch {
            association: association.to_string(),
            expected: assoc.arity(),
            found: participants.len(),
        });
    }
    let mut names = Vec::with_capacity(participants.len());
    let mut resolved = Vec::with_capacity(participants.len());
    for (operand, end) in participants.iter().zip(&assoc.ends) {
        let obj = resolve_object(ctx, operand)?;
        if check_ends && !ctx.model().is_subclass_of(&obj.class, &end.class) {
            return Err(SimError::LinkEndTypeMismatch {
                association: association.to_string(),
                role: end.role.clone(),
                object: obj.name,
            });
        }
        names.push(obj.name.clone());
        resolved.push(Operand::Literal(Value::Object(obj)));
    }
    Ok((Link::new(association, names), resolved))
}

impl Statement {
    /// Apply the statement, recording each change with its inverse
    ///
    /// Application stops at the first failure; changes recorded before it
    /// stay recorded so the caller can compensate.
    ///
    /// # Errors
    ///
    /// Returns the first [`SimError`] raised by the statement or one of its
    /// parts.
    pub fn apply(&self, ctx: &mut dyn ExecutionContext) -> Result<()> {
        match self {
            Statement::Assign { variable, value } => {
                let v = value.resolve(ctx)?;
                assign_variable(ctx, variable, v);
                Ok(())
            }

            Statement::Unassign { variable } => {
                let tracked = ctx.tracks_variable_changes();
                let previous = ctx.variables_mut().unassign(variable).ok_or_else(|| {
                    SimError::UnboundVariable {
                        variable: variable.clone(),
                    }
                })?;
                if tracked {
                    ctx.record(Change::new().with_inverse(Statement::assign(variable, previous)));
                }
                Ok(())
            }

            Statement::CreateObject {
                class,
                name,
                variable,
            } => {
                let cls = ctx
                    .model()
                    .class(class)
                    .ok_or_else(|| SimError::UnknownClass {
                        class: class.clone(),
                    })?;
                if cls.is_abstract() {
                    return Err(SimError::AbstractClass {
                        class: class.clone(),
                    });
                }
                let object = match name {
                    Some(n) if ctx.state().has_object(n) => {
                        return Err(SimError::ObjectAlreadyExists { object: n.clone() })
                    }
                    Some(n) => n.clone(),
                    None => ctx.unique_object_name(class),
                };
                ctx.state_mut().create_object(&object, class);
                tracing::trace!(object = %object, class = %class, "object created");

                let mut diff = StateDifference::new();
                diff.add_created(&object);
                let reference = Value::object(object.clone(), class.clone());
                ctx.record(
                    Change::new()
                        .with_difference(diff)
                        .with_event(Event::ObjectCreated {
                            object,
                            class: class.clone(),
                        })
                        .with_inverse(Statement::DestroyObject {
                            object: reference.clone().into(),
                        }),
                );
                if let Some(v) = variable {
                    assign_variable(ctx, v, reference);
                }
                Ok(())
            }

            Statement::DestroyObject { object } => {
                let obj = resolve_object(ctx, object)?;
                if ctx.has_active_operation(&obj.name) {
                    return Err(SimError::ObjectHasActiveOperation { object: obj.name });
                }
                let links: Vec<Link> = ctx.state().links_of(&obj.name).cloned().collect();
                let attributes = ctx
                    .state()
                    .object(&obj.name)
                    .map(|o| o.attributes.clone())
                    .unwrap_or_default();
                ctx.state_mut().destroy_object(&obj.name);
                tracing::trace!(object = %obj.name, links = links.len(), "object destroyed");

                let mut change = Change::new();
                for link in &links {
                    change.difference.add_deleted_link(link);
                    change.events.push(Event::LinkDeleted { link: link.clone() });
                }
                change.difference.add_deleted(&obj.name);
                change.events.push(Event::ObjectDestroyed {
                    object: obj.name.clone(),
                    class: obj.class.clone(),
                });
                change.inverse = Some(Statement::RestoreObject {
                    snapshot: ObjectSnapshot {
                        name: obj.name,
                        class: obj.class,
                        attributes,
                        links,
                    },
                });
                ctx.record(change);
                Ok(())
            }

            Statement::RestoreObject { snapshot } => {
                if ctx.model().class(&snapshot.class).is_none() {
                    return Err(SimError::UnknownClass {
                        class: snapshot.class.clone(),
                    });
                }
                if ctx.state().has_object(&snapshot.name) {
                    return Err(SimError::ObjectAlreadyExists {
                        object: snapshot.name.clone(),
                    });
                }
                for link in &snapshot.links {
                    if ctx.state().has_link(link) {
                        return Err(SimError::LinkAlreadyExists {
                            link: link.to_string(),
                        });
                    }
                    if let Some(missing) = link
                        .participants
                        .iter()
                        .find(|p| **p != snapshot.name && !ctx.state().has_object(p))
                    {
                        return Err(SimError::ObjectNotFound {
                            object: missing.clone(),
                        });
                    }
                }

                let state = ctx.state_mut();
                state.create_object(&snapshot.name, &snapshot.class);
                for (attribute, value) in &snapshot.attributes {
                    state.set_attribute(&snapshot.name, attribute, value.clone());
                }
                for link in &snapshot.links {
                    state.insert_link(link.clone());
                }

                let mut change = Change::new();
                change.difference.add_created(&snapshot.name);
                change.events.push(Event::ObjectCreated {
                    object: snapshot.name.clone(),
                    class: snapshot.class.clone(),
                });
                for link in &snapshot.links {
                    change.difference.add_inserted_link(link);
                    change.events.push(Event::LinkInserted { link: link.clone() });
                }
                change.inverse = Some(Statement::DestroyObject {
                    object: Value::object(snapshot.name.clone(), snapshot.class.clone()).into(),
                });
                ctx.record(change);
                Ok(())
            }

            Statement::SetAttribute {
                object,
                attribute,
                value,
            } => {
                let obj = resolve_object(ctx, object)?;
                let declared = ctx
                    .model()
                    .attribute(&obj.class, attribute)
                    .map(|a| a.ty.clone())
                    .ok_or_else(|| SimError::UnknownAttribute {
                        class: obj.class.clone(),
                        attribute: attribute.clone(),
                    })?;
                let v = value.resolve(ctx)?;
                let found = v.type_of();
                if !ctx.model().conforms(&found, &declared) {
                    return Err(SimError::AttributeTypeMismatch {
                        object: obj.name,
                        attribute: attribute.clone(),
                        expected: declared.to_string(),
                        found: found.to_string(),
                    });
                }
                let previous = ctx
                    .state_mut()
                    .set_attribute(&obj.name, attribute, v.clone());

                let mut diff = StateDifference::new();
                diff.add_modified(&obj.name, attribute);
                ctx.record(
                    Change::new()
                        .with_difference(diff)
                        .with_event(Event::AttributeAssigned {
                            object: obj.name.clone(),
                            attribute: attribute.clone(),
                            value: v,
                        })
                        .with_inverse(Statement::set_attribute(
                            Value::Object(obj),
                            attribute.clone(),
                            previous,
                        )),
                );
                Ok(())
            }

            Statement::InsertLink {
                association,
                participants,
            } => {
                let (link, operands) = resolve_link(ctx, association, participants, true)?;
                if ctx.state().has_link(&link) {
                    return Err(SimError::LinkAlreadyExists {
                        link: link.to_string(),
                    });
                }
                ctx.state_mut().insert_link(link.clone());
                let mut diff = StateDifference::new();
                diff.add_inserted_link(&link);
                ctx.record(
                    Change::new()
                        .with_difference(diff)
                        .with_event(Event::LinkInserted { link })
                        .with_inverse(Statement::DeleteLink {
                            association: association.clone(),
                            participants: operands,
                        }),
                );
                Ok(())
            }

            Statement::DeleteLink {
                association,
                participants,
            } => {
                let (link, operands) = resolve_link(ctx, association, participants, false)?;
                if !ctx.state_mut().delete_link(&link) {
                    return Err(SimError::LinkNotFound {
                        link: link.to_string(),
                    });
                }
                let mut diff = StateDifference::new();
                diff.add_deleted_link(&link);
                ctx.record(
                    Change::new()
                        .with_difference(diff)
                        .with_event(Event::LinkDeleted { link })
                        .with_inverse(Statement::InsertLink {
                            association: association.clone(),
                            participants: operands,
                        }),
                );
                Ok(())
            }

            Statement::Sequence(statements) => {
                for statement in statements {
                    statement.apply(ctx)?;
                }
                Ok(())
            }

            Statement::CallOperation {
                receiver,
                operation,
                arguments,
            } => {
                let obj = resolve_object(ctx, receiver)?;
                let op = ctx
                    .model()
                    .operation(&obj.class, operation)
                    .cloned()
                    .ok_or_else(|| SimError::UnknownOperation {
                        class: obj.class.clone(),
                        operation: operation.clone(),
                    })?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(argument.resolve(ctx)?);
                }

                ctx.enter_operation(OperationCall::new(op.clone(), obj, args), false)?;

                if let Some(body) = op.body() {
                    if let Err(err) = body.apply(ctx) {
                        ctx.fail_current_operation();
                        if let Err(exit_err) = ctx.exit_operation(None, true) {
                            tracing::debug!(error = %exit_err, "exit after failed body");
                        }
                        return Err(err);
                    }
                }

                let result = match op.result_type() {
                    Some(_) => ctx.variables().lookup_local("result").cloned(),
                    None => None,
                };
                ctx.exit_operation(result, true)?;
                Ok(())
            }
        }
    }
}
