//! Expression evaluation
//!
//! [`evaluate`] is the recursive entry point and returns a boxed future;
//! the per-node helpers are plain `async fn`s that recurse only through it.

use futures::future::LocalBoxFuture;

use crate::ast::{
    Argument, ArrayElement, AssignmentExpression, AssignmentOp, AssignmentTarget,
    CallExpression, Expression, Literal, LogicalExpression, LogicalOp, MemberExpression,
    MemberProperty, NewExpression, ObjectProperty, ObjectPropertyKind, PropertyName,
    UnaryExpression, UnaryOp, UpdateExpression, UpdateOp,
};
use crate::error::JsError;
use crate::interpreter::Scope;
use crate::interpreter::coerce::{self, to_number, to_object, to_property_key};
use crate::interpreter::function::{call_function, construct, make_closure};
use crate::interpreter::property::{delete_property, get_value_property, set_value_property};
use crate::interpreter::tasks::suspension_point;
use crate::value::{JsString, JsValue, ObjectKind, Property, PropertyKey, PropertyValue};

/// Evaluate an expression against `scope`
pub fn evaluate<'a>(
    scope: &'a Scope,
    expr: &'a Expression,
) -> LocalBoxFuture<'a, Result<JsValue, JsError>> {
    Box::pin(async move {
        match expr {
            Expression::Literal(lit) => Ok(literal_value(lit)),
            Expression::Identifier(name) => scope.get(name),
            Expression::This => Ok(scope.this()),
            Expression::Array(elements) => evaluate_array(scope, elements).await,
            Expression::Object(props) => evaluate_object(scope, props).await,
            Expression::Function(def) => make_closure(scope, def),
            Expression::Unary(unary) => evaluate_unary(scope, unary).await,
            Expression::Update(update) => evaluate_update(scope, update).await,
            Expression::Binary(binary) => {
                let left = evaluate(scope, &binary.left).await?;
                let right = evaluate(scope, &binary.right).await?;
                coerce::binary_operator(scope, binary.operator, &left, &right).await
            }
            Expression::Logical(logical) => evaluate_logical(scope, logical).await,
            Expression::Conditional(cond) => {
                if evaluate(scope, &cond.test).await?.to_boolean() {
                    evaluate(scope, &cond.consequent).await
                } else {
                    evaluate(scope, &cond.alternate).await
                }
            }
            Expression::Assignment(assign) => evaluate_assignment(scope, assign).await,
            Expression::Sequence(exprs) => {
                let mut last = JsValue::Undefined;
                for expr in exprs {
                    last = evaluate(scope, expr).await?;
                }
                Ok(last)
            }
            Expression::Member(member) => Ok(evaluate_member(scope, member).await?.1),
            Expression::Call(call) => evaluate_call(scope, call).await,
            Expression::New(new_expr) => evaluate_new(scope, new_expr).await,
            Expression::Await(argument) => evaluate_await(scope, argument).await,
        }
    })
}

fn literal_value(lit: &Literal) -> JsValue {
    match lit {
        Literal::Undefined => JsValue::Undefined,
        Literal::Null => JsValue::Null,
        Literal::Boolean(b) => JsValue::Boolean(*b),
        Literal::Number(n) => JsValue::Number(*n),
        Literal::String(s) => JsValue::from(s.as_str()),
    }
}

/// Short source-like text for error messages
fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member(member) => match &member.property {
            MemberProperty::Identifier(name) => format!("{}.{}", describe(&member.object), name),
            MemberProperty::Expression(_) => format!("{}[...]", describe(&member.object)),
        },
        Expression::Call(call) => format!("{}(...)", describe(&call.callee)),
        _ => "expression".to_string(),
    }
}

/// Values produced by spreading or `for-of` over `value`.
///
/// Arrays yield their elements, strings their characters.
pub(crate) fn iterate_values(value: &JsValue) -> Result<Vec<JsValue>, JsError> {
    let string_chars = |s: &JsString| {
        s.as_str()
            .chars()
            .map(|c| JsValue::from(c.to_string()))
            .collect::<Vec<_>>()
    };
    match value {
        JsValue::String(s) => Ok(string_chars(s)),
        JsValue::Object(obj) => {
            let obj = obj.borrow();
            match &obj.kind {
                ObjectKind::Array { length } => obj.collect_elements(*length),
                ObjectKind::Primitive(JsValue::String(s)) => Ok(string_chars(s)),
                _ => Err(JsError::type_error(format!("{:?} is not iterable", value))),
            }
        }
        _ => Err(JsError::type_error(format!("{:?} is not iterable", value))),
    }
}

pub(crate) async fn evaluate_arguments(
    scope: &Scope,
    arguments: &[Argument],
) -> Result<Vec<JsValue>, JsError> {
    let mut args = Vec::with_capacity(arguments.len());
    for arg in arguments {
        match arg {
            Argument::Expression(expr) => args.push(evaluate(scope, expr).await?),
            Argument::Spread(expr) => {
                let value = evaluate(scope, expr).await?;
                args.extend(iterate_values(&value)?);
            }
        }
    }
    Ok(args)
}

async fn evaluate_array(scope: &Scope, elements: &[ArrayElement]) -> Result<JsValue, JsError> {
    // `None` marks an elision
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            ArrayElement::Expression(expr) => values.push(Some(evaluate(scope, expr).await?)),
            ArrayElement::Spread(expr) => {
                let value = evaluate(scope, expr).await?;
                values.extend(iterate_values(&value)?.into_iter().map(Some));
            }
            ArrayElement::Hole => values.push(None),
        }
    }
    let length =
        u32::try_from(values.len()).map_err(|_| JsError::range_error("Invalid array length"))?;
    let array = scope.realm().create_array_with_length(length);
    {
        let mut array = array.borrow_mut();
        for (i, value) in (0u32..).zip(values) {
            if let Some(value) = value {
                array.write_own_slot(PropertyKey::Index(i), value);
            }
        }
    }
    Ok(JsValue::Object(array))
}

async fn evaluate_object(scope: &Scope, props: &[ObjectProperty]) -> Result<JsValue, JsError> {
    let obj = scope.realm().create_object();
    for prop in props {
        let key = match &prop.key {
            PropertyName::Identifier(name) => PropertyKey::from(name.as_str()),
            PropertyName::Computed(expr) => {
                let value = evaluate(scope, expr).await?;
                to_property_key(scope, &value).await?
            }
        };
        let property = match &prop.kind {
            ObjectPropertyKind::Init(expr) => Property::data(evaluate(scope, expr).await?),
            ObjectPropertyKind::Get(def) | ObjectPropertyKind::Set(def) => {
                let func = make_closure(scope, def)?;
                let existing = obj.borrow().get_own_property(&key);
                let (getter, setter) = match existing.map(|p| p.value) {
                    Some(PropertyValue::BackedField { getter, setter }) => (getter, setter),
                    _ => (None, None),
                };
                if matches!(prop.kind, ObjectPropertyKind::Get(_)) {
                    Property::accessor(Some(func), setter)
                } else {
                    Property::accessor(getter, Some(func))
                }
            }
        };
        obj.borrow_mut().properties.insert(key, property);
    }
    Ok(JsValue::Object(obj))
}

async fn member_key(scope: &Scope, property: &MemberProperty) -> Result<PropertyKey, JsError> {
    match property {
        MemberProperty::Identifier(name) => Ok(PropertyKey::from(name.as_str())),
        MemberProperty::Expression(expr) => {
            let value = evaluate(scope, expr).await?;
            to_property_key(scope, &value).await
        }
    }
}

/// Evaluate a member expression to `(base, value)`.
///
/// An optional link on a nullish base yields `undefined` without reading.
async fn evaluate_member(
    scope: &Scope,
    member: &MemberExpression,
) -> Result<(JsValue, JsValue), JsError> {
    let base = evaluate(scope, &member.object).await?;
    if member.optional && base.is_null_or_undefined() {
        return Ok((base, JsValue::Undefined));
    }
    let key = member_key(scope, &member.property).await?;
    let value = get_value_property(scope, &base, &key).await?;
    Ok((base, value))
}

async fn evaluate_call(scope: &Scope, call: &CallExpression) -> Result<JsValue, JsError> {
    let (this, callee) = match call.callee.as_ref() {
        Expression::Member(member) => {
            let (base, func) = evaluate_member(scope, member).await?;
            if member.optional && base.is_null_or_undefined() {
                return Ok(JsValue::Undefined);
            }
            (base, func)
        }
        other => (JsValue::Undefined, evaluate(scope, other).await?),
    };
    if call.optional && callee.is_null_or_undefined() {
        return Ok(JsValue::Undefined);
    }
    let args = evaluate_arguments(scope, &call.arguments).await?;
    if !callee.is_callable() {
        return Err(JsError::type_error(format!(
            "{} is not a function",
            describe(&call.callee)
        )));
    }
    call_function(scope, callee, this, args).await
}

async fn evaluate_new(scope: &Scope, new_expr: &NewExpression) -> Result<JsValue, JsError> {
    let callee = evaluate(scope, &new_expr.callee).await?;
    let args = evaluate_arguments(scope, &new_expr.arguments).await?;
    if !callee.is_callable() {
        return Err(JsError::type_error(format!(
            "{} is not a constructor",
            describe(&new_expr.callee)
        )));
    }
    construct(scope, &callee, args).await
}

/// `await expr`: tasks are joined at a suspension point, any other value
/// passes through unchanged
async fn evaluate_await(scope: &Scope, argument: &Expression) -> Result<JsValue, JsError> {
    let value = evaluate(scope, argument).await?;
    let handle = match &value {
        JsValue::Object(obj) => match &obj.borrow().kind {
            ObjectKind::Task(handle) => Some(handle.clone()),
            _ => None,
        },
        _ => None,
    };
    match handle {
        Some(handle) => suspension_point(scope, handle.join(), "await").await,
        None => Ok(value),
    }
}

async fn evaluate_logical(scope: &Scope, logical: &LogicalExpression) -> Result<JsValue, JsError> {
    let left = evaluate(scope, &logical.left).await?;
    let short_circuit = match logical.operator {
        LogicalOp::And => !left.to_boolean(),
        LogicalOp::Or => left.to_boolean(),
        LogicalOp::NullishCoalescing => !left.is_null_or_undefined(),
    };
    if short_circuit {
        Ok(left)
    } else {
        evaluate(scope, &logical.right).await
    }
}

async fn evaluate_unary(scope: &Scope, unary: &UnaryExpression) -> Result<JsValue, JsError> {
    match unary.operator {
        UnaryOp::Typeof => {
            if let Expression::Identifier(name) = unary.argument.as_ref() {
                if !scope.contains(name) {
                    return Ok(JsValue::from("undefined"));
                }
            }
            let value = evaluate(scope, &unary.argument).await?;
            Ok(JsValue::from(value.type_of()))
        }
        UnaryOp::Delete => evaluate_delete(scope, &unary.argument).await,
        op => {
            let value = evaluate(scope, &unary.argument).await?;
            match op {
                UnaryOp::Minus => coerce::neg(scope, &value).await,
                UnaryOp::Plus => coerce::pos(scope, &value).await,
                UnaryOp::BitNot => coerce::bit_not(scope, &value).await,
                UnaryOp::Not => Ok(JsValue::Boolean(!value.to_boolean())),
                _ => Ok(JsValue::Undefined),
            }
        }
    }
}

async fn evaluate_delete(scope: &Scope, argument: &Expression) -> Result<JsValue, JsError> {
    match argument {
        Expression::Member(member) => {
            let base = evaluate(scope, &member.object).await?;
            if member.optional && base.is_null_or_undefined() {
                return Ok(JsValue::Boolean(true));
            }
            let key = member_key(scope, &member.property).await?;
            let obj = to_object(scope, &base)?;
            Ok(JsValue::Boolean(delete_property(scope, &obj, &key)?))
        }
        Expression::Identifier(name) => {
            if scope.is_strict() {
                return Err(JsError::syntax_error(
                    "Delete of an unqualified identifier in strict mode",
                ));
            }
            Ok(JsValue::Boolean(scope.delete(name)))
        }
        other => {
            evaluate(scope, other).await?;
            Ok(JsValue::Boolean(true))
        }
    }
}

/// Resolved assignment target
enum Reference {
    Binding(JsString),
    Property { base: JsValue, key: PropertyKey },
}

impl Reference {
    async fn get(&self, scope: &Scope) -> Result<JsValue, JsError> {
        match self {
            Reference::Binding(name) => scope.get(name.as_str()),
            Reference::Property { base, key } => get_value_property(scope, base, key).await,
        }
    }

    async fn put(&self, scope: &Scope, value: JsValue) -> Result<(), JsError> {
        match self {
            Reference::Binding(name) => scope.set(name, value, None),
            Reference::Property { base, key } => {
                set_value_property(scope, base, key.clone(), value).await
            }
        }
    }
}

async fn member_reference(scope: &Scope, member: &MemberExpression) -> Result<Reference, JsError> {
    let base = evaluate(scope, &member.object).await?;
    let key = member_key(scope, &member.property).await?;
    Ok(Reference::Property { base, key })
}

async fn target_reference(scope: &Scope, target: &AssignmentTarget) -> Result<Reference, JsError> {
    match target {
        AssignmentTarget::Identifier(name) => Ok(Reference::Binding(JsString::from(name.as_str()))),
        AssignmentTarget::Member(member) => member_reference(scope, member).await,
    }
}

async fn evaluate_update(scope: &Scope, update: &UpdateExpression) -> Result<JsValue, JsError> {
    let reference = match update.argument.as_ref() {
        Expression::Identifier(name) => Reference::Binding(JsString::from(name.as_str())),
        Expression::Member(member) => member_reference(scope, member).await?,
        _ => {
            return Err(JsError::syntax_error(
                "Invalid left-hand side expression in update operation",
            ));
        }
    };
    let old = JsValue::Number(to_number(scope, &reference.get(scope).await?).await?);
    let new = match update.operator {
        UpdateOp::Increment => coerce::inc(scope, &old).await?,
        UpdateOp::Decrement => coerce::dec(scope, &old).await?,
    };
    reference.put(scope, new.clone()).await?;
    Ok(if update.prefix { new } else { old })
}

async fn evaluate_assignment(
    scope: &Scope,
    assign: &AssignmentExpression,
) -> Result<JsValue, JsError> {
    let reference = target_reference(scope, &assign.target).await?;
    let value = match assign.operator {
        AssignmentOp::Assign => evaluate(scope, &assign.value).await?,
        AssignmentOp::AndAssign | AssignmentOp::OrAssign | AssignmentOp::NullishAssign => {
            let current = reference.get(scope).await?;
            let keep = match assign.operator {
                AssignmentOp::AndAssign => !current.to_boolean(),
                AssignmentOp::OrAssign => current.to_boolean(),
                _ => !current.is_null_or_undefined(),
            };
            if keep {
                return Ok(current);
            }
            evaluate(scope, &assign.value).await?
        }
        op => {
            let binary = op
                .binary_op()
                .ok_or_else(|| JsError::internal_error("compound assignment without operator"))?;
            let current = reference.get(scope).await?;
            let rhs = evaluate(scope, &assign.value).await?;
            coerce::binary_operator(scope, binary, &current, &rhs).await?
        }
    };
    reference.put(scope, value.clone()).await?;
    Ok(value)
}
