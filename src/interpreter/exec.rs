//! Statement execution
//!
//! Each construct consumes exactly the completion signals it owns: loops
//! take `Break`/`Continue`, `switch` takes `Break`, function bodies take
//! `Return`. Everything else propagates to the caller untouched.

use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::ast::{
    BlockStatement, DeclarationKind, ForBinding, ForInStatement, ForInit, ForOfStatement,
    ForStatement, FunctionDef, Statement, SwitchStatement, TryStatement, VariableDeclaration,
    WhileStatement,
};
use crate::error::JsError;
use crate::interpreter::coerce::to_object;
use crate::interpreter::completion::Completion;
use crate::interpreter::eval::{evaluate, iterate_values};
use crate::interpreter::function::make_closure;
use crate::interpreter::property::{enumerable_keys, has_property};
use crate::interpreter::{Scope, ScopeOptions, VariableKind};
use crate::value::{CheapClone, JsObjectRef, JsString, JsValue, ObjectKind, PropertyKey};

/// Execute one statement
pub fn execute_statement<'a>(
    scope: &'a Scope,
    stmt: &'a Statement,
) -> LocalBoxFuture<'a, Result<Completion, JsError>> {
    Box::pin(async move {
        match stmt {
            Statement::Expression(expr) => Ok(Completion::Normal(evaluate(scope, expr).await?)),

            Statement::VariableDeclaration(decl) => {
                execute_variable_declaration(scope, decl).await?;
                Ok(Completion::empty())
            }

            Statement::FunctionDeclaration(def) => {
                // hoisted already unless it sits outside a statement list
                if let Some(name) = &def.name {
                    if !scope.contains_own(name) {
                        declare_function(scope, def)?;
                    }
                }
                Ok(Completion::empty())
            }

            Statement::Block(block) => execute_block(scope, block).await,

            Statement::If(if_stmt) => {
                let test = evaluate(scope, &if_stmt.test).await?;
                if test.to_boolean() {
                    execute_statement(scope, &if_stmt.consequent).await
                } else if let Some(alt) = &if_stmt.alternate {
                    execute_statement(scope, alt).await
                } else {
                    Ok(Completion::empty())
                }
            }

            Statement::While(while_stmt) => execute_while(scope, while_stmt).await,
            Statement::DoWhile(do_while) => execute_do_while(scope, do_while).await,
            Statement::For(for_stmt) => execute_for(scope, for_stmt).await,
            Statement::ForIn(for_in) => execute_for_in(scope, for_in).await,
            Statement::ForOf(for_of) => execute_for_of(scope, for_of).await,
            Statement::Switch(switch) => execute_switch(scope, switch).await,
            Statement::Try(try_stmt) => execute_try(scope, try_stmt).await,

            Statement::Return(argument) => {
                let value = match argument {
                    Some(expr) => evaluate(scope, expr).await?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break => Ok(Completion::Break),
            Statement::Continue => Ok(Completion::Continue),
            Statement::Throw(expr) => Err(JsError::thrown(evaluate(scope, expr).await?)),
            Statement::Empty => Ok(Completion::empty()),
        }
    })
}

/// Execute a statement list; the result carries the value of the last
/// value-producing statement
pub async fn execute_statements(scope: &Scope, stmts: &[Statement]) -> Result<Completion, JsError> {
    let mut last = JsValue::Undefined;
    for stmt in stmts {
        match execute_statement(scope, stmt).await? {
            Completion::Normal(value) => {
                if !matches!(
                    stmt,
                    Statement::VariableDeclaration(_)
                        | Statement::FunctionDeclaration(_)
                        | Statement::Empty
                ) {
                    last = value;
                }
            }
            abrupt => return Ok(abrupt),
        }
    }
    Ok(Completion::Normal(last))
}

async fn execute_block(scope: &Scope, block: &BlockStatement) -> Result<Completion, JsError> {
    if !block.scoped {
        hoist_functions(scope, &block.body)?;
        return execute_statements(scope, &block.body).await;
    }
    scope
        .with_scope(ScopeOptions::new(), |inner| async move {
            hoist_functions(&inner, &block.body)?;
            execute_statements(&inner, &block.body).await
        })
        .await
}

// ═══════════════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════════════

/// Hoist a function or program body: `var` names (including those nested in
/// blocks and loops) into the nearest function frame, then function
/// declarations of this statement list
pub fn hoist_declarations(scope: &Scope, body: &[Statement]) -> Result<(), JsError> {
    let mut names = Vec::new();
    collect_var_names(body, &mut names);
    for name in names {
        scope.declare_var(&JsString::from(name))?;
    }
    hoist_functions(scope, body)
}

fn hoist_functions(scope: &Scope, body: &[Statement]) -> Result<(), JsError> {
    for stmt in body {
        if let Statement::FunctionDeclaration(def) = stmt {
            declare_function(scope, def)?;
        }
    }
    Ok(())
}

fn declare_function(scope: &Scope, def: &Rc<FunctionDef>) -> Result<(), JsError> {
    let name = def
        .name
        .as_deref()
        .ok_or_else(|| JsError::syntax_error("Function statements require a function name"))?;
    let closure = make_closure(scope, def)?;
    let kind = if scope.parent().is_none() {
        VariableKind::Global
    } else {
        VariableKind::Local
    };
    scope.set(&JsString::from(name), closure, Some(kind))
}

fn collect_var_names<'a>(body: &'a [Statement], names: &mut Vec<&'a str>) {
    for stmt in body {
        collect_var_names_in(stmt, names);
    }
}

fn collect_var_names_in<'a>(stmt: &'a Statement, names: &mut Vec<&'a str>) {
    let var_binding = |binding: &'a ForBinding, names: &mut Vec<&'a str>| {
        if binding.kind == Some(DeclarationKind::Var) {
            names.push(binding.name.as_str());
        }
    };
    match stmt {
        Statement::VariableDeclaration(decl) if decl.kind == DeclarationKind::Var => {
            names.extend(decl.declarations.iter().map(|d| d.name.as_str()));
        }
        Statement::Block(block) => collect_var_names(&block.body, names),
        Statement::If(if_stmt) => {
            collect_var_names_in(&if_stmt.consequent, names);
            if let Some(alt) = &if_stmt.alternate {
                collect_var_names_in(alt, names);
            }
        }
        Statement::While(w) | Statement::DoWhile(w) => collect_var_names_in(&w.body, names),
        Statement::For(f) => {
            if let Some(ForInit::Variable(decl)) = &f.init {
                if decl.kind == DeclarationKind::Var {
                    names.extend(decl.declarations.iter().map(|d| d.name.as_str()));
                }
            }
            collect_var_names_in(&f.body, names);
        }
        Statement::ForIn(f) => {
            var_binding(&f.left, names);
            collect_var_names_in(&f.body, names);
        }
        Statement::ForOf(f) => {
            var_binding(&f.left, names);
            collect_var_names_in(&f.body, names);
        }
        Statement::Switch(switch) => {
            for case in &switch.cases {
                collect_var_names(&case.consequent, names);
            }
        }
        Statement::Try(t) => {
            collect_var_names(&t.block.body, names);
            if let Some(handler) = &t.handler {
                collect_var_names(&handler.body.body, names);
            }
            if let Some(finalizer) = &t.finalizer {
                collect_var_names(&finalizer.body, names);
            }
        }
        _ => {}
    }
}

async fn execute_variable_declaration(
    scope: &Scope,
    decl: &VariableDeclaration,
) -> Result<(), JsError> {
    for declarator in &decl.declarations {
        let name = JsString::from(declarator.name.as_str());
        match decl.kind {
            DeclarationKind::Var => match &declarator.init {
                Some(init) => {
                    let value = evaluate(scope, init).await?;
                    scope.assign_var(&name, value)?;
                }
                None => scope.declare_var(&name)?,
            },
            DeclarationKind::Let => {
                let value = match &declarator.init {
                    Some(init) => evaluate(scope, init).await?,
                    None => JsValue::Undefined,
                };
                scope.set(&name, value, Some(VariableKind::Local))?;
            }
            DeclarationKind::Const => {
                let init = declarator.init.as_ref().ok_or_else(|| {
                    JsError::syntax_error("Missing initializer in const declaration")
                })?;
                let value = evaluate(scope, init).await?;
                scope.set(&name, value, Some(VariableKind::Const))?;
            }
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loops
// ═══════════════════════════════════════════════════════════════════════════════

/// What a loop does after one body completion
enum LoopControl {
    Next,
    Exit,
    Return(JsValue),
}

fn loop_control(completion: Completion) -> LoopControl {
    match completion {
        Completion::Normal(_) | Completion::Continue => LoopControl::Next,
        Completion::Break => LoopControl::Exit,
        Completion::Return(value) => LoopControl::Return(value),
    }
}

async fn execute_while(scope: &Scope, while_stmt: &WhileStatement) -> Result<Completion, JsError> {
    loop {
        let test = evaluate(scope, &while_stmt.test).await?;
        if !test.to_boolean() {
            break;
        }
        match loop_control(execute_statement(scope, &while_stmt.body).await?) {
            LoopControl::Next => {}
            LoopControl::Exit => break,
            LoopControl::Return(value) => return Ok(Completion::Return(value)),
        }
    }
    Ok(Completion::empty())
}

async fn execute_do_while(scope: &Scope, do_while: &WhileStatement) -> Result<Completion, JsError> {
    loop {
        match loop_control(execute_statement(scope, &do_while.body).await?) {
            LoopControl::Next => {}
            LoopControl::Exit => break,
            LoopControl::Return(value) => return Ok(Completion::Return(value)),
        }
        let test = evaluate(scope, &do_while.test).await?;
        if !test.to_boolean() {
            break;
        }
    }
    Ok(Completion::empty())
}

async fn execute_for(scope: &Scope, for_stmt: &ForStatement) -> Result<Completion, JsError> {
    let loop_scope = scope.child(ScopeOptions::new())?;
    let mut per_iteration = Vec::new();
    match &for_stmt.init {
        Some(ForInit::Variable(decl)) => {
            execute_variable_declaration(&loop_scope, decl).await?;
            if decl.kind != DeclarationKind::Var {
                per_iteration.extend(
                    decl.declarations
                        .iter()
                        .map(|d| JsString::from(d.name.as_str())),
                );
            }
        }
        Some(ForInit::Expression(expr)) => {
            evaluate(&loop_scope, expr).await?;
        }
        None => {}
    }

    // lexical loop variables get a fresh copy per iteration so closures
    // created in the body observe that iteration's value
    let mut current = if per_iteration.is_empty() {
        loop_scope
    } else {
        loop_scope.fork_bindings(scope, &per_iteration)?
    };
    loop {
        if let Some(test) = &for_stmt.test {
            if !evaluate(&current, test).await?.to_boolean() {
                break;
            }
        }
        match loop_control(execute_statement(&current, &for_stmt.body).await?) {
            LoopControl::Next => {}
            LoopControl::Exit => break,
            LoopControl::Return(value) => return Ok(Completion::Return(value)),
        }
        if !per_iteration.is_empty() {
            current = current.fork_bindings(scope, &per_iteration)?;
        }
        if let Some(update) = &for_stmt.update {
            evaluate(&current, update).await?;
        }
    }
    Ok(Completion::empty())
}

/// Bind the loop variable of a for-in/for-of iteration
fn bind_loop_variable(scope: &Scope, binding: &ForBinding, value: JsValue) -> Result<Scope, JsError> {
    let name = JsString::from(binding.name.as_str());
    match binding.kind {
        None => {
            scope.set(&name, value, None)?;
            Ok(scope.cheap_clone())
        }
        Some(DeclarationKind::Var) => {
            scope.assign_var(&name, value)?;
            Ok(scope.cheap_clone())
        }
        Some(DeclarationKind::Let) => {
            scope.child(ScopeOptions::new().binding(name, VariableKind::Local, value))
        }
        Some(DeclarationKind::Const) => {
            scope.child(ScopeOptions::new().binding(name, VariableKind::Const, value))
        }
    }
}

async fn execute_for_in(scope: &Scope, for_in: &ForInStatement) -> Result<Completion, JsError> {
    let right = evaluate(scope, &for_in.right).await?;
    if right.is_null_or_undefined() {
        return Ok(Completion::empty());
    }
    let obj = to_object(scope, &right)?;
    for key in enumerable_keys(&obj) {
        // keys deleted by an earlier iteration are skipped
        if !has_property(&obj, &key) {
            continue;
        }
        let iteration = bind_loop_variable(scope, &for_in.left, key.to_value())?;
        match loop_control(execute_statement(&iteration, &for_in.body).await?) {
            LoopControl::Next => {}
            LoopControl::Exit => break,
            LoopControl::Return(value) => return Ok(Completion::Return(value)),
        }
    }
    Ok(Completion::empty())
}

/// Element `index` while it is below the live length; holes read as `undefined`
fn array_element(array: &JsObjectRef, index: u32) -> Option<JsValue> {
    let array = array.borrow();
    let length = array.array_length()?;
    (index < length).then(|| array.element(index))
}

async fn execute_for_of(scope: &Scope, for_of: &ForOfStatement) -> Result<Completion, JsError> {
    let right = evaluate(scope, &for_of.right).await?;
    let live_array = match &right {
        JsValue::Object(obj) if matches!(obj.borrow().kind, ObjectKind::Array { .. }) => {
            Some(obj.cheap_clone())
        }
        _ => None,
    };

    // arrays are read live so elements pushed by the body are visited
    let snapshot = match live_array {
        Some(_) => Vec::new(),
        None => iterate_values(&right)?,
    };
    let mut index: u32 = 0;
    loop {
        let value = match &live_array {
            Some(array) => array_element(array, index),
            None => snapshot.get(index as usize).cloned(),
        };
        let Some(value) = value else {
            break;
        };
        index += 1;
        let iteration = bind_loop_variable(scope, &for_of.left, value)?;
        match loop_control(execute_statement(&iteration, &for_of.body).await?) {
            LoopControl::Next => {}
            LoopControl::Exit => break,
            LoopControl::Return(value) => return Ok(Completion::Return(value)),
        }
    }
    Ok(Completion::empty())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Switch / try
// ═══════════════════════════════════════════════════════════════════════════════

async fn execute_switch(scope: &Scope, switch: &SwitchStatement) -> Result<Completion, JsError> {
    let discriminant = evaluate(scope, &switch.discriminant).await?;
    let switch_scope = scope.child(ScopeOptions::new())?;
    for case in &switch.cases {
        hoist_functions(&switch_scope, &case.consequent)?;
    }

    let mut start = None;
    for (index, case) in switch.cases.iter().enumerate() {
        if let Some(test) = &case.test {
            let value = evaluate(&switch_scope, test).await?;
            if value.strict_equals(&discriminant) {
                start = Some(index);
                break;
            }
        }
    }
    let start = start.or_else(|| switch.cases.iter().position(|case| case.test.is_none()));
    let Some(start) = start else {
        return Ok(Completion::empty());
    };

    let mut last = JsValue::Undefined;
    for case in switch.cases.iter().skip(start) {
        match execute_statements(&switch_scope, &case.consequent).await? {
            Completion::Normal(value) => last = value,
            Completion::Break => return Ok(Completion::Normal(last)),
            // continue belongs to the enclosing loop
            other => return Ok(other),
        }
    }
    Ok(Completion::Normal(last))
}

/// Script-visible value for a caught error
fn error_value(scope: &Scope, err: JsError) -> JsValue {
    if let JsError::Thrown(value) = err {
        return value;
    }
    let obj = scope.realm().create_object();
    {
        let mut o = obj.borrow_mut();
        o.write_own_slot(PropertyKey::from("name"), JsValue::from(err.name()));
        o.write_own_slot(PropertyKey::from("message"), JsValue::from(err.message()));
    }
    JsValue::Object(obj)
}

async fn execute_try(scope: &Scope, try_stmt: &TryStatement) -> Result<Completion, JsError> {
    let result = execute_block(scope, &try_stmt.block).await;
    let result = match (result, &try_stmt.handler) {
        (Err(err), Some(handler)) if err.is_catchable() => {
            let value = error_value(scope, err);
            let mut options = ScopeOptions::new();
            if let Some(param) = &handler.param {
                options = options.binding(param.as_str(), VariableKind::Local, value);
            }
            scope
                .with_scope(options, |inner| async move {
                    hoist_functions(&inner, &handler.body.body)?;
                    execute_statements(&inner, &handler.body.body).await
                })
                .await
        }
        (result, _) => result,
    };

    // uncatchable failures abort the invocation without running user code
    if matches!(&result, Err(err) if !err.is_catchable()) {
        return result;
    }
    if let Some(finalizer) = &try_stmt.finalizer {
        match execute_block(scope, finalizer).await? {
            Completion::Normal(_) => {}
            abrupt => return Ok(abrupt),
        }
    }
    result
}
