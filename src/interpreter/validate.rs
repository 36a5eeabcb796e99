//! Early errors
//!
//! Run once over a whole tree before it becomes invocable, so malformed
//! definitions fail when the program is compiled rather than when a
//! function happens to be called.

use crate::ast::{
    Argument, ArrayElement, AssignmentTarget, DeclarationKind, Expression, ForInit, FunctionBody,
    FunctionDef, MemberExpression, MemberProperty, ObjectPropertyKind, Program, PropertyName,
    Statement, VariableDeclaration,
};
use crate::error::JsError;
use crate::interpreter::function::validate_params;

/// Jump targets available at a point inside one function body
#[derive(Debug, Clone, Copy, Default)]
struct JumpContext {
    in_loop: bool,
    in_switch: bool,
}

impl JumpContext {
    fn looping(self) -> Self {
        Self {
            in_loop: true,
            ..self
        }
    }

    fn switching(self) -> Self {
        Self {
            in_switch: true,
            ..self
        }
    }
}

/// Validate a complete program
pub fn validate_program(program: &Program) -> Result<(), JsError> {
    statements(&program.body, JumpContext::default())
}

/// Validate a function definition and everything nested in it
pub fn validate_function(def: &FunctionDef) -> Result<(), JsError> {
    validate_params(def)?;
    for param in &def.params {
        if let Some(default) = &param.default {
            expression(default)?;
        }
    }
    // a function body starts a new jump context
    match &def.body {
        FunctionBody::Block(body) => statements(body, JumpContext::default()),
        FunctionBody::Expression(expr) => expression(expr),
    }
}

fn statements(body: &[Statement], ctx: JumpContext) -> Result<(), JsError> {
    body.iter().try_for_each(|stmt| statement(stmt, ctx))
}

fn variable_declaration(decl: &VariableDeclaration) -> Result<(), JsError> {
    for declarator in &decl.declarations {
        match &declarator.init {
            Some(init) => expression(init)?,
            None if decl.kind == DeclarationKind::Const => {
                return Err(JsError::syntax_error(format!(
                    "Missing initializer in const declaration '{}'",
                    declarator.name
                )));
            }
            None => {}
        }
    }
    Ok(())
}

fn statement(stmt: &Statement, ctx: JumpContext) -> Result<(), JsError> {
    match stmt {
        Statement::VariableDeclaration(decl) => variable_declaration(decl),
        Statement::FunctionDeclaration(def) => {
            if def.name.is_none() {
                return Err(JsError::syntax_error(
                    "Function statements require a function name",
                ));
            }
            validate_function(def)
        }
        Statement::Block(block) => statements(&block.body, ctx),
        Statement::If(if_stmt) => {
            expression(&if_stmt.test)?;
            statement(&if_stmt.consequent, ctx)?;
            match &if_stmt.alternate {
                Some(alt) => statement(alt, ctx),
                None => Ok(()),
            }
        }
        Statement::Switch(switch) => {
            expression(&switch.discriminant)?;
            for case in &switch.cases {
                if let Some(test) = &case.test {
                    expression(test)?;
                }
                statements(&case.consequent, ctx.switching())?;
            }
            Ok(())
        }
        Statement::For(f) => {
            match &f.init {
                Some(ForInit::Variable(decl)) => variable_declaration(decl)?,
                Some(ForInit::Expression(expr)) => expression(expr)?,
                None => {}
            }
            if let Some(test) = &f.test {
                expression(test)?;
            }
            if let Some(update) = &f.update {
                expression(update)?;
            }
            statement(&f.body, ctx.looping())
        }
        Statement::ForIn(f) => {
            expression(&f.right)?;
            statement(&f.body, ctx.looping())
        }
        Statement::ForOf(f) => {
            expression(&f.right)?;
            statement(&f.body, ctx.looping())
        }
        Statement::While(w) | Statement::DoWhile(w) => {
            expression(&w.test)?;
            statement(&w.body, ctx.looping())
        }
        Statement::Try(t) => {
            statements(&t.block.body, ctx)?;
            if let Some(handler) = &t.handler {
                statements(&handler.body.body, ctx)?;
            }
            if let Some(finalizer) = &t.finalizer {
                statements(&finalizer.body, ctx)?;
            }
            Ok(())
        }
        Statement::Return(argument) => match argument {
            Some(expr) => expression(expr),
            None => Ok(()),
        },
        Statement::Break => {
            if ctx.in_loop || ctx.in_switch {
                Ok(())
            } else {
                Err(JsError::syntax_error("Illegal break statement"))
            }
        }
        Statement::Continue => {
            if ctx.in_loop {
                Ok(())
            } else {
                Err(JsError::syntax_error(
                    "Illegal continue statement: no surrounding iteration statement",
                ))
            }
        }
        Statement::Throw(expr) | Statement::Expression(expr) => expression(expr),
        Statement::Empty => Ok(()),
    }
}

fn member(member: &MemberExpression) -> Result<(), JsError> {
    expression(&member.object)?;
    match &member.property {
        MemberProperty::Expression(expr) => expression(expr),
        MemberProperty::Identifier(_) => Ok(()),
    }
}

fn arguments(args: &[Argument]) -> Result<(), JsError> {
    args.iter().try_for_each(|arg| match arg {
        Argument::Expression(expr) | Argument::Spread(expr) => expression(expr),
    })
}

fn expression(expr: &Expression) -> Result<(), JsError> {
    match expr {
        Expression::Literal(_) | Expression::Identifier(_) | Expression::This => Ok(()),
        Expression::Array(elements) => elements.iter().try_for_each(|element| match element {
            ArrayElement::Expression(expr) | ArrayElement::Spread(expr) => expression(expr),
            ArrayElement::Hole => Ok(()),
        }),
        Expression::Object(props) => props.iter().try_for_each(|prop| {
            if let PropertyName::Computed(key) = &prop.key {
                expression(key)?;
            }
            match &prop.kind {
                ObjectPropertyKind::Init(value) => expression(value),
                ObjectPropertyKind::Get(def) | ObjectPropertyKind::Set(def) => {
                    validate_function(def)
                }
            }
        }),
        Expression::Function(def) => validate_function(def),
        Expression::Unary(unary) => expression(&unary.argument),
        Expression::Update(update) => expression(&update.argument),
        Expression::Binary(binary) => {
            expression(&binary.left)?;
            expression(&binary.right)
        }
        Expression::Logical(logical) => {
            expression(&logical.left)?;
            expression(&logical.right)
        }
        Expression::Conditional(cond) => {
            expression(&cond.test)?;
            expression(&cond.consequent)?;
            expression(&cond.alternate)
        }
        Expression::Assignment(assign) => {
            if let AssignmentTarget::Member(target) = &assign.target {
                member(target)?;
            }
            expression(&assign.value)
        }
        Expression::Sequence(exprs) => exprs.iter().try_for_each(expression),
        Expression::Member(m) => member(m),
        Expression::Call(call) => {
            expression(&call.callee)?;
            arguments(&call.arguments)
        }
        Expression::New(new_expr) => {
            expression(&new_expr.callee)?;
            arguments(&new_expr.arguments)
        }
        Expression::Await(argument) => expression(argument),
    }
}
