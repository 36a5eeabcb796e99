//! Terse constructors for program trees
//!
//! Each helper mirrors one piece of surface syntax, so a test reads close to
//! the script it stands for.

#![allow(dead_code)]

use std::rc::Rc;

use jseval::ast::*;

// ============ PROGRAMS ============

pub fn program(body: Vec<Statement>) -> Program {
    Program::new(body)
}

pub fn strict_program(body: Vec<Statement>) -> Program {
    Program { body, strict: true }
}

// ============ LITERALS ============

pub fn num(n: f64) -> Expression {
    Expression::Literal(Literal::Number(n))
}

pub fn string(s: &str) -> Expression {
    Expression::Literal(Literal::String(s.to_string()))
}

pub fn boolean(b: bool) -> Expression {
    Expression::Literal(Literal::Boolean(b))
}

pub fn null() -> Expression {
    Expression::Literal(Literal::Null)
}

pub fn undefined() -> Expression {
    Expression::Literal(Literal::Undefined)
}

pub fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_string())
}

pub fn this() -> Expression {
    Expression::This
}

pub fn array(items: Vec<Expression>) -> Expression {
    Expression::Array(items.into_iter().map(ArrayElement::Expression).collect())
}

/// `{ a: 1, b: 2 }`
pub fn object(props: Vec<(&str, Expression)>) -> Expression {
    object_with(props.into_iter().map(|(name, value)| prop(name, value)).collect())
}

pub fn object_with(props: Vec<ObjectProperty>) -> Expression {
    Expression::Object(props)
}

pub fn prop(name: &str, value: Expression) -> ObjectProperty {
    ObjectProperty {
        key: PropertyName::Identifier(name.to_string()),
        kind: ObjectPropertyKind::Init(value),
    }
}

pub fn computed_prop(key: Expression, value: Expression) -> ObjectProperty {
    ObjectProperty {
        key: PropertyName::Computed(Box::new(key)),
        kind: ObjectPropertyKind::Init(value),
    }
}

/// `name() { body }` shorthand method
pub fn method_prop(name: &str, params: Vec<Param>, body: Vec<Statement>) -> ObjectProperty {
    prop(name, func_expr(params, body))
}

pub fn getter(name: &str, body: Vec<Statement>) -> ObjectProperty {
    ObjectProperty {
        key: PropertyName::Identifier(name.to_string()),
        kind: ObjectPropertyKind::Get(function(None, vec![], body)),
    }
}

pub fn setter(name: &str, param_name: &str, body: Vec<Statement>) -> ObjectProperty {
    ObjectProperty {
        key: PropertyName::Identifier(name.to_string()),
        kind: ObjectPropertyKind::Set(function(None, vec![param(param_name)], body)),
    }
}

// ============ OPERATORS ============

pub fn bin(operator: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn add(left: Expression, right: Expression) -> Expression {
    bin(BinaryOp::Add, left, right)
}

pub fn sub(left: Expression, right: Expression) -> Expression {
    bin(BinaryOp::Sub, left, right)
}

pub fn mul(left: Expression, right: Expression) -> Expression {
    bin(BinaryOp::Mul, left, right)
}

pub fn lt(left: Expression, right: Expression) -> Expression {
    bin(BinaryOp::Lt, left, right)
}

pub fn strict_eq(left: Expression, right: Expression) -> Expression {
    bin(BinaryOp::StrictEq, left, right)
}

pub fn logical(operator: LogicalOp, left: Expression, right: Expression) -> Expression {
    Expression::Logical(LogicalExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(operator: UnaryOp, argument: Expression) -> Expression {
    Expression::Unary(UnaryExpression {
        operator,
        argument: Box::new(argument),
    })
}

pub fn type_of(argument: Expression) -> Expression {
    unary(UnaryOp::Typeof, argument)
}

pub fn increment(argument: Expression, prefix: bool) -> Expression {
    Expression::Update(UpdateExpression {
        operator: UpdateOp::Increment,
        prefix,
        argument: Box::new(argument),
    })
}

pub fn conditional(test: Expression, consequent: Expression, alternate: Expression) -> Expression {
    Expression::Conditional(ConditionalExpression {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    })
}

pub fn sequence(exprs: Vec<Expression>) -> Expression {
    Expression::Sequence(exprs)
}

/// `name = value`
pub fn assign(name: &str, value: Expression) -> Expression {
    assign_op(AssignmentOp::Assign, AssignmentTarget::Identifier(name.to_string()), value)
}

/// `object.name = value`
pub fn assign_member(object: Expression, name: &str, value: Expression) -> Expression {
    assign_op(
        AssignmentOp::Assign,
        AssignmentTarget::Member(member_expression(object, name, false)),
        value,
    )
}

/// `object[key] = value`
pub fn assign_index(object: Expression, key: Expression, value: Expression) -> Expression {
    assign_op(
        AssignmentOp::Assign,
        AssignmentTarget::Member(MemberExpression {
            object: Box::new(object),
            property: MemberProperty::Expression(Box::new(key)),
            optional: false,
        }),
        value,
    )
}

/// `name += value`
pub fn add_assign(name: &str, value: Expression) -> Expression {
    assign_op(AssignmentOp::AddAssign, AssignmentTarget::Identifier(name.to_string()), value)
}

pub fn assign_op(operator: AssignmentOp, target: AssignmentTarget, value: Expression) -> Expression {
    Expression::Assignment(AssignmentExpression {
        operator,
        target,
        value: Box::new(value),
    })
}

pub fn await_(argument: Expression) -> Expression {
    Expression::Await(Box::new(argument))
}

// ============ MEMBERS AND CALLS ============

fn member_expression(object: Expression, name: &str, optional: bool) -> MemberExpression {
    MemberExpression {
        object: Box::new(object),
        property: MemberProperty::Identifier(name.to_string()),
        optional,
    }
}

/// `object.name`
pub fn member(object: Expression, name: &str) -> Expression {
    Expression::Member(member_expression(object, name, false))
}

/// `object?.name`
pub fn optional_member(object: Expression, name: &str) -> Expression {
    Expression::Member(member_expression(object, name, true))
}

/// `object[key]`
pub fn index(object: Expression, key: Expression) -> Expression {
    Expression::Member(MemberExpression {
        object: Box::new(object),
        property: MemberProperty::Expression(Box::new(key)),
        optional: false,
    })
}

pub fn call(callee: Expression, args: Vec<Expression>) -> Expression {
    Expression::Call(CallExpression {
        callee: Box::new(callee),
        arguments: args.into_iter().map(Argument::Expression).collect(),
        optional: false,
    })
}

/// `callee(...spread)`
pub fn call_spread(callee: Expression, spread: Expression) -> Expression {
    Expression::Call(CallExpression {
        callee: Box::new(callee),
        arguments: vec![Argument::Spread(spread)],
        optional: false,
    })
}

/// `object.name(args)`
pub fn method(object: Expression, name: &str, args: Vec<Expression>) -> Expression {
    call(member(object, name), args)
}

pub fn new(callee: Expression, args: Vec<Expression>) -> Expression {
    Expression::New(NewExpression {
        callee: Box::new(callee),
        arguments: args.into_iter().map(Argument::Expression).collect(),
    })
}

// ============ FUNCTIONS ============

pub fn param(name: &str) -> Param {
    Param {
        name: name.to_string(),
        default: None,
        rest: false,
    }
}

pub fn default_param(name: &str, default: Expression) -> Param {
    Param {
        name: name.to_string(),
        default: Some(default),
        rest: false,
    }
}

pub fn rest(name: &str) -> Param {
    Param {
        name: name.to_string(),
        default: None,
        rest: true,
    }
}

pub fn params(names: &[&str]) -> Vec<Param> {
    names.iter().map(|name| param(name)).collect()
}

pub fn function(name: Option<&str>, params: Vec<Param>, body: Vec<Statement>) -> Rc<FunctionDef> {
    Rc::new(FunctionDef {
        name: name.map(str::to_string),
        params,
        body: FunctionBody::Block(body),
        ..FunctionDef::default()
    })
}

/// `function (params) { body }`
pub fn func_expr(params: Vec<Param>, body: Vec<Statement>) -> Expression {
    Expression::Function(function(None, params, body))
}

/// `async function (params) { body }`
pub fn async_func_expr(params: Vec<Param>, body: Vec<Statement>) -> Expression {
    Expression::Function(Rc::new(FunctionDef {
        params,
        body: FunctionBody::Block(body),
        async_: true,
        ..FunctionDef::default()
    }))
}

/// `(params) => expr`
pub fn arrow(params: Vec<Param>, body: Expression) -> Expression {
    Expression::Function(Rc::new(FunctionDef {
        params,
        body: FunctionBody::Expression(Box::new(body)),
        arrow: true,
        ..FunctionDef::default()
    }))
}

/// `function name(params) { body }`
pub fn func_decl(name: &str, params: Vec<Param>, body: Vec<Statement>) -> Statement {
    Statement::FunctionDeclaration(function(Some(name), params, body))
}

/// `async function name(params) { body }`
pub fn async_func_decl(name: &str, params: Vec<Param>, body: Vec<Statement>) -> Statement {
    Statement::FunctionDeclaration(Rc::new(FunctionDef {
        name: Some(name.to_string()),
        params,
        body: FunctionBody::Block(body),
        async_: true,
        ..FunctionDef::default()
    }))
}

// ============ STATEMENTS ============

pub fn expr(expression: Expression) -> Statement {
    Statement::Expression(expression)
}

fn declaration(kind: DeclarationKind, name: &str, init: Option<Expression>) -> Statement {
    Statement::VariableDeclaration(VariableDeclaration {
        kind,
        declarations: vec![VariableDeclarator {
            name: name.to_string(),
            init,
        }],
    })
}

pub fn var(name: &str, init: Expression) -> Statement {
    declaration(DeclarationKind::Var, name, Some(init))
}

pub fn let_(name: &str, init: Expression) -> Statement {
    declaration(DeclarationKind::Let, name, Some(init))
}

pub fn const_(name: &str, init: Expression) -> Statement {
    declaration(DeclarationKind::Const, name, Some(init))
}

/// `const name;`, rejected when the program is compiled
pub fn const_uninit(name: &str) -> Statement {
    declaration(DeclarationKind::Const, name, None)
}

pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block(BlockStatement { body, scoped: true })
}

pub fn if_(test: Expression, consequent: Statement, alternate: Option<Statement>) -> Statement {
    Statement::If(IfStatement {
        test,
        consequent: Box::new(consequent),
        alternate: alternate.map(Box::new),
    })
}

pub fn while_(test: Expression, body: Vec<Statement>) -> Statement {
    Statement::While(WhileStatement {
        test,
        body: Box::new(block(body)),
    })
}

/// `for (let name = init; test; update) { body }`
pub fn for_let(
    name: &str,
    init: Expression,
    test: Expression,
    update: Expression,
    body: Vec<Statement>,
) -> Statement {
    Statement::For(ForStatement {
        init: Some(ForInit::Variable(VariableDeclaration {
            kind: DeclarationKind::Let,
            declarations: vec![VariableDeclarator {
                name: name.to_string(),
                init: Some(init),
            }],
        })),
        test: Some(test),
        update: Some(update),
        body: Box::new(block(body)),
    })
}

/// `for (const name in right) { body }`
pub fn for_in(name: &str, right: Expression, body: Vec<Statement>) -> Statement {
    Statement::ForIn(ForInStatement {
        left: ForBinding {
            kind: Some(DeclarationKind::Const),
            name: name.to_string(),
        },
        right,
        body: Box::new(block(body)),
    })
}

/// `for (const name of right) { body }`
pub fn for_of(name: &str, right: Expression, body: Vec<Statement>) -> Statement {
    Statement::ForOf(ForOfStatement {
        left: ForBinding {
            kind: Some(DeclarationKind::Const),
            name: name.to_string(),
        },
        right,
        body: Box::new(block(body)),
    })
}

pub fn switch(discriminant: Expression, cases: Vec<(Option<Expression>, Vec<Statement>)>) -> Statement {
    Statement::Switch(SwitchStatement {
        discriminant,
        cases: cases
            .into_iter()
            .map(|(test, consequent)| SwitchCase { test, consequent })
            .collect(),
    })
}

pub fn ret(value: Expression) -> Statement {
    Statement::Return(Some(value))
}

pub fn brk() -> Statement {
    Statement::Break
}

pub fn cont() -> Statement {
    Statement::Continue
}

pub fn throw(value: Expression) -> Statement {
    Statement::Throw(value)
}

/// `try { block } catch (param) { handler }`
pub fn try_catch(body: Vec<Statement>, param: &str, handler: Vec<Statement>) -> Statement {
    Statement::Try(TryStatement {
        block: BlockStatement { body, scoped: true },
        handler: Some(CatchClause {
            param: Some(param.to_string()),
            body: BlockStatement {
                body: handler,
                scoped: true,
            },
        }),
        finalizer: None,
    })
}

/// `try { block } finally { finalizer }`
pub fn try_finally(body: Vec<Statement>, finalizer: Vec<Statement>) -> Statement {
    Statement::Try(TryStatement {
        block: BlockStatement { body, scoped: true },
        handler: None,
        finalizer: Some(BlockStatement {
            body: finalizer,
            scoped: true,
        }),
    })
}
