//! Program tree consumed by the evaluator
//!
//! The tree is produced by an external front end (see [`crate::frontend`]).
//! Every node derives serde so a host can hand over a serialized tree.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A complete program (script or module body)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Statement>,
    /// `"use strict"` directive at the top of the program
    #[serde(default)]
    pub strict: bool,
}

impl Program {
    pub fn new(body: Vec<Statement>) -> Self {
        Self {
            body,
            strict: false,
        }
    }
}

// ============ STATEMENTS ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    // Declarations
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(Rc<FunctionDef>),

    // Control Flow
    Block(BlockStatement),
    If(IfStatement),
    Switch(SwitchStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    While(WhileStatement),
    DoWhile(WhileStatement),
    Try(TryStatement),

    // Jump
    Return(Option<Expression>),
    Break,
    Continue,
    Throw(Expression),

    // Other
    Expression(Expression),
    Empty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    /// Blocks without lexical declarations may run in the enclosing frame
    #[serde(default = "default_true")]
    pub scoped: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub kind: DeclarationKind,
    pub declarations: Vec<VariableDeclarator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDeclarator {
    pub name: String,
    pub init: Option<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchCase {
    /// `None` for the `default` clause
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForInStatement {
    pub left: ForBinding,
    pub right: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForOfStatement {
    pub left: ForBinding,
    pub right: Expression,
    pub body: Box<Statement>,
}

/// Loop variable of a for-in / for-of loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForBinding {
    /// `None` assigns to an existing binding
    pub kind: Option<DeclarationKind>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: Option<String>,
    pub body: BlockStatement,
}

// ============ FUNCTIONS ============

/// Definition shared by declarations, expressions, arrows and methods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    #[serde(default)]
    pub arrow: bool,
    #[serde(default, rename = "async")]
    pub async_: bool,
    /// `"use strict"` directive at the top of the body
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub default: Option<Expression>,
    /// Trailing `...rest` parameter
    #[serde(default)]
    pub rest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Concise arrow body
    Expression(Box<Expression>),
}

impl Default for FunctionBody {
    fn default() -> Self {
        FunctionBody::Block(Vec::new())
    }
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<ArrayElement>),
    Object(Vec<ObjectProperty>),
    Function(Rc<FunctionDef>),
    Unary(UnaryExpression),
    Update(UpdateExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Sequence(Vec<Expression>),
    Member(MemberExpression),
    Call(CallExpression),
    New(NewExpression),
    Await(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArrayElement {
    Expression(Expression),
    Spread(Expression),
    Hole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub key: PropertyName,
    pub kind: ObjectPropertyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyName {
    Identifier(String),
    Computed(Box<Expression>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectPropertyKind {
    Init(Expression),
    Get(Rc<FunctionDef>),
    Set(Rc<FunctionDef>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub argument: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub prefix: bool,
    pub argument: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,

    // Comparison
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Equality
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    URShift,

    // Other
    In,
    Instanceof,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    pub target: AssignmentTarget,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}

impl AssignmentOp {
    /// Binary operator applied by a compound assignment
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignmentOp::AddAssign => BinaryOp::Add,
            AssignmentOp::SubAssign => BinaryOp::Sub,
            AssignmentOp::MulAssign => BinaryOp::Mul,
            AssignmentOp::DivAssign => BinaryOp::Div,
            AssignmentOp::ModAssign => BinaryOp::Mod,
            AssignmentOp::ExpAssign => BinaryOp::Exp,
            AssignmentOp::BitAndAssign => BinaryOp::BitAnd,
            AssignmentOp::BitOrAssign => BinaryOp::BitOr,
            AssignmentOp::BitXorAssign => BinaryOp::BitXor,
            AssignmentOp::LShiftAssign => BinaryOp::LShift,
            AssignmentOp::RShiftAssign => BinaryOp::RShift,
            AssignmentOp::URShiftAssign => BinaryOp::URShift,
            AssignmentOp::Assign
            | AssignmentOp::AndAssign
            | AssignmentOp::OrAssign
            | AssignmentOp::NullishAssign => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssignmentTarget {
    Identifier(String),
    Member(MemberExpression),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: MemberProperty,
    /// `a?.b`
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MemberProperty {
    Identifier(String),
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
    /// `f?.()`
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Argument {
    Expression(Expression),
    Spread(Expression),
}
