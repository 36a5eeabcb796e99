//! Front end seam
//!
//! The runtime never lexes or parses source text itself. A [`Parser`]
//! turns source into a [`Program`]; hosts with a real JavaScript parser
//! install it through [`crate::Runtime::with_parser`].

use crate::ast::Program;
use crate::error::JsError;

/// Produces program trees from source text
pub trait Parser {
    /// Parse `source`. `module_name` is set when the script is compiled as
    /// a named module.
    fn parse(&self, source: &str, module_name: Option<&str>) -> Result<Program, JsError>;
}

/// Default front end: the source text is a JSON-encoded program tree.
///
/// Enum nodes use serde's externally tagged form, e.g.
/// `{"body": [{"Expression": {"Literal": {"Number": 1.0}}}]}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeParser;

impl Parser for TreeParser {
    fn parse(&self, source: &str, module_name: Option<&str>) -> Result<Program, JsError> {
        serde_json::from_str(source).map_err(|e| {
            JsError::syntax_error(format!(
                "{}: invalid program tree: {}",
                module_name.unwrap_or("<script>"),
                e
            ))
        })
    }
}

impl<F> Parser for F
where
    F: Fn(&str, Option<&str>) -> Result<Program, JsError>,
{
    fn parse(&self, source: &str, module_name: Option<&str>) -> Result<Program, JsError> {
        self(source, module_name)
    }
}
