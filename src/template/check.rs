// Compile-time checks over a parsed handlebars template
//
// Every helper call must name a known helper, and helpers that dispatch on a
// method name given as a string literal must know that method.

use super::error::{Position, TemplateError};
use crate::helpers::Helper;
use handlebars::template::{HelperTemplate, Parameter, Template, TemplateElement};
use serde_json::Value as Json;

/// Helpers handlebars provides on its own.
pub const BUILTIN_HELPERS: [&str; 17] = [
    "if", "unless", "each", "with", "lookup", "raw", "log", "eq", "ne", "gt", "gte", "lt", "lte", "and", "or",
    "not", "len",
];

fn is_known(name: &str) -> bool {
    Helper::from_name(name).is_some() || BUILTIN_HELPERS.contains(&name)
}

pub fn check_template(template: &Template) -> Result<(), TemplateError> {
    for (index, element) in template.elements.iter().enumerate() {
        let at = match template.mapping.get(index) {
            Some(mapping) => Position { line: mapping.0, column: mapping.1 },
            None => Position::default(),
        };
        check_element(element, at)?;
    }
    Ok(())
}

fn check_element(element: &TemplateElement, at: Position) -> Result<(), TemplateError> {
    match element {
        TemplateElement::Expression(call) | TemplateElement::HtmlExpression(call) => check_call(call, false, at),
        TemplateElement::HelperBlock(call) => check_call(call, true, at),
        _ => Ok(()),
    }
}

fn check_call(call: &HelperTemplate, block: bool, at: Position) -> Result<(), TemplateError> {
    // A bare `{{name}}` is a lookup unless a helper by that name exists.
    let invokes = block || !call.params.is_empty() || !call.hash.is_empty();
    if let Some(name) = call.name.as_name() {
        if invokes && !is_known(name) {
            return Err(TemplateError::MissingHelper { name: name.to_string(), at });
        }
        if let Some(helper) = Helper::from_name(name) {
            check_method(helper, &call.params, at)?;
        }
    }

    for parameter in call.params.iter().chain(call.hash.values()) {
        if let Parameter::Subexpression(sub) = parameter {
            check_element(sub.as_element(), at)?;
        }
    }
    for nested in [&call.template, &call.inverse].into_iter().flatten() {
        check_template(nested)?;
    }
    Ok(())
}

fn check_method(helper: Helper, params: &[Parameter], at: Position) -> Result<(), TemplateError> {
    let Some(position) = helper.method_position() else {
        return Ok(());
    };
    match params.get(position) {
        Some(Parameter::Literal(Json::String(method))) if !helper.accepts_method(method) => {
            Err(TemplateError::UnknownMethod { helper: helper.name(), method: method.clone(), at })
        }
        _ => Ok(()),
    }
}
