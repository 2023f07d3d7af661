//! JSON program files.
//!
//! A file holds the definitions and RPN body of a zero-argument main
//! function. Literals are written in canonical value text:
//!
//! ```json
//! {
//!   "definitions": [
//!     { "right": ["x"], "body": [{ "lookup": "x" }, { "literal": "2" }, { "apply": "+" }] }
//!   ],
//!   "body": [{ "literal": "(3 4 5)" }, { "closure": 0 }, { "apply": "map" }]
//! }
//! ```

use crate::diagnostics;
use anyhow::{Context, Result, anyhow, bail};
use inkling::{Argument, Associativity, Definition, Function, Program, TypeConstraint, Value, literal};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramFile {
    #[serde(default)]
    pub definitions: Vec<DefinitionSpec>,
    pub body: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub left: Vec<ArgumentSpec>,
    #[serde(default)]
    pub right: Vec<ArgumentSpec>,
    #[serde(default)]
    pub precedence: Option<u16>,
    #[serde(default)]
    pub associativity: Option<Associativity>,
    #[serde(default)]
    pub short_circuit: bool,
    /// Result of an empty body
    #[serde(default)]
    pub literal: Option<String>,
    #[serde(default)]
    pub definitions: Vec<DefinitionSpec>,
    #[serde(default)]
    pub body: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ArgumentSpec {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        keyword: Option<String>,
        /// Type tag text, e.g. `"Number"`
        #[serde(default, rename = "type")]
        constraint: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Literal(String),
    Label(String),
    Closure(u32),
    Lookup(String),
    Apply(String),
}

impl ProgramFile {
    pub fn from_json(text: &str) -> Result<ProgramFile> {
        serde_json::from_str(text).context("malformed program file")
    }

    /// The main function, ready for `Runtime::evaluate`.
    pub fn compile(&self) -> Result<Function> {
        let body = compile_body(&self.body, "body")?;
        let definitions = compile_definitions(&self.definitions, "definitions")?;
        Ok(Function::program(body).with_definitions(definitions))
    }
}

fn parse_value(text: &str, origin: &str) -> Result<Value> {
    literal::parse(text).map_err(|errors| {
        anyhow!(
            "invalid literal at {origin}\n{}",
            diagnostics::report(origin, text, &errors)
        )
    })
}

fn compile_body(steps: &[Step], origin: &str) -> Result<Program> {
    let mut builder = Program::builder();
    for (i, step) in steps.iter().enumerate() {
        builder = match step {
            Step::Literal(text) => builder.literal(parse_value(text, &format!("{origin}[{i}]"))?),
            Step::Label(keyword) => builder.label(keyword),
            Step::Closure(id) => builder.closure(*id),
            Step::Lookup(name) => builder.lookup(name),
            Step::Apply(name) => builder.apply(name),
        };
    }
    Ok(builder.build())
}

fn compile_definitions(specs: &[DefinitionSpec], origin: &str) -> Result<Vec<Definition>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| spec.compile(&format!("{origin}[{i}]")))
        .collect()
}

fn compile_arguments(specs: &[ArgumentSpec], origin: &str) -> Result<Vec<Argument>> {
    specs
        .iter()
        .map(|spec| match spec {
            ArgumentSpec::Name(name) => Ok(Argument::new(name)),
            ArgumentSpec::Full {
                name,
                keyword,
                constraint,
            } => {
                let mut argument = Argument::new(name);
                if let Some(keyword) = keyword {
                    argument = argument.with_keyword(keyword);
                }
                if let Some(text) = constraint {
                    let value = parse_value(text, &format!("{origin}.{name}"))?;
                    let Some(constraint) = TypeConstraint::from_value(&value) else {
                        bail!("{origin}.{name}: `{text}` is not a type");
                    };
                    argument = argument.with_constraint(constraint);
                }
                Ok(argument)
            }
        })
        .collect()
}

impl DefinitionSpec {
    fn compile(&self, origin: &str) -> Result<Definition> {
        let mut function = Function::program(compile_body(&self.body, &format!("{origin}.body"))?)
            .with_left(compile_arguments(&self.left, origin)?)
            .with_right(compile_arguments(&self.right, origin)?)
            .with_definitions(compile_definitions(&self.definitions, &format!("{origin}.definitions"))?);
        if let Some(precedence) = self.precedence {
            function = function.with_precedence(precedence);
        }
        if let Some(associativity) = self.associativity {
            function = function.with_associativity(associativity);
        }
        if self.short_circuit {
            function = function.short_circuiting();
        }
        if let Some(text) = &self.literal {
            function = function.with_literal(parse_value(text, &format!("{origin}.literal"))?);
        }
        Ok(match &self.name {
            Some(name) => Definition::named(name, function.named(name)),
            None => Definition::anonymous(function),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkling::Runtime;
    use std::sync::Arc;

    fn run(json: &str) -> Value {
        let function = ProgramFile::from_json(json).and_then(|file| file.compile()).unwrap();
        Runtime::new().evaluate(&Arc::new(function))
    }

    #[test]
    fn runs_the_documented_example() {
        let json = r#"{
            "definitions": [
                { "right": ["x"], "body": [{ "lookup": "x" }, { "literal": "2" }, { "apply": "+" }] }
            ],
            "body": [{ "literal": "(3 4 5)" }, { "closure": 0 }, { "apply": "map" }]
        }"#;
        assert_eq!(run(json), literal::parse("(5 6 7)").unwrap());
    }

    #[test]
    fn keyword_arguments_need_their_label() {
        let json = r#"{
            "definitions": [
                {
                    "name": "scale",
                    "left": ["x"],
                    "right": [{ "name": "k", "keyword": "by", "type": "Number" }],
                    "body": [{ "lookup": "x" }, { "lookup": "k" }, { "apply": "*" }]
                }
            ],
            "body": [{ "literal": "4" }, { "label": "by" }, { "literal": "3" }, { "apply": "scale" }]
        }"#;
        assert_eq!(run(json), Value::Int(12));
    }

    #[test]
    fn bad_literals_point_at_their_step() {
        let json = r#"{ "body": [{ "literal": "1" }, { "literal": "(1 2" }] }"#;
        let error = ProgramFile::from_json(json)
            .and_then(|file| file.compile())
            .unwrap_err()
            .to_string();
        assert!(error.contains("body[1]"), "{error}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ProgramFile::from_json(r#"{ "body": [], "extra": 1 }"#).is_err());
        assert!(ProgramFile::from_json(r#"{ "body": [{ "push": "1" }] }"#).is_err());
    }
}
