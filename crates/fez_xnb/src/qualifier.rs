//! Structural .NET type names.
//!
//! Type tables store assembly qualified names such as
//!
//! ```text
//! Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32, mscorlib, Version=4.0.0.0]]
//! ```
//!
//! [`TypeQualifier`] keeps the namespace, the bare name, the template arguments and
//! any array suffixes. Assembly information is accepted and dropped.

use std::fmt::{self, Display, Write as _};
use std::str::FromStr;

use winnow::ascii::digit1;
use winnow::combinator::{delimited, opt, preceded, repeat, rest, separated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::PResult;

use crate::error::Error;

/// A parsed type name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeQualifier {
    /// Dot separated namespace, may be empty
    pub namespace: String,

    /// Type name without namespace or generic arity
    pub name: String,

    /// Template arguments in declaration order
    pub templates: Vec<TypeQualifier>,

    /// Number of `[]` suffixes
    pub array_depth: usize,
}

impl TypeQualifier {
    /// Qualifier with a namespace and a name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> TypeQualifier {
        TypeQualifier {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Split a dotted full name into namespace and name
    pub fn from_full_name(full_name: &str) -> TypeQualifier {
        match full_name.rsplit_once('.') {
            Some((namespace, name)) => TypeQualifier::new(namespace, name),
            None => TypeQualifier::new("", full_name),
        }
    }

    /// Add a template argument
    pub fn with_template(mut self, template: TypeQualifier) -> TypeQualifier {
        self.templates.push(template);
        self
    }

    /// Array of this type
    pub fn array_of(mut self) -> TypeQualifier {
        self.array_depth += 1;
        self
    }

    /// `namespace.name` without templates
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Parse a serialized type name
    pub fn parse(input: &str) -> Result<TypeQualifier, Error> {
        qualifier
            .parse(input.trim())
            .map_err(|_| Error::InvalidQualifier(input.to_owned()))
    }
}

impl Display for TypeQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())?;
        if !self.templates.is_empty() {
            write!(f, "`{}[", self.templates.len())?;
            for (i, template) in self.templates.iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                write!(f, "[{template}]")?;
            }
            f.write_char(']')?;
        }
        for _ in 0..self.array_depth {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl FromStr for TypeQualifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeQualifier::parse(s)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '+' | '<' | '>' | '$')
}

fn segment<'s>(input: &mut &'s str) -> PResult<&'s str> {
    take_while(1.., is_name_char).parse_next(input)
}

fn arity<'s>(input: &mut &'s str) -> PResult<&'s str> {
    preceded('`', digit1).parse_next(input)
}

fn template_list(input: &mut &str) -> PResult<Vec<TypeQualifier>> {
    arity.parse_next(input)?;
    delimited(
        '[',
        separated(1.., delimited('[', inner_qualifier, ']'), ','),
        ']',
    )
    .parse_next(input)
}

fn assembly<'s>(input: &mut &'s str) -> PResult<&'s str> {
    preceded(',', take_till(0.., ']')).parse_next(input)
}

fn trailing_assembly<'s>(input: &mut &'s str) -> PResult<&'s str> {
    preceded(',', rest).parse_next(input)
}

fn array_suffixes(input: &mut &str) -> PResult<usize> {
    repeat(0.., "[]").parse_next(input)
}

fn qualified_name(input: &mut &str) -> PResult<TypeQualifier> {
    let segments: Vec<&str> = separated(1.., segment, '.').parse_next(input)?;
    let templates = opt(template_list).parse_next(input)?.unwrap_or_default();
    let array_depth = array_suffixes.parse_next(input)?;

    let (name, namespace) = segments.split_last().map_or(("", &[][..]), |(n, ns)| (*n, ns));

    Ok(TypeQualifier {
        namespace: namespace.join("."),
        name: name.to_owned(),
        templates,
        array_depth,
    })
}

fn inner_qualifier(input: &mut &str) -> PResult<TypeQualifier> {
    let qualifier = qualified_name.parse_next(input)?;
    opt(assembly).parse_next(input)?;
    Ok(qualifier)
}

fn qualifier(input: &mut &str) -> PResult<TypeQualifier> {
    let qualifier = qualified_name.parse_next(input)?;
    opt(trailing_assembly).parse_next(input)?;
    Ok(qualifier)
}
