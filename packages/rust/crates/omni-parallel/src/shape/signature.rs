//! Parse method definitions such as `string Join(string separator, int count)`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParallelError, Result};

/// `<return> [Qualified.]Name(<params>)`
static RE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.]+ (?:\w+\.)*\w+\((?P<params>.*)\)$")
        .unwrap_or_else(|err| panic!("invalid RE_DEFINITION regex: {err}"))
});

/// `<type> <name>`
static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<param_type>[\w.]+) \w+$")
        .unwrap_or_else(|err| panic!("invalid RE_PARAM regex: {err}"))
});

/// One overload: the ordered parameter type names. Return type and parameter names
/// do not take part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodSignature {
    params: Vec<String>,
}

impl MethodSignature {
    /// Signature from parameter type names.
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a definition string.
    ///
    /// # Errors
    /// Returns [`ParallelError::InvalidDefinition`] when the definition or one of its
    /// parameters does not have the `<type> <name>` form.
    pub fn parse(definition: &str) -> Result<Self> {
        let definition = definition.trim();
        let captures = RE_DEFINITION.captures(definition).ok_or_else(|| {
            ParallelError::InvalidDefinition(format!(
                "found an unsupported method definition: {definition}"
            ))
        })?;

        let raw_params = captures.name("params").map_or("", |m| m.as_str());
        if raw_params.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut params = Vec::new();
        for param in raw_params.split(',').map(str::trim) {
            let param_type = RE_PARAM
                .captures(param)
                .and_then(|c| c.name("param_type"))
                .ok_or_else(|| {
                    ParallelError::InvalidDefinition(format!(
                        "found an unsupported parameter definition: {param}"
                    ))
                })?;
            params.push(param_type.as_str().to_string());
        }
        Ok(Self { params })
    }

    /// Parameter type names in order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.params.join(", "))
    }
}
