//! Prompt rendering: `{field}` placeholders, `{{` and `}}` escape literal braces.

use crate::utils::error::{OutreachError, Result};
use std::borrow::Cow;
use std::collections::BTreeMap;

pub type PromptFields<'a> = BTreeMap<&'a str, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: Cow<'static, str>,
}

impl PromptTemplate {
    pub const fn from_static(source: &'static str) -> Self {
        Self {
            source: Cow::Borrowed(source),
        }
    }

    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Cow::Owned(source.into()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 模板中引用的欄位名稱（依出現順序，不重複）
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(|segment| {
            if let Segment::Field(name) = segment {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            Ok(())
        })
        .ok();
        names
    }

    /// Renders the template. Bound values are inserted verbatim and never rescanned,
    /// so braces inside page text survive untouched. Unused bindings are ignored.
    pub fn render(&self, fields: &PromptFields<'_>) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        self.walk(|segment| {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = fields.get(name).ok_or_else(|| OutreachError::PromptError {
                        field: name.to_string(),
                    })?;
                    out.push_str(value);
                }
            }
            Ok(())
        })?;
        Ok(out)
    }

    fn walk<'s>(&'s self, mut visit: impl FnMut(Segment<'s>) -> Result<()>) -> Result<()> {
        let mut rest: &'s str = &self.source;

        while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
            visit(Segment::Literal(&rest[..pos]))?;
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                visit(Segment::Literal("{"))?;
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with("}}") {
                visit(Segment::Literal("}"))?;
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('{') {
                if let Some(end) = tail.find('}') {
                    let name = &tail[1..end];
                    if is_field_name(name) {
                        visit(Segment::Field(name))?;
                        rest = &tail[end + 1..];
                        continue;
                    }
                }
            }

            // 單獨的大括號視為字面值
            visit(Segment::Literal(&tail[..1]))?;
            rest = &tail[1..];
        }

        visit(Segment::Literal(rest))
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Field(&'a str),
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
