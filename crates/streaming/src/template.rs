use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `{key}` with no value supplied.
    UnknownPlaceholder(String),
    /// `{` without a matching `}`.
    Unclosed { offset: usize },
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::UnknownPlaceholder(key) => {
                write!(f, "no value provided for template variable {{{key}}}")
            }
            TemplateError::Unclosed { offset } => {
                write!(f, "unclosed template placeholder at byte {offset}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Substitutes `{key}` placeholders (surrounding spaces allowed) from `values`.
///
/// Braces whose content is not a plain key (letters, digits, `_`, `-`, space)
/// are copied through untouched.
pub fn interpolate(template: &str, values: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    let mut consumed = 0usize;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(TemplateError::Unclosed {
                offset: consumed + open,
            });
        };
        let raw = &after[..close];
        let key = raw.trim();
        let is_key = !key.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' ');
        if is_key {
            let value = values
                .get(key)
                .ok_or_else(|| TemplateError::UnknownPlaceholder(key.to_string()))?;
            out.push_str(value);
        } else {
            out.push('{');
            out.push_str(raw);
            out.push('}');
        }
        let step = open + 1 + close + 1;
        consumed += step;
        rest = &rest[step..];
    }
    out.push_str(rest);
    Ok(out)
}
