//! Name validation and the camelCase <-> kebab-case mappings used by
//! style properties and dataset keys.

use batch_update::HandleError;

fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Canonical (ASCII-lowercase) attribute name.
pub fn attribute_name(name: &str) -> Result<String, HandleError> {
    let forbidden = |c: char| {
        c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '=')
    };
    let invalid = name.is_empty() || name.chars().any(forbidden);
    if invalid {
        return Err(HandleError::InvalidName(name.to_string()));
    }
    Ok(name.to_ascii_lowercase())
}

/// Style property in declaration form: `backgroundColor` -> `background-color`.
///
/// Custom properties (`--accent`) pass through unchanged.
pub fn style_property(name: &str) -> Result<String, HandleError> {
    let css = if name.starts_with("--") {
        name.to_string()
    } else {
        camel_to_kebab(name)
    };
    let body = css.trim_start_matches('-');
    let valid = !body.is_empty()
        && !body.starts_with(|c: char| c.is_ascii_digit())
        && css.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(HandleError::InvalidStyleProperty(name.to_string()));
    }
    Ok(css)
}

/// Attribute backing a dataset key: `userId` -> `data-user-id`.
///
/// A hyphen followed by a lowercase letter has no dataset spelling and is
/// rejected.
pub fn dataset_attribute(key: &str) -> Result<String, HandleError> {
    let bytes = key.as_bytes();
    if bytes
        .windows(2)
        .any(|w| w[0] == b'-' && w[1].is_ascii_lowercase())
    {
        return Err(HandleError::InvalidName(key.to_string()));
    }
    attribute_name(&format!("data-{}", camel_to_kebab(key)))
}

/// Inverse of [`dataset_attribute`]; `None` for non-`data-*` attributes.
pub fn dataset_key(attribute: &str) -> Option<String> {
    let rest = attribute.strip_prefix("data-")?;
    let mut out = String::with_capacity(rest.len());
    let mut upper = false;
    for ch in rest.chars() {
        if ch == '-' {
            upper = true;
            continue;
        }
        if upper && ch.is_ascii_lowercase() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        upper = false;
    }
    Some(out)
}

pub fn class_token(name: &str) -> Result<&str, HandleError> {
    if name.is_empty() || name.chars().any(|c| c.is_ascii_whitespace()) {
        return Err(HandleError::InvalidName(name.to_string()));
    }
    Ok(name)
}

pub fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|v| v.split_ascii_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
