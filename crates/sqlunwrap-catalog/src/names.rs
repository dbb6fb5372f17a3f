//! Multipart object names as accepted by `OBJECT_ID()`
//!
//! `[database.][schema.]object`, where each part may be bare, `[bracketed]`
//! (with `]]` escaping `]`) or `"quoted"`. An empty schema part (`db..obj`)
//! means the default schema.

/// A parsed one-, two- or three-part name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub object: String,
}

impl QualifiedName {
    /// Case-insensitive lookup key `schema.object`, with `default_schema`
    /// filled in when the name has none.
    pub fn key(&self, default_schema: &str) -> String {
        let schema = self.schema.as_deref().unwrap_or(default_schema);
        format!("{}.{}", schema.to_lowercase(), self.object.to_lowercase())
    }
}

/// Parse a multipart name. Returns `None` for anything `OBJECT_ID()` would
/// answer with NULL purely on syntax: empty object part, unterminated
/// quoting, or more than three parts.
pub fn parse(name: &str) -> Option<QualifiedName> {
    let parts = split_parts(name.trim())?;
    let mut parts: Vec<Option<String>> = parts
        .into_iter()
        .map(|p| (!p.is_empty()).then_some(p))
        .collect();

    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let object = parts.pop()??;
    let schema = parts.pop().flatten();
    let database = parts.pop().flatten();
    Some(QualifiedName {
        database,
        schema,
        object,
    })
}

/// Split on unquoted dots. Bare parts are trimmed; a bracketed or quoted
/// part is kept exactly, with only whitespace allowed around it.
fn split_parts(name: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut delimited = false;
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '[' | '"' => {
                if delimited || !current.trim().is_empty() {
                    return None;
                }
                current.clear();
                delimited = true;
                let close = if c == '[' { ']' } else { '"' };
                loop {
                    match chars.next()? {
                        d if d == close && chars.peek() == Some(&close) => {
                            chars.next();
                            current.push(close);
                        }
                        d if d == close => break,
                        other => current.push(other),
                    }
                }
            }
            '.' => {
                parts.push(finish_part(std::mem::take(&mut current), delimited));
                delimited = false;
            }
            ws if ws.is_whitespace() && delimited => {}
            _ if delimited => return None,
            other => current.push(other),
        }
    }
    parts.push(finish_part(current, delimited));
    Some(parts)
}

fn finish_part(part: String, delimited: bool) -> String {
    if delimited {
        part
    } else {
        part.trim().to_string()
    }
}
