//! Path template helpers: URL rewriting, template parameters and derived
//! operation ids

/// Split `path` into literal text and `{name}` placeholders. Braces that
/// do not form a placeholder are dropped.
fn segments(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        segments.push(Segment::Literal(literal));

        let after_open = &tail[1..];
        match after_open.find(|c: char| c == '}' || c == '{' || c == '/') {
            Some(close) if after_open[close..].starts_with('}') && close > 0 => {
                segments.push(Segment::Param(&after_open[..close]));
                rest = &after_open[close + 1..];
            }
            _ => rest = after_open,
        }
    }
    segments.push(Segment::Literal(rest));

    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

fn strip_stray_braces(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().filter(|c| *c != '{' && *c != '}')
}

/// Rewrite an OpenAPI path template into colon placeholder syntax:
/// `/user/{name}` becomes `/user/:name`.
pub fn make_url(path: &str) -> String {
    let mut url = String::with_capacity(path.len());
    for segment in segments(path) {
        match segment {
            Segment::Literal(text) => url.extend(strip_stray_braces(text)),
            Segment::Param(name) => {
                url.push(':');
                url.push_str(name);
            }
        }
    }
    url
}

/// Placeholder names of a path template, in order of appearance
pub fn template_params(path: &str) -> Vec<&str> {
    segments(path)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Param(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}

fn first_upper(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derive a camelCase operation id from a method and a path template.
///
/// `get /user/{name}` becomes `getUserByName`. Only ASCII letters survive.
pub fn make_operation_id(method: &str, path: &str) -> String {
    let mut joined = method.to_string();
    for part in path.split('/').skip(1) {
        joined.push_str(&first_upper(part));
    }

    let mut id = String::with_capacity(joined.len());
    for segment in segments(&joined) {
        match segment {
            Segment::Literal(text) => id.push_str(text),
            Segment::Param(name) => {
                id.push_str("By");
                id.push_str(&first_upper(name));
            }
        }
    }
    id.retain(|c| c.is_ascii_alphabetic());
    id
}
