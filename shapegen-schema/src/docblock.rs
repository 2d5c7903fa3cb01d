//! Docblock utilities.
//!
//! Cleans raw `/** ... */` comments for output and extracts the type
//! expressions attached to `@var` and `@param` tags. Type expressions are
//! captured with bracket depth matching, so shaped types that span several
//! lines or contain spaces are returned whole.

/// Tags kept when a docblock is cleaned for output.
const PRESERVED_TAGS: [&str; 4] = ["@deprecated", "@see", "@link", "@example"];

/// Cleans a raw docblock into plain documentation lines.
///
/// Comment delimiters and leading asterisks are stripped, blank lines are
/// dropped, and tag lines are removed unless they are in the preserved set.
/// Returns `None` when nothing is left.
#[must_use]
pub fn clean_doc_comment(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('@') || is_preserved_tag(line))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn clean_line(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix("/**").unwrap_or(line);
    let line = line.strip_suffix("*/").unwrap_or(line);
    line.trim_start_matches('*').trim()
}

fn is_preserved_tag(line: &str) -> bool {
    PRESERVED_TAGS.iter().any(|tag| {
        line.strip_prefix(tag)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// Extracts the type expression following the first `@var` tag.
#[must_use]
pub fn extract_var_type(raw: &str) -> Option<String> {
    tag_positions(raw, "@var").find_map(|start| scan_type_expression(&raw[start..]).map(|(ty, _)| ty))
}

/// Extracts the type expression of `@param <type> $param`.
#[must_use]
pub fn extract_param_type(raw: &str, param: &str) -> Option<String> {
    tag_positions(raw, "@param").find_map(|start| {
        let rest = &raw[start..];
        let (ty, consumed) = scan_type_expression(rest)?;
        let after = rest[consumed..].trim_start();
        let name = after.strip_prefix('$')?;
        let matches = name
            .strip_prefix(param)
            .is_some_and(|tail| !tail.starts_with(|c: char| c.is_alphanumeric() || c == '_'));
        matches.then_some(ty)
    })
}

/// Yields the byte offsets just past each occurrence of `tag`.
fn tag_positions<'a>(raw: &'a str, tag: &'a str) -> impl Iterator<Item = usize> + 'a {
    raw.match_indices(tag).filter_map(move |(idx, _)| {
        let end = idx + tag.len();
        let boundary = raw[end..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);
        boundary.then_some(end)
    })
}

/// Scans one type expression from the start of `input`.
///
/// Leading whitespace is skipped. At depth zero the expression ends at
/// whitespace (unless the whitespace surrounds a `|`), at a `$`, or at the
/// end of the comment. Inside brackets, line breaks and the docblock's
/// leading asterisks are folded into single spaces. Returns the expression
/// and the number of bytes consumed, or `None` when the brackets never
/// balance.
fn scan_type_expression(input: &str) -> Option<(String, usize)> {
    let start = input.len() - input.trim_start().len();
    let bytes = input.as_bytes();
    let mut out = String::new();
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'{' | b'<' | b'(' => depth += 1,
            b'}' | b'>' | b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            b'*' if bytes.get(i + 1) == Some(&b'/') && depth == 0 => break,
            b'$' if depth == 0 => break,
            b'\n' | b'\r' if depth > 0 => {
                i += 1;
                while i < bytes.len()
                    && (bytes[i].is_ascii_whitespace()
                        || (bytes[i] == b'*' && bytes.get(i + 1) != Some(&b'/')))
                {
                    i += 1;
                }
                out.push(' ');
                continue;
            }
            _ if c.is_ascii_whitespace() && depth == 0 => {
                let next = input[i..].trim_start();
                let joins_union = out.ends_with('|') || next.starts_with('|');
                if !joins_union || next.starts_with("*/") {
                    break;
                }
                i = input.len() - next.len();
                continue;
            }
            _ => {}
        }
        // Multi-byte characters are copied through unchanged.
        let ch_len = input[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&input[i..i + ch_len]);
        i += ch_len;
    }

    let expression = out.trim().to_string();
    if depth != 0 || expression.is_empty() {
        return None;
    }
    Some((expression, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_doc_comment() {
        let raw = "/**\n * Simple user data transfer object\n *\n * @author John Doe\n */";
        assert_eq!(
            clean_doc_comment(raw).as_deref(),
            Some("Simple user data transfer object")
        );
    }

    #[test]
    fn test_clean_doc_comment_preserves_tags() {
        let raw = "/**\n * Legacy user identifier\n * @deprecated Use newField instead\n * @see https://example.com/docs\n * @var int\n */";
        assert_eq!(
            clean_doc_comment(raw).as_deref(),
            Some("Legacy user identifier\n@deprecated Use newField instead\n@see https://example.com/docs")
        );
    }

    #[test]
    fn test_clean_doc_comment_single_line_and_empty() {
        assert_eq!(
            clean_doc_comment("/** The user's email address */").as_deref(),
            Some("The user's email address")
        );
        assert_eq!(clean_doc_comment("/** @var string */"), None);
        assert_eq!(clean_doc_comment("   "), None);
        assert_eq!(clean_doc_comment("plain text").as_deref(), Some("plain text"));
    }

    #[test]
    fn test_extract_var_type_simple() {
        assert_eq!(
            extract_var_type("/** @var AddressDTO[] */").as_deref(),
            Some("AddressDTO[]")
        );
        assert_eq!(
            extract_var_type("/** @var string|null $email */").as_deref(),
            Some("string|null")
        );
        assert_eq!(extract_var_type("/** no tag here */"), None);
        assert_eq!(extract_var_type("/** @variable int */"), None);
    }

    #[test]
    fn test_extract_var_type_shaped_with_spaces() {
        let raw = "/**\n * Simple shaped array\n * @var array{id: int, name: string, active: bool}\n */";
        assert_eq!(
            extract_var_type(raw).as_deref(),
            Some("array{id: int, name: string, active: bool}")
        );
    }

    #[test]
    fn test_extract_var_type_multiline() {
        let raw = "/**\n * @var array{\n *   id: int,\n *   tags: array<string, TagDTO>\n * }\n */";
        assert_eq!(
            extract_var_type(raw).as_deref(),
            Some("array{ id: int, tags: array<string, TagDTO> }")
        );
    }

    #[test]
    fn test_extract_var_type_spaced_union() {
        assert_eq!(
            extract_var_type("/** @var string | null */").as_deref(),
            Some("string|null")
        );
    }

    #[test]
    fn test_extract_var_type_unbalanced() {
        assert_eq!(extract_var_type("/** @var array{id: int */"), None);
    }

    #[test]
    fn test_extract_param_type() {
        let raw = "/**\n * @param array<string> $tags\n * @param array{id: int, name: string} $user\n * @param int $tagsCount\n */";
        assert_eq!(extract_param_type(raw, "tags").as_deref(), Some("array<string>"));
        assert_eq!(
            extract_param_type(raw, "user").as_deref(),
            Some("array{id: int, name: string}")
        );
        assert_eq!(extract_param_type(raw, "tagsCount").as_deref(), Some("int"));
        assert_eq!(extract_param_type(raw, "missing"), None);
    }
}
