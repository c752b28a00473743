// Template source preprocessing
//
// Authors hide template-only syntax from JSON linters inside marked comments:
//   /* HBT {{#each rows}} */   ->   {{#each rows}}
//   // HBT {{/each}}           ->   {{/each}}

/// Marker that follows the comment opener (after one whitespace character).
pub const COMMENT_MARKER: &str = "HBT";

/// Unwrap marked block and line comments so their contents reach the template compiler.
pub fn uncomment_code_comments(code: &str) -> String {
    let code = uncomment_blocks(code);
    uncomment_lines(&code)
}

/// Expand literal `\n` escape sequences into newlines.
pub fn replace_newline(text: &str) -> String {
    text.replace("\\n", "\n")
}

fn uncomment_blocks(code: &str) -> String {
    let mut output = String::with_capacity(code.len());
    let mut rest = code;

    while let Some(start) = rest.find("/*") {
        let after_open = &rest[start + 2..];
        let body = match marker_body(after_open) {
            Some(body) => body,
            None => {
                output.push_str(&rest[..start + 2]);
                rest = after_open;
                continue;
            }
        };
        match body.find("*/") {
            Some(end) => {
                output.push_str(&rest[..start]);
                output.push_str(&body[..end]);
                rest = &body[end + 2..];
            }
            None => {
                // Unterminated: leave the remainder untouched
                output.push_str(rest);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}

fn uncomment_lines(code: &str) -> String {
    let mut output = String::with_capacity(code.len());
    for (i, line) in code.split('\n').enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&uncomment_line(line));
    }
    output
}

fn uncomment_line(line: &str) -> String {
    let mut search_from = 0;
    while let Some(offset) = line[search_from..].find("//") {
        let start = search_from + offset;
        let after_open = &line[start + 2..];
        if let Some(body) = marker_body(after_open) {
            // The marker must be followed by one whitespace character
            let mut chars = body.chars();
            if let Some(c) = chars.next() {
                if c.is_whitespace() {
                    let mut result = String::with_capacity(line.len());
                    result.push_str(&line[..start]);
                    result.push_str(chars.as_str());
                    return result;
                }
            }
        }
        search_from = start + 2;
    }
    line.to_string()
}

/// Returns the text after `<ws>HBT` when `after_open` starts with it.
fn marker_body(after_open: &str) -> Option<&str> {
    let mut chars = after_open.chars();
    let first = chars.next()?;
    if !first.is_whitespace() {
        return None;
    }
    chars.as_str().strip_prefix(COMMENT_MARKER)
}
