//! Token scanner: locates brace-balanced `{{ ... }}` spans in template text.

/// One report token found in the template.
///
/// `raw` is the full span including the outer braces and is the unit of
/// substitution; `body` is the trimmed instruction text between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub start: usize,
    pub end: usize,
    pub raw: &'a str,
    pub body: &'a str,
}

/// Lazy left-to-right iterator over the non-overlapping tokens of a template.
///
/// A token opens at `{{` and closes at the first `}}` reached with the inner
/// brace depth back at zero, so bodies may carry balanced `{...}` structure
/// (formatting maps). An opener that never closes is not a token; scanning
/// resumes at the next `{{` so later well-formed tokens are still found.
pub struct TokenScanner<'a> {
    text: &'a str,
    pos: usize,
}

pub fn scan(text: &str) -> TokenScanner<'_> {
    TokenScanner { text, pos: 0 }
}

impl<'a> Iterator for TokenScanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let bytes = self.text.as_bytes();
        let mut search_from = self.pos;

        while let Some(start) = find_opener(bytes, search_from) {
            let mut depth = 0usize;
            let mut i = start + 2;

            while i < bytes.len() {
                match bytes[i] {
                    b'{' => depth += 1,
                    b'}' => {
                        if depth == 0 {
                            if bytes.get(i + 1) == Some(&b'}') {
                                self.pos = i + 2;
                                return Some(Token {
                                    start,
                                    end: i + 2,
                                    raw: &self.text[start..i + 2],
                                    body: self.text[start + 2..i].trim(),
                                });
                            }
                            // Lone closer at depth 0: this opener cannot match.
                            break;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
                i += 1;
            }

            // Unbalanced to end-of-text or broken by a lone closer: the span
            // is left untouched, try the next opener.
            search_from = start + 1;
        }

        self.pos = self.text.len();
        None
    }
}

/// Next occurrence of `{{` at or after `from`.
fn find_opener(bytes: &[u8], from: usize) -> Option<usize> {
    if bytes.len() < 2 {
        return None;
    }
    (from..bytes.len() - 1).find(|&i| bytes[i] == b'{' && bytes[i + 1] == b'{')
}
