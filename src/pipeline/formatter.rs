

const CLAUSE_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION", "INTERSECT",
    "EXCEPT", "MINUS", "WITH",
];

const JOIN_MODIFIERS: &[&str] = &["LEFT", "RIGHT", "INNER", "FULL", "CROSS", "NATURAL"];


#[derive(Debug, PartialEq, Eq)]
struct Word {
    text: String,
    line_comment: bool,
}


fn skip_quoted(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn skip_block_comment(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

fn flush(current: &mut String, words: &mut Vec<Word>) {
    if !current.is_empty() {
        words.push(Word {
            text: std::mem::take(current),
            line_comment: false,
        });
    }
}

fn split_words(statement: &str) -> Vec<Word> {
    let chars: Vec<char> = statement.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                flush(&mut current, &mut words);
                i += 1;
            }
            '\'' | '"' => {
                let end = skip_quoted(&chars, i, c);
                current.extend(&chars[i..end]);
                i = end;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                flush(&mut current, &mut words);
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map_or(chars.len(), |p| i + p);
                let text: String = chars[i..end].iter().collect();
                words.push(Word {
                    text: text.trim_end().to_string(),
                    line_comment: true,
                });
                i = end;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let end = skip_block_comment(&chars, i);
                current.extend(&chars[i..end]);
                i = end;
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }
    flush(&mut current, &mut words);
    words
}

fn is_any(word: &Word, set: &[&str]) -> bool {
    !word.line_comment && set.iter().any(|k| word.text.eq_ignore_ascii_case(k))
}

fn breaks_before(words: &[Word], index: usize) -> bool {
    let word = &words[index];
    let prev = index.checked_sub(1).map(|i| &words[i]);
    let next = words.get(index + 1);

    if is_any(word, CLAUSE_KEYWORDS) {
        return true;
    }
    if is_any(word, JOIN_MODIFIERS) {
        return next.is_some_and(|n| is_any(n, &["JOIN", "OUTER"]));
    }
    if word.text.eq_ignore_ascii_case("JOIN") && !word.line_comment {
        return !prev.is_some_and(|p| is_any(p, JOIN_MODIFIERS) || is_any(p, &["OUTER"]));
    }
    false
}


/// Layout-only pretty printing: quoted text and comments are kept verbatim,
/// other whitespace collapses, clause keywords start a new line.
pub fn format_statement(statement: &str) -> String {
    let words = split_words(statement);
    let mut out = String::with_capacity(statement.len());

    for (index, word) in words.iter().enumerate() {
        if index > 0 {
            let after_comment = words[index - 1].line_comment;
            if after_comment || breaks_before(&words, index) {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(&word.text);
    }
    out
}
