//! Metadata decoder (§4.3, §9 "term-literal metadata format").
//!
//! A small, deliberately incomplete term reader: it understands 2-tuples,
//! lists, Erlang binary strings, atoms, and integers, and nothing else.
//! There is no function-call syntax, no module-qualified call, no `fun`
//! literal — anything resembling code is a parse error, which is the
//! whole point of calling this reader "safe".

use hexpm_domain::error::MetadataError;

use crate::value::{Metadata, Value};

/// Parse `metadata.config` bytes into an ordered top-level mapping.
///
/// Reads the bytes as UTF-8, falling back to Latin-1 on failure (every
/// byte 0..=255 is a valid Unicode scalar value, so the fallback never
/// itself fails).
pub fn decode(bytes: &[u8]) -> Result<Metadata, MetadataError> {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };

    let mut parser = Parser::new(&text);
    let terms = parser.parse_top_level().map_err(term_error_to_metadata_error)?;

    let mut metadata = Metadata::new();
    for term in terms {
        match into_pair(term) {
            Some((k, v)) => metadata.push((k, v)),
            None => return Err(MetadataError::NotKeyValue),
        }
    }
    Ok(metadata)
}

/// A top-level term must be an actual 2-arity tuple (`{key, value}`);
/// a same-shaped list (`[key, value]`) is a different term and must be
/// rejected (§4.3, §7 `not_key_value`). `Term` keeps tuples and lists
/// distinct through parsing so this check is real; only once a term has
/// cleared this gate does it collapse into the general [`Value`] tree
/// via [`term_to_value`], which no longer needs to distinguish the two.
fn into_pair(term: Term) -> Option<(String, Value)> {
    match term {
        Term::Tuple(mut items) if items.len() == 2 => {
            let value = items.pop().unwrap();
            let key = items.pop().unwrap();
            let key = term_as_str(&key)?.to_string();
            Some((key, term_to_value(value)))
        }
        _ => None,
    }
}

/// Collapse a parsed [`Term`] into the general [`Value`] tree. Tuples and
/// lists are no longer distinguished past this point — both become
/// `Value::List`, matching the rest of the crate's convention of
/// representing nested `{key, value}` pairs as 2-element lists (see
/// `normalize.rs`'s `is_pair_list`).
fn term_to_value(term: Term) -> Value {
    match term {
        Term::Null => Value::Null,
        Term::Bool(b) => Value::Bool(b),
        Term::Int(n) => Value::Int(n),
        Term::Str(s) => Value::Str(s),
        Term::Atom(s) => Value::Atom(s),
        Term::List(items) | Term::Tuple(items) => {
            Value::List(items.into_iter().map(term_to_value).collect())
        }
    }
}

fn term_as_str(term: &Term) -> Option<&str> {
    match term {
        Term::Str(s) | Term::Atom(s) => Some(s.as_str()),
        _ => None,
    }
}

fn term_error_to_metadata_error(e: TermError) -> MetadataError {
    match e {
        // Tokenizer-level: failed while scanning the body of a single
        // literal (§4.3 "any other parse failure" that isn't structural).
        TermError::Token(msg) => MetadataError::Other(msg),
        // Structural/grammar-level: the term shape itself is malformed
        // (§7 `invalid_terms`).
        TermError::Structure(_) => MetadataError::InvalidTerms,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Recursive-descent parser
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An intermediate parse result that keeps tuples (`{...}`) and lists
/// (`[...]`) distinct — unlike [`Value`], which has no tuple variant of
/// its own and folds both into `Value::List` once past the top-level
/// key/value gate.
enum Term {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Atom(String),
    List(Vec<Term>),
    Tuple(Vec<Term>),
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    _src: &'a str,
}

/// Tokenizer errors (malformed literal contents) vs. structural errors
/// (malformed term shape) — kept distinct so `invalid_terms` and the
/// tokenizer `{other}` failure family (§4.3, §7) map to the right
/// variant instead of collapsing every failure into one bucket.
enum TermError {
    Token(String),
    Structure(String),
}

type PResult<T> = Result<T, TermError>;

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            _src: src,
        }
    }

    fn parse_top_level(&mut self) -> PResult<Vec<Term>> {
        let mut terms = Vec::new();
        self.skip_ws();
        while !self.at_end() {
            let term = self.parse_term()?;
            terms.push(term);
            self.skip_ws();
            if self.peek() == Some('.') {
                self.advance();
            } else {
                return Err(TermError::Structure(format!(
                    "expected '.' terminator at position {}",
                    self.pos
                )));
            }
            self.skip_ws();
        }
        Ok(terms)
    }

    fn parse_term(&mut self) -> PResult<Term> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.parse_tuple(),
            Some('[') => self.parse_list(),
            Some('<') => self.parse_binary(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some('\'') => self.parse_quoted_atom(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.parse_bare_atom(),
            Some(c) => Err(TermError::Structure(format!(
                "unexpected character '{c}' at position {}",
                self.pos
            ))),
            None => Err(TermError::Structure("unexpected end of input".to_string())),
        }
    }

    fn parse_tuple(&mut self) -> PResult<Term> {
        self.expect('{')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() != Some('}') {
            loop {
                items.push(self.parse_term()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => {
                        self.advance();
                        self.skip_ws();
                    }
                    Some('}') => break,
                    _ => {
                        return Err(TermError::Structure(format!(
                            "expected ',' or '}}' at position {}",
                            self.pos
                        )))
                    }
                }
            }
        }
        self.expect('}')?;
        self.reject_call_syntax()?;
        Ok(Term::Tuple(items))
    }

    fn parse_list(&mut self) -> PResult<Term> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() != Some(']') {
            loop {
                items.push(self.parse_term()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => {
                        self.advance();
                        self.skip_ws();
                    }
                    Some(']') => break,
                    _ => {
                        return Err(TermError::Structure(format!(
                            "expected ',' or ']' at position {}",
                            self.pos
                        )))
                    }
                }
            }
        }
        self.expect(']')?;
        Ok(Term::List(items))
    }

    fn parse_binary(&mut self) -> PResult<Term> {
        self.expect('<')?;
        self.expect('<')?;
        self.expect('"')?;
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(TermError::Token("unterminated binary literal".to_string())),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => s.push(other),
                    None => {
                        return Err(TermError::Token(
                            "unterminated escape in binary literal".to_string(),
                        ))
                    }
                },
                Some(c) => s.push(c),
            }
        }
        self.expect('>')?;
        self.expect('>')?;
        Ok(Term::Str(s))
    }

    fn parse_number(&mut self) -> PResult<Term> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        let mut saw_digit = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                saw_digit = true;
                self.advance();
            } else {
                break;
            }
        }
        if !saw_digit {
            return Err(TermError::Token(format!("malformed number at position {start}")));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Term::Int)
            .map_err(|e| TermError::Token(format!("malformed integer '{text}': {e}")))
    }

    fn parse_quoted_atom(&mut self) -> PResult<Term> {
        self.expect('\'')?;
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(TermError::Token("unterminated quoted atom".to_string())),
                Some('\'') => break,
                Some('\\') => match self.advance() {
                    Some(other) => s.push(other),
                    None => {
                        return Err(TermError::Token(
                            "unterminated escape in quoted atom".to_string(),
                        ))
                    }
                },
                Some(c) => s.push(c),
            }
        }
        self.reject_call_syntax()?;
        Ok(atom_to_term(&s))
    }

    fn parse_bare_atom(&mut self) -> PResult<Term> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '@' {
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.reject_call_syntax()?;
        Ok(atom_to_term(&text))
    }

    /// Refuse anything that looks like a function call or module
    /// qualifier immediately after a term — this is the "safe" part of
    /// the safe term reader.
    fn reject_call_syntax(&mut self) -> PResult<()> {
        match self.peek() {
            Some('(') | Some(':') => Err(TermError::Structure(format!(
                "refusing code-carrying construct at position {}",
                self.pos
            ))),
            _ => Ok(()),
        }
    }

    fn expect(&mut self, c: char) -> PResult<()> {
        if self.peek() == Some(c) {
            self.advance();
            Ok(())
        } else {
            Err(TermError::Structure(format!(
                "expected '{c}' at position {}, found {:?}",
                self.pos,
                self.peek()
            )))
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '%' {
                // Erlang line comment.
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn atom_to_term(s: &str) -> Term {
    match s {
        "true" => Term::Bool(true),
        "false" => Term::Bool(false),
        "undefined" => Term::Null,
        other => Term::Atom(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_flat_mapping() {
        let text = "{<<\"name\">>,<<\"decimal\">>}.\n{<<\"version\">>,<<\"1.0.0\">>}.\n";
        let metadata = decode(text.as_bytes()).unwrap();
        assert_eq!(metadata[0].0, "name");
        assert_eq!(metadata[0].1, Value::Str("decimal".into()));
        assert_eq!(metadata[1].0, "version");
    }

    #[test]
    fn decodes_nested_lists_and_tuples() {
        let text = "{<<\"requirements\">>,[{<<\"decimal\">>,[{<<\"requirement\">>,<<\"~> 1.0\">>}]}]}.\n";
        let metadata = decode(text.as_bytes()).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[0].0, "requirements");
        assert!(matches!(metadata[0].1, Value::List(_)));
    }

    #[test]
    fn decodes_atoms_and_numbers() {
        let text = "{<<\"ok\">>,true}.\n{<<\"missing\">>,undefined}.\n{<<\"n\">>,42}.\n";
        let metadata = decode(text.as_bytes()).unwrap();
        assert_eq!(metadata[0].1, Value::Bool(true));
        assert_eq!(metadata[1].1, Value::Null);
        assert_eq!(metadata[2].1, Value::Int(42));
    }

    #[test]
    fn rejects_non_key_value_top_level_terms() {
        let text = "[<<\"a\">>,<<\"b\">>].\n";
        let err = decode(text.as_bytes()).unwrap_err();
        assert_eq!(err, MetadataError::NotKeyValue);
    }

    #[test]
    fn rejects_function_call_syntax() {
        let text = "{<<\"k\">>,erlang:halt()}.\n";
        let err = decode(text.as_bytes()).unwrap_err();
        assert_eq!(err, MetadataError::InvalidTerms);
    }

    #[test]
    fn rejects_top_level_list_masquerading_as_a_pair() {
        // A top-level *list* `[a,b]` is a different term from a *tuple*
        // `{a,b}` and must not be accepted as a key/value pair, even
        // though both parse to a 2-element sequence.
        let text = "{<<\"a\">>,<<\"b\">>}.\n[<<\"c\">>,<<\"d\">>].\n";
        let err = decode(text.as_bytes()).unwrap_err();
        assert_eq!(err, MetadataError::NotKeyValue);
    }

    #[test]
    fn unterminated_literal_maps_to_other() {
        // Missing closing `"` on the binary literal: a tokenizer-level
        // failure, distinct from a structural/grammar mismatch.
        let text = "{<<\"k\">>,<<\"oops}.\n";
        let err = decode(text.as_bytes()).unwrap_err();
        assert!(matches!(err, MetadataError::Other(_)));
    }

    #[test]
    fn falls_back_to_latin1_on_invalid_utf8() {
        let mut bytes = b"{<<\"name\">>,<<\"".to_vec();
        bytes.push(0xE9); // Latin-1 'e' with acute, invalid as a UTF-8 lead byte here
        bytes.extend_from_slice(b"\">>}.\n");
        let metadata = decode(&bytes).unwrap();
        assert_eq!(metadata[0].0, "name");
    }
}
