/*
    This module splits source text into the tokens fed to the recognizer
*/

use std::fmt::Display;

use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    // Half-open byte range into the untouched source
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:?}", self.text, self.span())
    }
}

/// Greedy longest-match tokenizer over a keyword set and a multi-character
/// operator set. Anything else becomes a single-character token, so digits
/// and letters come out one at a time.
///
/// When a keyword and an operator match with the same length the keyword wins.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    // (literal, priority) with keywords at priority 0, longest first
    literals: Vec<(String, u8)>,
}

impl Tokenizer {
    pub fn new<'a>(keywords: impl IntoIterator<Item = &'a str>, operators: impl IntoIterator<Item = &'a str>) -> Self {
        let literals = keywords.into_iter().map(|keyword| (keyword.to_string(), 0))
            .chain(operators.into_iter().map(|operator| (operator.to_string(), 1)))
            .filter(|(literal, _)| !literal.is_empty())
            .sorted_by(|(a, a_priority), (b, b_priority)| {
                b.len().cmp(&a.len()).then(a_priority.cmp(b_priority)).then(a.cmp(b))
            })
            .collect();
        Tokenizer { literals }
    }

    // The longest literal `rest` starts with
    fn longest_match(&self, rest: &str) -> Option<&str> {
        self.literals.iter()
            .find(|(literal, _)| rest.starts_with(literal.as_str()))
            .map(|(literal, _)| literal.as_str())
    }

    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        let source = source.trim_end();
        let mut tokens = Vec::new();
        let mut offset = 0;

        while offset < source.len() {
            let rest = &source[offset..];
            let trimmed = rest.trim_start();
            offset += rest.len() - trimmed.len();

            let length = match (self.longest_match(trimmed), trimmed.chars().next()) {
                (Some(literal), _) => literal.len(),
                (None, Some(c)) => c.len_utf8(),
                // Only reachable on whitespace, which trim_end already removed
                (None, None) => break,
            };

            tokens.push(Token {
                text: trimmed[..length].to_string(),
                start: offset,
                end: offset + length,
            });
            offset += length;
        }

        tracing::debug!(tokens = tokens.len(), "tokenized source");
        tokens
    }
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use proptest::prelude::*;

    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(["local", "do", "end", "not"], ["...", "..", "<=", "=="])
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|token| token.text.as_str()).collect()
    }

    #[test]
    fn operators_are_not_split() {
        let tokens = tokenizer().tokenize("x<=y");
        assert_eq!(tokens, vec![
            Token { text: "x".to_string(), start: 0, end: 1 },
            Token { text: "<=".to_string(), start: 1, end: 3 },
            Token { text: "y".to_string(), start: 3, end: 4 },
        ]);
    }

    #[test]
    fn digits_and_letters_come_one_at_a_time() {
        let source = "local x = 10";
        let tokens = tokenizer().tokenize(source);
        assert_eq!(texts(&tokens), vec!["local", "x", "=", "1", "0"]);
        assert_eq!(tokens.iter().map(Token::span).collect_vec(), vec![0..5, 6..7, 8..9, 10..11, 11..12]);
        for token in &tokens {
            assert_eq!(&source[token.span()], token.text);
        }
    }

    #[test]
    fn longest_operator_wins() {
        let lines = vec!["a...", "a..b", "a . . b", "a==b", "a=b"];
        let answers = vec![
            vec!["a", "..."],
            vec!["a", "..", "b"],
            vec!["a", ".", ".", "b"],
            vec!["a", "==", "b"],
            vec!["a", "=", "b"],
        ];

        for (line, answer) in zip(lines, answers) {
            assert_eq!(texts(&tokenizer().tokenize(line)), answer);
        }
    }

    #[test]
    fn keywords_win_ties_with_operators() {
        let tokenizer = Tokenizer::new(["=>"], ["=>", "="]);
        assert_eq!(tokenizer.literals[0], ("=>".to_string(), 0));
        assert_eq!(texts(&tokenizer.tokenize("a=>b")), vec!["a", "=>", "b"]);
    }

    #[test]
    fn keywords_match_as_prefixes() {
        // There is no identifier fusion, so a keyword prefix is always taken
        assert_eq!(texts(&tokenizer().tokenize("dog")), vec!["do", "g"]);
        assert_eq!(texts(&tokenizer().tokenize("nothing")), vec!["not", "h", "i", "n", "g"]);
    }

    #[test]
    fn whitespace_is_skipped_but_counted() {
        let tokens = tokenizer().tokenize("  do\n\tend   \n");
        assert_eq!(tokens, vec![
            Token { text: "do".to_string(), start: 2, end: 4 },
            Token { text: "end".to_string(), start: 6, end: 9 },
        ]);
        assert!(tokenizer().tokenize(" \n\t ").is_empty());
        assert!(tokenizer().tokenize("").is_empty());
    }

    #[test]
    fn multibyte_characters_keep_byte_offsets() {
        let tokens = tokenizer().tokenize("é<=ü");
        assert_eq!(texts(&tokens), vec!["é", "<=", "ü"]);
        assert_eq!(tokens[1].span(), 2..4);
        assert_eq!(tokens[2].span(), 4..6);
    }

    proptest! {
        #[test]
        fn tokens_reconstruct_the_source_without_whitespace(source in "[a-z0-9 .<=\n]{0,40}") {
            let tokens = tokenizer().tokenize(&source);
            let mut last_end = 0;
            for token in &tokens {
                prop_assert!(token.start >= last_end);
                prop_assert!(token.end > token.start);
                prop_assert_eq!(&source[token.span()], token.text.as_str());
                last_end = token.end;
            }

            let rebuilt: String = tokens.iter().map(|token| token.text.as_str()).collect();
            let expected: String = source.chars().filter(|c| !c.is_whitespace()).collect();
            prop_assert_eq!(rebuilt, expected);
        }
    }
}
