//! `KEY=VALUE` token parsing for `proctor execute`.
//!
//! Tokens are split on the first `=`. A token with no separator, or with an
//! empty key, is reported back as malformed and left out of the map; parsing
//! always runs to the end of the input.

use indexmap::IndexMap;

/// Proc arguments keyed by name. Iteration follows first insertion; a repeated
/// key keeps its position and takes the later value.
pub type ArgumentMap = IndexMap<String, String>;

/// A token that could not be read as `KEY=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedToken(pub String);

impl MalformedToken {
    /// The literal token as the user typed it.
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Outcome of parsing a token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub args: ArgumentMap,
    pub malformed: Vec<MalformedToken>,
}

/// Split a single token into key and value.
pub fn parse_token(token: &str) -> Result<(&str, &str), MalformedToken> {
    match token.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(MalformedToken(token.to_string())),
    }
}

pub fn parse_args<I, S>(tokens: I) -> ParsedArgs
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedArgs::default();
    for token in tokens {
        match parse_token(token.as_ref()) {
            Ok((key, value)) => {
                parsed.args.insert(key.to_string(), value.to_string());
            }
            Err(bad) => parsed.malformed.push(bad),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_tokens() {
        let parsed = parse_args(["A=1", "B=2"]);
        assert_eq!(parsed.args.get("A").map(String::as_str), Some("1"));
        assert_eq!(parsed.args.get("B").map(String::as_str), Some("2"));
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn single_token_split() {
        assert_eq!(parse_token("A=b=c"), Ok(("A", "b=c")));
        assert_eq!(parse_token("A="), Ok(("A", "")));
        assert_eq!(parse_token("=x"), Err(MalformedToken("=x".into())));
        assert_eq!(parse_token("plain"), Err(MalformedToken("plain".into())));
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let parsed = parse_args(Vec::<String>::new());
        assert!(parsed.args.is_empty());
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn reports_each_malformed_token_and_keeps_the_rest() {
        let parsed = parse_args(["incorrect-format", "A=1", "=orphan", "B=2"]);
        assert_eq!(
            parsed.malformed,
            vec![
                MalformedToken("incorrect-format".into()),
                MalformedToken("=orphan".into())
            ]
        );
        assert_eq!(parsed.args.len(), 2);
        assert_eq!(parsed.args.get("B").map(String::as_str), Some("2"));
    }

    #[test]
    fn malformed_detection_does_not_depend_on_position() {
        let a = parse_args(["bad", "A=1"]);
        let b = parse_args(["A=1", "bad"]);
        assert_eq!(a.args, b.args);
        assert_eq!(a.malformed, b.malformed);
    }

    #[test]
    fn last_duplicate_wins() {
        let parsed = parse_args(["A=1", "B=2", "A=3"]);
        assert_eq!(parsed.args.get("A").map(String::as_str), Some("3"));
        let keys: Vec<&str> = parsed.args.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn splits_on_first_separator_only() {
        let parsed = parse_args(["QUERY=a=b", "EMPTY="]);
        assert_eq!(parsed.args.get("QUERY").map(String::as_str), Some("a=b"));
        assert_eq!(parsed.args.get("EMPTY").map(String::as_str), Some(""));
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn malformed_token_keeps_literal() {
        let parsed = parse_args(["--flag"]);
        assert_eq!(parsed.malformed[0].token(), "--flag");
    }
}
