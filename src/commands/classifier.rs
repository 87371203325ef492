//! Command Classifier
//!
//! Decides whether a line of console input is a database query or a client
//! directive, and if it is a directive, which one.
//!
//! ## Grammar
//!
//! ```text
//! input      := directive | query
//! directive  := PREFIX keyword [WS argument]
//! keyword    := all characters up to the first whitespace (may be empty)
//! argument   := the remainder, trimmed
//! query      := anything that does not start with PREFIX
//! ```
//!
//! Keywords are matched exactly and case-sensitively against the directive
//! table. There is no prefix or fuzzy matching: `:clea` and `:Clear` are both
//! unrecognized.
//!
//! Classification is total. Every string maps to exactly one [`Decision`],
//! including the empty string (a query, since it cannot start with a prefix).

/// Keyword of the clear directive.
pub const CLEAR_KEYWORD: &str = "clear";

/// Keyword of the play directive.
pub const PLAY_KEYWORD: &str = "play";

/// The result of classifying one submitted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    /// The whole text is sent to the database engine.
    Query(&'a str),

    /// A prefixed client directive.
    Directive(Directive<'a>),
}

/// The closed set of client directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `clear` - empties the frame stream. Any argument is ignored.
    Clear,

    /// `play <argument>` - shows a local guide or fetches a remote one.
    Play { argument: &'a str },

    /// Any other keyword, including an empty one.
    Unrecognized,
}

impl Directive<'_> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Clear => "clear",
            Directive::Play { .. } => "play",
            Directive::Unrecognized => "unrecognized",
        }
    }
}

/// Classifies `text` against the current directive `prefix`.
///
/// # Example
///
/// ```
/// use framedeck::commands::{classify, Decision, Directive};
///
/// assert_eq!(classify(':', "RETURN 1"), Decision::Query("RETURN 1"));
/// assert_eq!(classify(':', ":clear"), Decision::Directive(Directive::Clear));
/// assert_eq!(
///     classify(':', ":play movies"),
///     Decision::Directive(Directive::Play { argument: "movies" })
/// );
/// ```
pub fn classify(prefix: char, text: &str) -> Decision<'_> {
    let rest = match text.strip_prefix(prefix) {
        Some(rest) => rest,
        None => return Decision::Query(text),
    };

    let (keyword, argument) = split_keyword(rest);

    let directive = match keyword {
        CLEAR_KEYWORD => Directive::Clear,
        PLAY_KEYWORD => Directive::Play { argument },
        _ => Directive::Unrecognized,
    };

    Decision::Directive(directive)
}

/// Splits the text after the prefix into `(keyword, argument)`.
///
/// The keyword is empty when the prefix is directly followed by whitespace
/// or by nothing at all.
fn split_keyword(rest: &str) -> (&str, &str) {
    match rest.split_once(char::is_whitespace) {
        Some((keyword, argument)) => (keyword, argument.trim()),
        None => (rest, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_query() {
        assert_eq!(classify(':', "RETURN 1"), Decision::Query("RETURN 1"));
        assert_eq!(
            classify(':', "MATCH (n) RETURN n :play"),
            Decision::Query("MATCH (n) RETURN n :play")
        );
    }

    #[test]
    fn test_empty_text_is_query() {
        assert_eq!(classify(':', ""), Decision::Query(""));
    }

    #[test]
    fn test_leading_whitespace_is_query() {
        // The prefix must be the very first character.
        assert_eq!(classify(':', " :clear"), Decision::Query(" :clear"));
    }

    #[test]
    fn test_clear() {
        assert_eq!(classify(':', ":clear"), Decision::Directive(Directive::Clear));
    }

    #[test]
    fn test_clear_ignores_argument() {
        assert_eq!(
            classify(':', ":clear everything now"),
            Decision::Directive(Directive::Clear)
        );
    }

    #[test]
    fn test_play_with_argument() {
        assert_eq!(
            classify(':', ":play a"),
            Decision::Directive(Directive::Play { argument: "a" })
        );
    }

    #[test]
    fn test_play_argument_is_trimmed() {
        assert_eq!(
            classify(':', ":play    http://test.test  "),
            Decision::Directive(Directive::Play {
                argument: "http://test.test"
            })
        );
    }

    #[test]
    fn test_play_keeps_inner_whitespace() {
        assert_eq!(
            classify(':', ":play\tsome guide name"),
            Decision::Directive(Directive::Play {
                argument: "some guide name"
            })
        );
    }

    #[test]
    fn test_bare_play() {
        assert_eq!(
            classify(':', ":play"),
            Decision::Directive(Directive::Play { argument: "" })
        );
    }

    #[test]
    fn test_unknown_keywords() {
        for text in [":unknown", ":help", ":help play", ":clearall", ":players"] {
            assert_eq!(
                classify(':', text),
                Decision::Directive(Directive::Unrecognized),
                "{text}"
            );
        }
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            classify(':', ":CLEAR"),
            Decision::Directive(Directive::Unrecognized)
        );
        assert_eq!(
            classify(':', ":Play a"),
            Decision::Directive(Directive::Unrecognized)
        );
    }

    #[test]
    fn test_prefix_without_keyword() {
        assert_eq!(classify(':', ":"), Decision::Directive(Directive::Unrecognized));
        assert_eq!(
            classify(':', ": clear"),
            Decision::Directive(Directive::Unrecognized)
        );
    }

    #[test]
    fn test_custom_prefix() {
        assert_eq!(classify('/', "/clear"), Decision::Directive(Directive::Clear));
        assert_eq!(classify('/', ":clear"), Decision::Query(":clear"));
    }

    #[test]
    fn test_multibyte_prefix() {
        assert_eq!(
            classify('§', "§play x"),
            Decision::Directive(Directive::Play { argument: "x" })
        );
    }
}
