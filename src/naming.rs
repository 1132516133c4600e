//! Turning free text into figure names, file names and captions.

use crate::error::{AutoInkError, LineProblem};

/// Characters that would break the LaTeX command or look like a path.
const DISALLOWED_CHARS: &[char] = &['/', '{', '}'];

/// Display name of a figure: the text with surrounding whitespace removed.
pub fn to_display_name(text: &str) -> String {
    text.trim().to_string()
}

/// Convert arbitrary text to a lowercase file name stem.
///
/// Periods and apostrophes are dropped (a possessive `'s` goes with its
/// apostrophe), and every run of whitespace becomes a single `delimiter`.
pub fn to_slug(text: &str, delimiter: char) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut chars = text.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {}
            '\'' | '\u{2019}' => {
                if matches!(chars.peek(), Some('s' | 'S')) {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek().is_none_or(|next| !next.is_alphanumeric()) {
                        chars.next();
                    }
                }
            }
            _ => cleaned.push(c),
        }
    }

    let mut delim_buf = [0u8; 4];
    let delim: &str = delimiter.encode_utf8(&mut delim_buf);
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(delim)
        .to_lowercase()
}

/// Caption for a figure: first character upper-cased, the rest lower-cased,
/// trailing period added.
pub fn to_caption(display_name: &str) -> String {
    let name = display_name.trim();
    let mut chars = name.chars();
    let mut caption = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect::<String>(),
        None => String::new(),
    };
    caption.push('.');
    caption
}

/// Check whether a line of text can name a figure, and why not.
pub fn check_line(text: &str) -> Result<(), LineProblem> {
    if text.trim().is_empty() {
        return Err(LineProblem::Empty);
    }
    if text.contains(DISALLOWED_CHARS) {
        return Err(LineProblem::DisallowedCharacters);
    }
    Ok(())
}

/// Number of leading whitespace characters.
pub fn indentation_of(text: &str) -> usize {
    text.chars().count() - text.trim_start().chars().count()
}

/// Everything derived from the text a figure is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureRequest {
    pub raw_text: String,
    pub display_name: String,
    pub slug: String,
    pub caption: String,
}

impl FigureRequest {
    /// Validate `text` and derive the figure's names from it.
    pub fn from_text(text: &str, delimiter: char) -> Result<Self, AutoInkError> {
        check_line(text).map_err(AutoInkError::InvalidInput)?;

        let display_name = to_display_name(text);
        let slug = to_slug(text, delimiter);
        // Text made only of periods and apostrophes has nothing left to name a file.
        if slug.is_empty() {
            return Err(AutoInkError::InvalidInput(LineProblem::Empty));
        }

        Ok(Self {
            raw_text: text.to_string(),
            caption: to_caption(&display_name),
            display_name,
            slug,
        })
    }

    /// Leading whitespace of the source text, reproduced in the rendered command.
    pub fn indent(&self) -> usize {
        indentation_of(&self.raw_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_trims_only() {
        assert_eq!(to_display_name("  Vector Bundle \t"), "Vector Bundle");
    }

    #[test]
    fn test_slug_example() {
        assert_eq!(to_slug("My Figure's Name.", '_'), "my_figure_name");
    }

    #[test]
    fn test_slug_drops_possessive_s() {
        assert_eq!(to_slug("Cat's Toy", '_'), "cat_toy");
        assert_eq!(to_slug("It's", '_'), "it");
        // "Cat's" and "Cat" name the same file.
        assert_eq!(to_slug("Cat's", '_'), to_slug("Cat", '_'));
    }

    #[test]
    fn test_slug_collapses_whitespace_runs() {
        assert_eq!(to_slug("  Vector \t  Bundle  ", '_'), "vector_bundle");
        assert_eq!(to_slug("Vector Bundle", '-'), "vector-bundle");
    }

    #[test]
    fn test_slug_keeps_inner_apostrophe_letters() {
        assert_eq!(to_slug("Don't stop", '_'), "dont_stop");
        assert_eq!(to_slug("Cat'sup", '_'), "catsup");
    }

    #[test]
    fn test_slug_properties_hold() {
        let inputs = [
            "Hello World",
            "  A.B.C  ",
            "It's   a 'test'.",
            "MIXED Case\nNew line",
            "tab\tseparated\u{00a0}text",
            "ÜBER Straße",
        ];
        for input in inputs {
            let slug = to_slug(input, '_');
            assert!(!slug.chars().any(char::is_whitespace), "{slug:?}");
            assert!(!slug.contains('.'), "{slug:?}");
            assert!(!slug.contains('\''), "{slug:?}");
            assert_eq!(slug, slug.to_lowercase(), "{slug:?}");
        }
    }

    #[test]
    fn test_caption() {
        assert_eq!(to_caption("vector bundle"), "Vector bundle.");
        assert_eq!(to_caption("  the SVD  "), "The svd.");
        assert_eq!(to_caption("Vector Bundle"), "Vector bundle.");
    }

    #[test]
    fn test_check_line() {
        assert_eq!(check_line(""), Err(LineProblem::Empty));
        assert_eq!(check_line("   "), Err(LineProblem::Empty));
        assert_eq!(check_line("a/b"), Err(LineProblem::DisallowedCharacters));
        assert_eq!(check_line("\\ref{x}"), Err(LineProblem::DisallowedCharacters));
        assert_eq!(check_line("close}"), Err(LineProblem::DisallowedCharacters));
        assert_eq!(check_line("  Vector Bundle"), Ok(()));
    }

    #[test]
    fn test_indentation_of() {
        assert_eq!(indentation_of("Vector"), 0);
        assert_eq!(indentation_of("    Vector"), 4);
        assert_eq!(indentation_of("\t\tVector"), 2);
        assert_eq!(indentation_of("   "), 3);
    }

    #[test]
    fn test_figure_request_from_text() {
        let request = FigureRequest::from_text("    Vector Bundle", '_').unwrap();
        assert_eq!(request.display_name, "Vector Bundle");
        assert_eq!(request.slug, "vector_bundle");
        assert_eq!(request.caption, "Vector bundle.");
        assert_eq!(request.indent(), 4);
    }

    #[test]
    fn test_figure_request_rejects_invalid() {
        let err = FigureRequest::from_text("fig/one", '_').unwrap_err();
        assert!(matches!(
            err,
            AutoInkError::InvalidInput(LineProblem::DisallowedCharacters)
        ));

        let err = FigureRequest::from_text(" ... ", '_').unwrap_err();
        assert!(matches!(err, AutoInkError::InvalidInput(LineProblem::Empty)));
    }
}
