//! Rendering the LaTeX command that includes a figure.
//!
//! The command template uses brace placeholders: `{file_name}`, `{caption}`
//! and `{fig_name}`. Literal braces are written `{{` and `}}`.

use crate::error::TemplateError;
use crate::naming::to_caption;

pub const FILE_NAME: &str = "file_name";
pub const CAPTION: &str = "caption";
pub const LABEL: &str = "fig_name";

const PLACEHOLDERS: [&str; 3] = [FILE_NAME, CAPTION, LABEL];

/// A piece of a parsed command template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    LiteralBrace(char),
    Placeholder(&'static str),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let bytes = template.as_bytes();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                segments.push(Segment::Text(&template[text_start..i]));
                segments.push(Segment::LiteralBrace(bytes[i] as char));
                i += 2;
                text_start = i;
            }
            b'{' => {
                let close = template[i + 1..]
                    .find(['{', '}'])
                    .map(|offset| i + 1 + offset)
                    .filter(|&end| bytes[end] == b'}')
                    .ok_or(TemplateError::UnclosedBrace(i))?;
                let name = &template[i + 1..close];
                let placeholder = PLACEHOLDERS
                    .iter()
                    .copied()
                    .find(|known| *known == name)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;

                segments.push(Segment::Text(&template[text_start..i]));
                segments.push(Segment::Placeholder(placeholder));
                i = close + 1;
                text_start = i;
            }
            b'}' => return Err(TemplateError::StrayClosingBrace(i)),
            _ => i += 1,
        }
    }
    segments.push(Segment::Text(&template[text_start..]));

    if let Some(missing) = PLACEHOLDERS
        .into_iter()
        .find(|name| !segments.contains(&Segment::Placeholder(*name)))
    {
        return Err(TemplateError::MissingPlaceholder(missing));
    }

    Ok(segments)
}

/// Check a command template without rendering it.
pub fn validate(template: &str) -> Result<(), TemplateError> {
    parse(template).map(|_| ())
}

/// Render `template` for a figure.
///
/// The file reference is `slug`, the caption comes from `display_name` and
/// the label is `fig:<slug>`; each is wrapped in a brace group. With a
/// non-zero `indent`, every line is prefixed with that many spaces.
pub fn render(
    template: &str,
    display_name: &str,
    slug: &str,
    indent: usize,
) -> Result<String, TemplateError> {
    let caption = to_caption(display_name);
    let label = format!("fig:{}", slug);

    let mut rendered = String::with_capacity(template.len() + 64);
    for segment in parse(template)? {
        match segment {
            Segment::Text(text) => rendered.push_str(text),
            Segment::LiteralBrace(brace) => rendered.push(brace),
            Segment::Placeholder(name) => {
                let value = match name {
                    FILE_NAME => slug,
                    CAPTION => caption.as_str(),
                    _ => label.as_str(),
                };
                rendered.push('{');
                rendered.push_str(value);
                rendered.push('}');
            }
        }
    }

    if indent == 0 {
        return Ok(rendered);
    }

    let pad = " ".repeat(indent);
    Ok(rendered
        .split('\n')
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n"))
}
