/*!
format.rs

Formatting primitives for human output paths.

  - StyleOptions::detect() : color on unless NO_COLOR is set; width from COLUMNS
  - color(role, text, &style)
  - field_line(label, value) : fixed-width label column used by describe/execute
  - table(headers, rows, &style) : column-aligned table, shrinking the widest
                                   columns first when over the terminal width
  - truncate_ellipsis(s, max_chars)

Helpers return strings; printing is left to `crate::printer`.
JSON output paths do not use these helpers.
*/

use std::borrow::Cow;

/// Width of the label column in `field_line`.
pub const LABEL_WIDTH: usize = 40;

const MIN_COL_WIDTH: usize = 4;

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub term_width: usize,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self::detect()
    }
}

impl StyleOptions {
    pub fn detect() -> Self {
        let use_color = std::env::var_os("NO_COLOR").is_none();
        let term_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(120);
        StyleOptions {
            use_color,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Accent,
    Success,
    Warning,
    Error,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Accent => "35",  // magenta
        Role::Success => "32", // green
        Role::Warning => "33", // yellow
        Role::Error => "31",   // red
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/// `label` left-aligned in a fixed column followed by `value`.
pub fn field_line(label: &str, value: &str) -> String {
    format!("{label:<width$} {value}", width = LABEL_WIDTH)
}

pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let gutter = (cols - 1) * 2;
    let total: usize = widths.iter().sum::<usize>() + gutter;
    if total > style.term_width {
        let mut overflow = total - style.term_width;
        let mut order: Vec<usize> = (0..cols).collect();
        order.sort_by(|a, b| widths[*b].cmp(&widths[*a]));
        for idx in order {
            if overflow == 0 {
                break;
            }
            if widths[idx] > MIN_COL_WIDTH {
                let shrink = (widths[idx] - MIN_COL_WIDTH).min(overflow);
                widths[idx] -= shrink;
                overflow -= shrink;
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header = headers
        .iter()
        .enumerate()
        .map(|(i, h)| fit(h, widths[i]))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(color(Role::Accent, header.trim_end(), style));
    let sep = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(color(Role::Dim, sep, style));

    for row in rows {
        let line = (0..cols)
            .map(|c| fit(row.get(c).map(String::as_str).unwrap_or(""), widths[c]))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Pad to `width`, or cut with an ellipsis when longer.
fn fit(s: &str, width: usize) -> String {
    let len = display_width(s);
    if len <= width {
        return format!("{s}{}", " ".repeat(width - len));
    }
    truncate_ellipsis(&strip_ansi(s), width)
}

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequences end at the first ASCII letter.
            for n in chars.by_ref() {
                if n.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(width: usize) -> StyleOptions {
        StyleOptions {
            use_color: false,
            term_width: width,
        }
    }

    #[test]
    fn field_line_pads_label() {
        let line = field_line("Executing Proc", "say-hello-world");
        assert!(line.starts_with("Executing Proc "));
        assert_eq!(line.find("say-hello-world"), Some(LABEL_WIDTH + 1));
    }

    #[test]
    fn table_aligns_columns() {
        let t = table(
            &["NAME", "DESCRIPTION"],
            &[
                vec!["a".into(), "first".into()],
                vec!["longer".into(), "second".into()],
            ],
            &plain(120),
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "NAME    DESCRIPTION");
        assert_eq!(lines[2], "a       first");
        assert_eq!(lines[3], "longer  second");
    }

    #[test]
    fn table_shrinks_to_width() {
        let long = "x".repeat(80);
        let t = table(&["NAME", "DESCRIPTION"], &[vec!["p".into(), long]], &plain(40));
        for line in t.lines() {
            assert!(line.chars().count() <= 40, "line too wide: {line}");
        }
        assert!(t.contains('…'));
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_ellipsis("abc", 4), "abc");
    }

    #[test]
    fn strip_ansi_removes_codes() {
        assert_eq!(strip_ansi("\x1b[31mRED\x1b[0m"), "RED");
    }

    #[test]
    fn color_respects_style() {
        assert_eq!(color(Role::Error, "x", &plain(80)), "x");
        let colored = StyleOptions {
            use_color: true,
            term_width: 80,
        };
        assert_eq!(color(Role::Error, "x", &colored), "\x1b[31mx\x1b[0m");
    }
}
