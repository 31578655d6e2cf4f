//! Fixed-column text layout shared by every emitting routine.
//!
//! GPSS statements live in two columns: a label field padded to `margin`
//! characters and the statement text after a single space. Section banners
//! are centered within `width` between `*` frames. Both values derive from
//! the longest interface base label, so two components computing a layout
//! from the same topology always agree.

/// Formatting parameters for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub margin: usize,
    pub width: usize,
}

impl Layout {
    /// Derive the layout from the full set of interface base labels.
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let longest = labels.into_iter().map(str::len).max().unwrap_or(0);
        let margin = longest + 5;
        Self {
            margin,
            width: margin * 4 + 16,
        }
    }

    /// One statement line: the label left-padded into the mnemonic column,
    /// one space, then the statement text. Pass an empty label for plain
    /// (unlabeled) statements.
    pub fn stmt(&self, label: &str, text: &str) -> String {
        format!("{:<width$} {}", label, text, width = self.margin)
    }

    /// Center `text` in a `*`-framed banner line filled with `=`.
    pub fn banner(&self, text: &str) -> String {
        let len = text.chars().count();
        let fill = self.width.saturating_sub(len);
        let left = fill / 2;
        format!(
            "*{}{}{}*",
            "=".repeat(left),
            text,
            "=".repeat(fill - left)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_and_width_from_longest_label() {
        let layout = Layout::from_labels(["abc", "abcde", "abcdefgh"]);
        assert_eq!(layout.margin, 13);
        assert_eq!(layout.width, 68);
    }

    #[test]
    fn empty_label_set_degrades_to_minimum() {
        let layout = Layout::from_labels(std::iter::empty::<&str>());
        assert_eq!(layout.margin, 5);
        assert_eq!(layout.width, 36);
    }

    #[test]
    fn stmt_pads_label_column() {
        let layout = Layout::from_labels(["abcdefgh"]);
        assert_eq!(layout.stmt("la_x", "EQU       5"), "la_x          EQU       5");
        assert_eq!(layout.stmt("", "TERMINATE"), "              TERMINATE");
    }

    #[test]
    fn banner_is_centered_and_framed() {
        let layout = Layout::from_labels(["abcdefgh"]);
        let line = layout.banner("[X]");
        assert_eq!(line.chars().count(), layout.width + 2);
        assert!(line.starts_with("*="));
        assert!(line.ends_with("=*"));
        assert!(line.contains("[X]"));
        // extra fill character lands on the right
        let inner = &line[1..line.len() - 1];
        let left = inner.find('[').unwrap();
        let right = inner.len() - inner.find(']').unwrap() - 1;
        assert!(right >= left);
    }

    #[test]
    fn empty_banner_is_a_full_bar() {
        let layout = Layout::from_labels(["abcdefgh"]);
        assert_eq!(layout.banner(""), format!("*{}*", "=".repeat(68)));
    }
}
