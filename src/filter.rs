use crate::cli::CliArgs;

/// Substring filters applied to raw listing text, built from CLI arguments.
#[derive(Debug, Default)]
pub struct TextFilter {
    /// A line must contain every one of these.
    pub include: Vec<String>,
    /// A line must contain none of these.
    pub exclude: Vec<String>,
}

impl TextFilter {
    /// Build a `TextFilter` from parsed CLI arguments.
    pub fn from_cli(args: &CliArgs) -> Self {
        TextFilter {
            include: args.contain.clone(),
            exclude: args.exclude.clone(),
        }
    }

    /// Returns `true` if no filters are configured at all.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Keep lines matching every include filter and no exclude filter.
    pub fn apply(&self, text: &str) -> String {
        keep_none(&keep_all(text, &self.include), &self.exclude)
    }
}

// ---------------------------------------------------------------------------
// Line primitives
// ---------------------------------------------------------------------------

/// Keep the lines of `text` that contain every filter substring.
///
/// Kept lines are rejoined with `\n` in their original order. With no
/// filters every line is kept.
pub fn keep_all<S: AsRef<str>>(text: &str, filters: &[S]) -> String {
    select_lines(text, |line| filters.iter().all(|f| line.contains(f.as_ref())))
}

/// Keep the lines of `text` that contain none of the filter substrings.
pub fn keep_none<S: AsRef<str>>(text: &str, filters: &[S]) -> String {
    select_lines(text, |line| !filters.iter().any(|f| line.contains(f.as_ref())))
}

/// Number of lines in `text`. A trailing newline does not start a new line.
pub fn line_count(text: &str) -> usize {
    text.lines().count()
}

fn select_lines(text: &str, keep: impl Fn(&str) -> bool) -> String {
    text.lines()
        .filter(|line| keep(line))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
