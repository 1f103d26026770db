//! Remote `src:` → local path rewrite for provider stylesheets.
//!
//! The provider names the same font file differently in its catalog and in
//! its CSS (anything from 8 to 36+ characters), so exact matching fails.
//! Instead each catalog basename is matched against each remote `src:` line
//! by its longest prefix found in the line, and the best-scoring file wins
//! the line.
//!
//! ```text
//! phase 1  collect_matches(lines, fonts) ──► BTreeMap<line, LineMatch>
//!            for font in fonts:
//!              for line in remote src lines:
//!                len = longest prefix of font.basename in line (case-insensitive)
//!                keep if len > current best for line
//!
//! phase 2  render_lines(lines, fonts, matches) ──► String
//!            matched line → "  src: url('<local>') format('<fmt>');"
//!            other lines  → unchanged
//! ```
//!
//! Cost is O(fonts × lines × basename length), fine for the handful of
//! lines a family stylesheet has.

use std::collections::BTreeMap;
use std::fmt;

/// A line is a rewrite candidate when, whitespace removed, it starts with this.
pub const REMOTE_SRC_MARKER: &str = "src:url(http";

// ── Font format ─────────────────────────────────────────────────────

/// `format()` token for a font file, derived from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontFormat {
    Woff,
    Woff2,
    Svg,
    TrueType,
}

impl FontFormat {
    pub fn from_filename(name: &str) -> Self {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("woff") => FontFormat::Woff,
            Some("woff2") => FontFormat::Woff2,
            Some("svg") => FontFormat::Svg,
            _ => FontFormat::TrueType,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontFormat::Woff => "woff",
            FontFormat::Woff2 => "woff2",
            FontFormat::Svg => "svg",
            FontFormat::TrueType => "truetype",
        }
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Local font reference ────────────────────────────────────────────

/// A catalog font file as the stylesheet should reference it.
///
/// Files that could not be mirrored still take part in matching so they
/// claim their own line, but that line is left remote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFontRef {
    /// Basename from the catalog URL, used for matching.
    pub basename: String,
    /// Path written into `url(...)`, relative to the stylesheet.
    /// `None` when the file is not available locally.
    pub href: Option<String>,
    pub format: FontFormat,
}

impl LocalFontRef {
    pub fn new(basename: impl Into<String>, href: impl Into<String>) -> Self {
        let basename = basename.into();
        let format = FontFormat::from_filename(&basename);
        Self {
            basename,
            href: Some(href.into()),
            format,
        }
    }

    pub fn unavailable(basename: impl Into<String>) -> Self {
        let basename = basename.into();
        let format = FontFormat::from_filename(&basename);
        Self {
            basename,
            href: None,
            format,
        }
    }

    /// Replacement `src:` declaration, without line terminator.
    pub fn src_line(&self) -> Option<String> {
        let href = self.href.as_deref()?;
        Some(format!("  src: url('{href}') format('{}');", self.format))
    }
}

// ── Matching ────────────────────────────────────────────────────────

/// Best match recorded for one stylesheet line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineMatch {
    /// Index into the font list.
    pub font: usize,
    /// Matched prefix length in characters.
    pub prefix_len: usize,
}

pub fn is_remote_src_line(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.starts_with(REMOTE_SRC_MARKER)
}

/// Length (in chars) of the longest non-empty prefix of `filename` that
/// occurs in `line_lower`. `line_lower` must already be lowercased.
pub fn matched_prefix_len(filename: &str, line_lower: &str) -> Option<usize> {
    let name = filename.to_lowercase();
    if name.is_empty() {
        return None;
    }
    let mut ends: Vec<usize> = name.char_indices().map(|(i, _)| i).skip(1).collect();
    ends.push(name.len());

    ends.iter()
        .enumerate()
        .rev()
        .find(|&(_, &end)| line_lower.contains(&name[..end]))
        .map(|(chars_minus_one, _)| chars_minus_one + 1)
}

/// Phase 1: pick the best font for every remote `src:` line.
///
/// Longer prefix wins; on a tie the earlier font keeps the line.
pub fn collect_matches(lines: &[&str], fonts: &[LocalFontRef]) -> BTreeMap<usize, LineMatch> {
    let candidates: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_remote_src_line(line))
        .map(|(i, line)| (i, line.to_lowercase()))
        .collect();

    let mut matches: BTreeMap<usize, LineMatch> = BTreeMap::new();
    for (font_idx, font) in fonts.iter().enumerate() {
        for (line_idx, line_lower) in &candidates {
            let Some(prefix_len) = matched_prefix_len(&font.basename, line_lower) else {
                continue;
            };
            let better = matches
                .get(line_idx)
                .map_or(true, |current| current.prefix_len < prefix_len);
            if better {
                matches.insert(*line_idx, LineMatch { font: font_idx, prefix_len });
            }
        }
    }
    matches
}

/// Phase 2: render lines, swapping matched ones for local `src:` lines.
///
/// Returns the text and the number of lines actually replaced.
pub fn render_lines(
    lines: &[&str],
    fonts: &[LocalFontRef],
    matches: &BTreeMap<usize, LineMatch>,
) -> (String, usize) {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len()).sum());
    let mut replaced = 0;
    for (i, line) in lines.iter().enumerate() {
        let src = matches
            .get(&i)
            .and_then(|m| fonts.get(m.font))
            .and_then(|font| font.src_line());
        match src {
            Some(src) => {
                out.push_str(&src);
                out.push_str(line_terminator(line));
                replaced += 1;
            }
            None => out.push_str(line),
        }
    }
    (out, replaced)
}

fn line_terminator(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Result of rewriting one stylesheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rewrite {
    pub css: String,
    pub lines_rewritten: usize,
}

/// Both phases over a whole stylesheet.
pub fn rewrite_stylesheet(css: &str, fonts: &[LocalFontRef]) -> Rewrite {
    let lines: Vec<&str> = css.split_inclusive('\n').collect();
    let matches = collect_matches(&lines, fonts);
    let (css, lines_rewritten) = render_lines(&lines, fonts, &matches);
    Rewrite { css, lines_rewritten }
}
