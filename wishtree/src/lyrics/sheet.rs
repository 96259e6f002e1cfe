use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::CardResult;

/// One timed lyric line.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricLine {
    /// Song position in seconds at which the line becomes active.
    pub time: f64,
    pub text: String,
}

/// Lyric lines sorted by time.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricSheet {
    lines: Vec<LyricLine>,
}

impl LyricSheet {
    /// Build a sheet from arbitrary lines; sorting is stable so equal timestamps keep input order.
    pub fn from_lines(mut lines: Vec<LyricLine>) -> Self {
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { lines }
    }

    pub fn from_path(path: &Path) -> CardResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lyrics '{}'", path.display()))?;
        Ok(parse_lyrics(&raw))
    }

    /// Sheet shipped with the crate, used when a card names no lyrics file.
    pub fn builtin() -> Self {
        parse_lyrics(BUILTIN_LYRICS)
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Last line whose timestamp is `<= t`, or `None` before the first line.
    pub fn line_at(&self, t: f64) -> Option<&LyricLine> {
        let idx = self.lines.partition_point(|l| l.time <= t);
        idx.checked_sub(1).map(|i| &self.lines[i])
    }
}

/// Parse `MM:SS` / text line pairs.
///
/// A leading byte order mark and blank lines are ignored. A timestamp pairs with the following line unless that line is itself a
/// timestamp; unpaired timestamps and stray text lines are dropped.
pub fn parse_lyrics(raw: &str) -> LyricSheet {
    let lines: Vec<&str> = raw
        .trim_start_matches('\u{FEFF}')
        .trim()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut parsed = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if let Some(time) = parse_timestamp(lines[i])
            && let Some(text) = lines.get(i + 1)
            && parse_timestamp(text).is_none()
        {
            parsed.push(LyricLine {
                time,
                text: (*text).to_owned(),
            });
            i += 1;
        }
        i += 1;
    }
    LyricSheet::from_lines(parsed)
}

/// Exactly two digits, a colon, two digits.
fn parse_timestamp(line: &str) -> Option<f64> {
    let b = line.as_bytes();
    if b.len() != 5 || b[2] != b':' {
        return None;
    }
    let digit = |c: u8| c.is_ascii_digit().then(|| f64::from(c - b'0'));
    let min = digit(b[0])? * 10.0 + digit(b[1])?;
    let sec = digit(b[3])? * 10.0 + digit(b[4])?;
    Some(min * 60.0 + sec)
}

const BUILTIN_LYRICS: &str = "
00:02
(soft piano)
00:09
Lights are climbing up the tree
00:15
Every spark a day with you
00:21
Counting all the way to a hundred
00:28
And starting over, something new
00:35
Make a wish and let it fly
00:41
Watch it settle on the heart up high
00:48
Snow is falling, slow and bright
00:54
Stay with me a little while tonight
01:01
Make a wish and let it fly
01:07
Every star is yours and mine
01:14
(soft piano)
";

#[cfg(test)]
#[path = "../../tests/unit/lyrics/sheet.rs"]
mod tests;
