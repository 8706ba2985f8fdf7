//! Diagnostic rendering: ANSI palette, cursor display, semantic-map display.
//!
//! The visualizations are best-effort aids for reproducing a failure by
//! hand. Both are pure functions over the source bytes the harness already
//! holds, so a broken corpus file degrades the diagnostic, never the run.

use crate::smap::SmapEntry;

pub const RED: &str = "\x1b[0;31m";
pub const GREEN: &str = "\x1b[0;32m";
pub const MAGENTA: &str = "\x1b[0;35m";
pub const BRIGHT_RED: &str = "\x1b[1;31m";
pub const BLUE_BG: &str = "\x1b[44m";
pub const RESET: &str = "\x1b[0m";

/// Horizontal rule separating diagnostic blocks.
pub fn rule() -> String {
    "\u{2500}".repeat(72)
}

/// Colorized PASS marker.
pub fn pass() -> String {
    format!("{GREEN}PASS!{RESET}")
}

/// Colorized FAIL marker.
pub fn fail() -> String {
    format!("{RED}FAIL!{RESET}")
}

/// Render the source with the byte at `offset` highlighted.
///
/// A newline at the cursor is shown as a red `#` so the position stays
/// visible; any other byte is printed in red in place. An offset at or past
/// the end of the file appends a red `#` instead of truncating the render.
pub fn render_cursor(source: &[u8], offset: usize) -> String {
    let mut out = String::new();
    if offset >= source.len() {
        out.push_str(&String::from_utf8_lossy(source));
        out.push_str(&format!("{BRIGHT_RED}#{RESET}"));
        return out;
    }

    out.push_str(&String::from_utf8_lossy(&source[..offset]));
    if source[offset] == b'\n' {
        out.push_str(&format!("{BRIGHT_RED}#{RESET}"));
        out.push_str(&String::from_utf8_lossy(&source[offset..]));
    } else {
        out.push_str(&format!(
            "{BRIGHT_RED}{}{RESET}",
            String::from_utf8_lossy(&source[offset..offset + 1])
        ));
        out.push_str(&String::from_utf8_lossy(&source[offset + 1..]));
    }
    out
}

/// Length of the map span covering `offset`, or 0 when unmapped.
fn span_at(offset: usize, smap: &[SmapEntry]) -> usize {
    for entry in smap {
        if offset >= entry.offset && offset < entry.offset + entry.length {
            return entry.length;
        }
    }
    0
}

/// Render the source with every semantic-map span on a highlighted
/// background.
pub fn render_smap(source: &[u8], smap: &[SmapEntry]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < source.len() {
        let len = span_at(i, smap);
        if len > 0 {
            let end = (i + len).min(source.len());
            out.push_str(BLUE_BG);
            out.push_str(&String::from_utf8_lossy(&source[i..end]));
            out.push_str(RESET);
            i = end;
        } else {
            out.push_str(&String::from_utf8_lossy(&source[i..i + 1]));
            i += 1;
        }
    }
    out
}
