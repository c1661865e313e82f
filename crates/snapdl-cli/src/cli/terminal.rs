//! Terminal setup at process entry, plus the column count the panel fits into.

use std::io::{self, IsTerminal, Write};

const FALLBACK_WIDTH: usize = 80;

/// Clears the screen and homes the cursor. No-op when stdout is not a terminal.
pub fn clear_screen() {
    let mut stdout = io::stdout();
    if !stdout.is_terminal() {
        return;
    }
    let _ = write!(stdout, "\x1b[2J\x1b[H");
    let _ = stdout.flush();
}

/// Columns of the terminal on stdout. Falls back to `$COLUMNS`, then 80.
pub fn width() -> usize {
    #[cfg(unix)]
    {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let r = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
        if r == 0 && ws.ws_col > 0 {
            return usize::from(ws.ws_col);
        }
        tracing::debug!("TIOCGWINSZ failed, using fallback width");
    }
    columns_or_default(std::env::var("COLUMNS").ok().as_deref())
}

fn columns_or_default(columns: Option<&str>) -> usize {
    columns
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|&c| c > 0)
        .unwrap_or(FALLBACK_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_fallback() {
        assert_eq!(columns_or_default(Some("132")), 132);
        assert_eq!(columns_or_default(Some(" 60\n")), 60);
        assert_eq!(columns_or_default(Some("0")), 80);
        assert_eq!(columns_or_default(Some("wide")), 80);
        assert_eq!(columns_or_default(None), 80);
    }
}
