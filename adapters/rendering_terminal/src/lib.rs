#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terminal rendering backend that writes composited buffers as ANSI text.

pub mod palette;

use std::{
    fmt::Write as _,
    io::{self, Write},
};

use anyhow::{Context, Result};
use mirkwood_rendering::{Buffer, Cell, CellIdentity, Color, RenderingBackend};

pub use palette::{Palette, Style};

const RESET: &str = "\x1b[0m";

/// Writes one frame per [`RenderingBackend::present`] call to `W`.
#[derive(Debug)]
pub struct TerminalBackend<W> {
    writer: W,
    palette: &'static Palette,
    color: bool,
    show_agent: bool,
}

impl TerminalBackend<io::Stdout> {
    /// Creates a backend writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalBackend<W> {
    /// Creates a backend using the active palette.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            palette: palette::active(),
            color: true,
            show_agent: true,
        }
    }

    /// Toggles ANSI truecolour escapes.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Toggles drawing the agent; a hidden agent is drawn as the ground beneath it.
    #[must_use]
    pub fn with_agent_visibility(mut self, show_agent: bool) -> Self {
        self.show_agent = show_agent;
        self
    }

    /// Consumes the backend and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Renders `buffer` into a string, one line per cell row.
    #[must_use]
    pub fn render_to_string(&self, buffer: &Buffer) -> String {
        let mut frame = String::with_capacity(buffer.cells().len() * 4);
        for row in buffer.rows() {
            let mut current: Option<Style> = None;
            for &cell in row {
                let cell = self.visible(cell);
                if self.color {
                    let style = self.palette.style(cell);
                    if current != Some(style) {
                        push_style(&mut frame, style);
                        current = Some(style);
                    }
                }
                frame.push(self.palette.glyph(cell));
            }
            if self.color {
                frame.push_str(RESET);
            }
            frame.push('\n');
        }
        frame
    }

    fn visible(&self, cell: Cell) -> Cell {
        if self.show_agent || cell.identity() != CellIdentity::Player {
            return cell;
        }
        Cell::new(CellIdentity::Path, cell.is_marked(), cell.is_visited())
            .with_decoration(cell.decoration())
    }
}

impl<W: Write> RenderingBackend for TerminalBackend<W> {
    fn present(&mut self, buffer: &Buffer) -> Result<()> {
        let frame = self.render_to_string(buffer);
        self.writer
            .write_all(frame.as_bytes())
            .context("failed to write frame to terminal")?;
        self.writer.flush().context("failed to flush terminal")?;
        log::trace!("presented {} bytes", frame.len());
        Ok(())
    }
}

fn push_style(frame: &mut String, style: Style) {
    let Style {
        foreground: Color {
            red: fr,
            green: fg,
            blue: fb,
        },
        background: Color {
            red: br,
            green: bg,
            blue: bb,
        },
    } = style;
    let _ = write!(frame, "\x1b[38;2;{fr};{fg};{fb}m\x1b[48;2;{br};{bg};{bb}m");
}
