use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};

use crate::grid::{GridSize, Position};
use crate::simulation::SimulationState;

/// Terminal columns per logical cell. Two columns make a cell roughly square.
pub const CELL_WIDTH: u16 = 2;

/// Glyph drawn for one occupied cell.
pub const GLYPH_CELL: &str = "██";

pub const SNAKE_COLOR: Color = Color::Green;
pub const APPLE_COLOR: Color = Color::Red;
pub const BORDER_COLOR: Color = Color::DarkGray;

/// Extra front-end state shown next to the board.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay {
    pub paused: bool,
}

/// Renders the board and a one-line status bar from immutable state.
pub fn render(frame: &mut Frame<'_>, state: &SimulationState<'_>, overlay: Overlay) {
    let [board_area, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());

    let block = Block::bordered()
        .title(" snake ")
        .border_style(Style::new().fg(BORDER_COLOR));
    let inner = block.inner(board_area);
    frame.render_widget(block, board_area);

    render_apple(frame, inner, state);
    render_snake(frame, inner, state);

    frame.render_widget(
        Paragraph::new(status_line(state, overlay))
            .alignment(Alignment::Left)
            .style(Style::new().fg(Color::Gray)),
        status_area,
    );
}

fn render_apple(frame: &mut Frame<'_>, inner: Rect, state: &SimulationState<'_>) {
    let Some((x, y)) = logical_to_terminal(inner, state.bounds, state.apple.position) else {
        return;
    };

    frame
        .buffer_mut()
        .set_string(x, y, GLYPH_CELL, Style::new().fg(APPLE_COLOR));
}

fn render_snake(frame: &mut Frame<'_>, inner: Rect, state: &SimulationState<'_>) {
    let head = state.snake.head();
    let buffer = frame.buffer_mut();

    for segment in state.body() {
        let Some((x, y)) = logical_to_terminal(inner, state.bounds, segment) else {
            continue;
        };

        let mut style = Style::new().fg(SNAKE_COLOR);
        if segment == head {
            style = style.add_modifier(Modifier::BOLD);
        }
        buffer.set_string(x, y, GLYPH_CELL, style);
    }
}

fn status_line(state: &SimulationState<'_>, overlay: Overlay) -> Line<'static> {
    let mut text = format!(
        " length {} | ticks {} | resets {} | {}x{}",
        state.snake.len(),
        state.tick_count,
        state.resets,
        state.bounds.width,
        state.bounds.height,
    );
    if overlay.paused {
        text.push_str(" | PAUSED");
    }
    Line::from(text)
}

/// Maps a logical cell to the top-left terminal cell it is drawn at.
///
/// Returns `None` for cells outside the grid or outside the visible area.
#[must_use]
pub fn logical_to_terminal(inner: Rect, bounds: GridSize, position: Position) -> Option<(u16, u16)> {
    if !position.is_within_bounds(bounds) {
        return None;
    }

    let x_offset = u16::try_from(position.x).ok()?.checked_mul(CELL_WIDTH)?;
    let y_offset = u16::try_from(position.y).ok()?;

    let x = inner.x.saturating_add(x_offset);
    let y = inner.y.saturating_add(y_offset);
    if x.saturating_add(CELL_WIDTH) > inner.right() || y >= inner.bottom() {
        return None;
    }

    Some((x, y))
}

/// Terminal size needed to show `bounds` in full, borders and status bar included.
#[must_use]
pub fn required_area(bounds: GridSize) -> (u16, u16) {
    (
        bounds.width.saturating_mul(CELL_WIDTH).saturating_add(2),
        bounds.height.saturating_add(3),
    )
}
