use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::session::Session;
use crate::tui::theme;
use crate::utils::format::format_location;

pub fn render(frame: &mut Frame, area: Rect, session: &Session, today: NaiveDate) {
    let date_str = today.format("%A, %b %d, %Y").to_string();

    let title_line = Line::from(vec![
        Span::styled("  وقت  ", theme::gold().add_modifier(Modifier::BOLD)),
        Span::styled("waqt", theme::gold()),
    ]);

    let info_line = Line::from(vec![
        Span::styled(session.profile.full_name.as_str(), theme::amber()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(format_location(&session.profile), theme::dim()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(date_str, theme::dim()),
    ]);

    let text = vec![title_line, Line::from(""), info_line];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::gold().add_modifier(Modifier::BOLD))
        .style(theme::base());

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
