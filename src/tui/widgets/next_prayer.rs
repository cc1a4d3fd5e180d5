use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::models::{Countdown, PrayerTime};
use crate::prayer_times::format_countdown;
use crate::tui::app::LoadStatus;
use crate::tui::theme;
use crate::utils::format::format_instant;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    status: &LoadStatus,
    next_prayer: Option<&PrayerTime>,
    countdown: &Countdown,
) {
    let block = Block::default()
        .title(Span::styled(" Next Prayer ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(ratatui::style::Style::default().fg(theme::BORDER))
        .style(theme::surface());

    let message = |text: &'static str| {
        vec![
            Line::from(""),
            Line::from(Span::styled(text, theme::dim())),
        ]
    };

    let content: Vec<Line> = match (status, next_prayer) {
        (LoadStatus::Loading, _) => message("  Loading…"),
        (LoadStatus::NoLocation, _) => message("  Set a location to see prayer times"),
        (LoadStatus::Unavailable, _) => message("  Prayer times unavailable  [r] retry"),
        (LoadStatus::Ready, None) => message("  No data"),
        (LoadStatus::Ready, Some(prayer)) => vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("  {}", prayer.name.as_str().to_uppercase()),
                    theme::gold().add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", format_instant(prayer.timestamp)), theme::dim()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("  in  ", theme::dim()),
                Span::styled(
                    format_countdown(countdown),
                    theme::amber().add_modifier(Modifier::BOLD),
                ),
                Span::styled("  remaining", theme::dim()),
            ]),
        ],
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
