use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
};

use crate::models::{DailyPrayerTimes, PrayerTime};
use crate::prayer_times::ScheduleCalculator;
use crate::tui::theme;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    schedule: Option<&DailyPrayerTimes>,
    today: NaiveDate,
    current: Option<&PrayerTime>,
    now_ms: i64,
) {
    let block = Block::default()
        .title(Span::styled(" Prayers ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(ratatui::style::Style::default().fg(theme::BORDER))
        .style(theme::surface());

    let Some(schedule) = schedule else {
        let list = List::new(vec![
            ListItem::new(Line::from("")),
            ListItem::new(Line::from(Span::styled("  --:--", theme::dim()))),
        ])
        .block(block);
        frame.render_widget(list, area);
        return;
    };

    let mut items: Vec<ListItem> = Vec::new();
    if let Some(sunrise) = &schedule.sunrise {
        items.push(extra_row("Sunrise", sunrise));
    }

    for prayer in ScheduleCalculator::local().to_timestamped_list(schedule, today) {
        let is_current = current.is_some_and(|c| c.name == prayer.name);

        let (icon, icon_style, label) = if is_current {
            ("●", theme::green(), "now")
        } else if prayer.has_started(now_ms) {
            ("·", theme::dim(), "passed")
        } else {
            ("○", theme::dim(), "upcoming")
        };

        let name_style = if is_current {
            theme::gold().add_modifier(Modifier::BOLD)
        } else if prayer.has_started(now_ms) {
            theme::dim()
        } else {
            theme::bold()
        };

        let line = Line::from(vec![
            Span::styled(format!("  {:<8}", prayer.name.as_str()), name_style),
            Span::styled(format!("{:<7}", prayer.time), theme::dim()),
            Span::styled(icon, icon_style),
            Span::styled(format!("  {}", label), theme::dim()),
        ]);
        items.push(ListItem::new(line));
    }

    if let Some(sunset) = &schedule.sunset {
        items.push(extra_row("Sunset", sunset));
    }

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

fn extra_row<'a>(name: &'a str, time: &'a str) -> ListItem<'a> {
    ListItem::new(Line::from(vec![
        Span::styled(format!("  {:<8}", name), theme::dim()),
        Span::styled(time, theme::dim()),
    ]))
}
