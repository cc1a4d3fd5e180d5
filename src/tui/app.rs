use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::{Countdown, DailyPrayerTimes, PrayerTime};
use crate::prayer_times::{PrayerTimesService, ScheduleCalculator, now_ms, time_until};
use crate::session::Session;
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::tui::widgets::{header, next_prayer, prayers, statusbar};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    NoLocation,
    Unavailable,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickAction {
    Redraw,
    Reload,
}

pub struct App {
    pub config: AppConfig,
    pub session: Session,
    pub should_quit: bool,
    pub show_help: bool,
    pub status: LoadStatus,

    pub today: NaiveDate,
    pub schedule: Option<DailyPrayerTimes>,
    /// Only fetched once today's prayers are all behind us.
    pub tomorrow: Option<DailyPrayerTimes>,
    pub next: Option<PrayerTime>,
    pub countdown: Countdown,
    pub now_ms: i64,
}

impl App {
    pub fn new(config: AppConfig, session: Session) -> Self {
        App {
            config,
            session,
            should_quit: false,
            show_help: false,
            status: LoadStatus::Loading,
            today: Local::now().date_naive(),
            schedule: None,
            tomorrow: None,
            next: None,
            countdown: Countdown::default(),
            now_ms: now_ms(),
        }
    }

    pub fn load(&mut self, conn: &Connection) -> Result<()> {
        self.today = Local::now().date_naive();
        self.now_ms = now_ms();
        self.schedule = None;
        self.tomorrow = None;
        self.next = None;
        self.countdown = Countdown::default();

        if self.session.profile.coordinates().is_none() {
            self.status = LoadStatus::NoLocation;
            return Ok(());
        }

        let service = PrayerTimesService::from_config(&self.config)?;
        self.schedule = service.load(conn, &self.session, self.today);
        let Some(schedule) = &self.schedule else {
            self.status = LoadStatus::Unavailable;
            return Ok(());
        };

        let calc = ScheduleCalculator::local();
        if calc.next_prayer(schedule, self.today, self.now_ms).is_none() {
            if let Some(tomorrow) = self.today.succ_opt() {
                self.tomorrow = service.load(conn, &self.session, tomorrow);
            }
        }

        self.status = LoadStatus::Ready;
        self.select_next(self.now_ms);
        Ok(())
    }

    /// Re-pick the prayer the countdown runs against.
    pub fn select_next(&mut self, now: i64) {
        let Some(schedule) = &self.schedule else {
            self.next = None;
            return;
        };
        self.next = ScheduleCalculator::local().next_prayer_rolling(
            schedule,
            self.tomorrow.as_ref(),
            self.today,
            now,
        );
        self.countdown = self
            .next
            .as_ref()
            .map(|p| time_until(p, now))
            .unwrap_or_default();
    }

    /// One timer step. The countdown is recomputed against the selected
    /// prayer; the selection itself only changes once it has been reached.
    pub fn advance(&mut self, today: NaiveDate, now: i64) -> TickAction {
        self.now_ms = now;
        if today != self.today {
            return TickAction::Reload;
        }

        let Some(next) = &self.next else {
            return TickAction::Redraw;
        };
        let countdown = time_until(next, now);
        if !countdown.is_zero() {
            self.countdown = countdown;
            return TickAction::Redraw;
        }

        self.select_next(now);
        if self.next.is_none() && self.tomorrow.is_none() {
            // Isha just started; tomorrow's schedule hasn't been fetched yet.
            return TickAction::Reload;
        }
        TickAction::Redraw
    }

    pub fn tick(&mut self, conn: &Connection) {
        if self.advance(Local::now().date_naive(), now_ms()) == TickAction::Reload {
            if let Err(e) = self.load(conn) {
                log::warn!("dashboard reload failed: {:#}", e);
            }
        }
    }

    pub fn current_prayer(&self) -> Option<PrayerTime> {
        let schedule = self.schedule.as_ref()?;
        ScheduleCalculator::local().current_prayer(schedule, self.today, self.now_ms)
    }

    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent, conn: &Connection) {
        // Only handle actual key presses — ignore release/repeat events from some terminals
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.show_help {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('r') => {
                self.status = LoadStatus::Loading;
                if let Err(e) = self.load(conn) {
                    log::warn!("dashboard refresh failed: {:#}", e);
                    self.status = LoadStatus::Unavailable;
                }
            }
            _ => {}
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // header
                Constraint::Min(0),    // body
                Constraint::Length(1), // status bar
            ])
            .split(area);

        header::render(frame, outer_chunks[0], &self.session, self.today);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer_chunks[1]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(11), Constraint::Min(0)])
            .split(columns[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(0)])
            .split(columns[1]);

        let current = self.current_prayer();
        prayers::render(
            frame,
            left[0],
            self.schedule.as_ref(),
            self.today,
            current.as_ref(),
            self.now_ms,
        );
        next_prayer::render(
            frame,
            right[0],
            &self.status,
            self.next.as_ref(),
            &self.countdown,
        );
        statusbar::render(frame, outer_chunks[2]);

        if self.show_help {
            self.draw_help_overlay(frame);
        }
    }

    fn draw_help_overlay(&self, frame: &mut Frame) {
        let area = frame.area();
        let popup_area = Rect {
            x: area.width / 4,
            y: area.height / 4,
            width: area.width / 2,
            height: (area.height / 2).min(12),
        };

        frame.render_widget(Clear, popup_area);

        let key_line = |key: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {:<7}", key), theme::gold()),
                Span::styled(what, theme::dim()),
            ])
        };
        let lines = vec![
            Line::from(""),
            key_line("r", "reload prayer times"),
            key_line("?", "toggle this help"),
            key_line("q, Esc", "quit"),
            Line::from(""),
            Line::from(Span::styled(
                format!("  Method: {}", self.session.profile.calc_method),
                theme::dim(),
            )),
            Line::from(""),
            Line::from(Span::styled("  [any key] close", theme::dim())),
        ];

        let block = Block::default()
            .title(Span::styled(" Help ", theme::gold()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::amber())
            .style(theme::surface());

        frame.render_widget(Paragraph::new(lines).block(block), popup_area);
    }
}

/// Run the dashboard event loop.
pub fn run(conn: Connection, config: AppConfig, session: Session) -> Result<()> {
    let tick_ms = config.dashboard.tick_ms;
    let mut app = App::new(config, session);
    app.load(&conn)?;

    let mut terminal = ratatui::init();
    let events = EventHandler::new(tick_ms);

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| app.draw(frame)) {
            break Err(e.into());
        }

        match events.next() {
            Ok(Event::Key(key)) => {
                app.handle_key(key, &conn);
                if app.should_quit {
                    break Ok(());
                }
            }
            Ok(Event::Tick) => app.tick(&conn),
            Err(e) => break Err(e.into()),
        }
    };

    ratatui::restore();
    result
}
