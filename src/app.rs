use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info};

use crate::aggregate::Dashboard;
use crate::config::DashboardConfig;
use crate::dataset::{Dataset, Dimension};
use crate::filter::Filters;

/// The chart panels, in the order they are laid out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Panel {
    SalaryByJob,
    TopCompanies,
    JobsByLocation,
    SalaryByYear,
    Correlation,
}

impl Panel {
    pub const ALL: [Panel; 5] = [
        Panel::SalaryByJob,
        Panel::TopCompanies,
        Panel::JobsByLocation,
        Panel::SalaryByYear,
        Panel::Correlation,
    ];

    /// Chart title; `top_n` is how many companies the box plots cover.
    pub fn title(self, top_n: usize) -> String {
        match self {
            Panel::SalaryByJob => "Average Salary by Job Title".to_string(),
            Panel::TopCompanies => format!("Salary Distribution for Top {} Companies", top_n),
            Panel::JobsByLocation => "Number of Jobs per Location".to_string(),
            Panel::SalaryByYear => "Average Salary Over Years".to_string(),
            Panel::Correlation => "Correlation Between Numerical Features".to_string(),
        }
    }

    pub fn tab_label(self) -> &'static str {
        match self {
            Panel::SalaryByJob => "Job Titles",
            Panel::TopCompanies => "Top Companies",
            Panel::JobsByLocation => "Locations",
            Panel::SalaryByYear => "Trend",
            Panel::Correlation => "Correlation",
        }
    }
}

impl From<Panel> for usize {
    fn from(input: Panel) -> usize {
        match input {
            Panel::SalaryByJob => 0,
            Panel::TopCompanies => 1,
            Panel::JobsByLocation => 2,
            Panel::SalaryByYear => 3,
            Panel::Correlation => 4,
        }
    }
}

/// Interaction state. The dashboard is rebuilt from scratch whenever the
/// filters change.
pub struct App<'a> {
    dataset: &'a Dataset,
    options: [Vec<&'a str>; 3],
    cursors: [usize; 3],
    defaults: Filters,
    top_n: usize,
    pub title: String,
    pub filters: Filters,
    pub focus: Dimension,
    pub panel: Panel,
    pub dashboard: Dashboard,
}

impl<'a> App<'a> {
    pub fn new(dataset: &'a Dataset, config: &DashboardConfig) -> Self {
        let defaults = Filters::with_defaults(dataset, config.default_selection);
        let dashboard = Dashboard::build(dataset, &defaults, config.top_companies);
        App {
            dataset,
            options: Dimension::ALL.map(|d| dataset.distinct(d)),
            cursors: [0; 3],
            filters: defaults.clone(),
            defaults,
            top_n: config.top_companies,
            title: config.title.clone(),
            focus: Dimension::JobTitle,
            panel: Panel::SalaryByJob,
            dashboard,
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Every value the control for `dimension` offers.
    pub fn options(&self, dimension: Dimension) -> &[&'a str] {
        &self.options[usize::from(dimension)]
    }

    pub fn cursor(&self, dimension: Dimension) -> usize {
        self.cursors[usize::from(dimension)]
    }

    pub fn panel_title(&self) -> String {
        self.panel.title(self.top_n)
    }

    fn refresh(&mut self) {
        self.dashboard = Dashboard::build(self.dataset, &self.filters, self.top_n);
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Dimension::JobTitle => Dimension::Company,
            Dimension::Company => Dimension::Location,
            Dimension::Location => Dimension::JobTitle,
        };
    }

    pub fn focus_previous(&mut self) {
        self.focus = match self.focus {
            Dimension::JobTitle => Dimension::Location,
            Dimension::Company => Dimension::JobTitle,
            Dimension::Location => Dimension::Company,
        };
    }

    pub fn cursor_down(&mut self) {
        let len = self.options(self.focus).len();
        if len > 0 {
            let cursor = &mut self.cursors[usize::from(self.focus)];
            *cursor = (*cursor + 1) % len;
        }
    }

    pub fn cursor_up(&mut self) {
        let len = self.options(self.focus).len();
        if len > 0 {
            let cursor = &mut self.cursors[usize::from(self.focus)];
            *cursor = (*cursor + len - 1) % len;
        }
    }

    /// Flips the value under the cursor of the focused control.
    pub fn toggle_current(&mut self) {
        let Some(value) = self.options(self.focus).get(self.cursor(self.focus)).copied() else {
            return;
        };
        let selected = self.filters.toggle(self.focus, value);
        debug!("{} `{}` selected: {}", self.focus.column(), value, selected);
        self.refresh();
    }

    pub fn select_all(&mut self) {
        self.filters.select_all(self.focus, self.dataset);
        self.refresh();
    }

    pub fn clear(&mut self) {
        self.filters.clear(self.focus);
        self.refresh();
    }

    pub fn reset(&mut self) {
        info!("Filters reset to defaults");
        self.filters = self.defaults.clone();
        self.refresh();
    }

    pub fn next_panel(&mut self) {
        let next = (usize::from(self.panel) + 1) % Panel::ALL.len();
        self.panel = Panel::ALL[next];
    }

    pub fn previous_panel(&mut self) {
        let previous = (usize::from(self.panel) + Panel::ALL.len() - 1) % Panel::ALL.len();
        self.panel = Panel::ALL[previous];
    }

    /// Applies one key press. Returns `false` once the user asked to quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.cursor_down(),
            KeyCode::Up | KeyCode::Char('k') => self.cursor_up(),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Char('a') => self.select_all(),
            KeyCode::Char('c') => self.clear(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Right | KeyCode::Char('l') => self.next_panel(),
            KeyCode::Left | KeyCode::Char('h') => self.previous_panel(),
            KeyCode::Char(c @ '1'..='5') => {
                self.panel = Panel::ALL[c as usize - '1' as usize];
            }
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{from_records, record, three_rows};
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn starts_with_default_selection() {
        let dataset = three_rows();
        let app = App::new(&dataset, &DashboardConfig::default());
        assert_eq!(app.dashboard.record_count, 3);
        assert_eq!(app.options(Dimension::JobTitle), &["jobA", "jobB"]);
        assert_eq!(app.panel, Panel::SalaryByJob);
    }

    #[test]
    fn toggling_recomputes_dashboard() {
        let dataset = three_rows();
        let mut app = App::new(&dataset, &DashboardConfig::default());
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.filters.selection(Dimension::JobTitle).contains("jobA"));
        assert_eq!(app.dashboard.record_count, 1);

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.dashboard.record_count, 3);
    }

    #[test]
    fn clear_and_reset() {
        let dataset = three_rows();
        let mut app = App::new(&dataset, &DashboardConfig::default());
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Dimension::Location);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.dashboard.record_count, 0);
        assert_eq!(app.dashboard.by_year.len(), 2);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.dashboard.record_count, 3);
    }

    #[test]
    fn select_all_beyond_defaults() {
        let records = (0..7)
            .map(|i| record(&format!("job{}", i), "c", "l", 2023, 1000.0 * i as f64))
            .collect();
        let dataset = from_records(records);
        let mut app = App::new(&dataset, &DashboardConfig::default());
        assert_eq!(app.dashboard.record_count, 5);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.dashboard.record_count, 7);
    }

    #[test]
    fn company_panel_title_follows_top_n() {
        let dataset = three_rows();
        let config = DashboardConfig {
            top_companies: 3,
            ..DashboardConfig::default()
        };
        let mut app = App::new(&dataset, &config);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.panel_title(), "Salary Distribution for Top 3 Companies");
        assert_eq!(
            Panel::TopCompanies.title(5),
            "Salary Distribution for Top 5 Companies"
        );
    }

    #[test]
    fn cursor_wraps() {
        let dataset = three_rows();
        let mut app = App::new(&dataset, &DashboardConfig::default());
        press(&mut app, KeyCode::Up);
        assert_eq!(app.cursor(Dimension::JobTitle), 1);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.cursor(Dimension::JobTitle), 0);
    }

    #[test]
    fn panel_navigation_and_quit() {
        let dataset = three_rows();
        let mut app = App::new(&dataset, &DashboardConfig::default());
        press(&mut app, KeyCode::Left);
        assert_eq!(app.panel, Panel::Correlation);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.panel, Panel::JobsByLocation);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.panel, Panel::SalaryByYear);
        assert!(!press(&mut app, KeyCode::Char('q')));
    }
}
