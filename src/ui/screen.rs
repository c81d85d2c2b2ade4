use ratatui::Frame;

use crate::{ui::history::render_history, App, AppScreen};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Instructions, countdown, rounds and results all draw through the App widget
pub struct GameScreen;

impl Screen for GameScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// History screen - clamps its own scroll offset while drawing
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(screen: AppScreen) -> Box<dyn Screen> {
    match screen {
        AppScreen::Instructions | AppScreen::Playing | AppScreen::Results => Box::new(GameScreen),
        AppScreen::History => Box::new(HistoryScreen),
    }
}
