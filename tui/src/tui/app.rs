use super::{
    action::Action,
    components::{
        chart_view::ChartView,
        controls::ControlsForm,
        logs::Logs,
        nav_tabs::NavTabs,
        notice::NoticePopup,
        Component,
    },
    lock,
    tui::{
        Event,
        Tui,
    },
    SharedDashboard,
};
use crate::tui::keybindings::{
    KeyBindings,
    Keymap,
};
use color_eyre::Result;
use crossterm::event::KeyEvent;
use eyre::Context as _;
use nanograph_config::{
    Args,
    Config,
};
use nanograph_dashboard::{
    source::HttpStatsClient,
    tracking::TrackingEvent,
    Dashboard,
};
use ratatui::prelude::Rect;
use serde::{
    Deserialize,
    Serialize,
};
use std::sync::{
    Arc,
    Mutex,
};
use tokio::sync::mpsc;

pub struct App {
    config: Config,
    keybindings: KeyBindings,
    dashboard: SharedDashboard,
    tracking_events: mpsc::UnboundedReceiver<TrackingEvent>,
    components: Vec<Box<dyn Component>>,
    should_quit: bool,
    should_suspend: bool,
    last_tick_key_events: Vec<KeyEvent>,
    global_keymap: Option<Keymap>,
    title: String,
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusedTopLevelComponent {
    #[default]
    Dashboard,
    Logs,
}

type ActionSender = mpsc::UnboundedSender<Action>;
type ActionReceiver = mpsc::UnboundedReceiver<Action>;

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::new(args.clone()).wrap_err("Failed to load configuration")?;
        let keybindings = KeyBindings::default();

        let store = config.settings_store();
        let mut settings = store.load();
        if settings.update_from_args(&args) {
            debug!(?settings, "Settings overridden from the command line");
        }

        let api = HttpStatsClient::from_config(&config)?;
        info!(server = %api.base_url(), "Using stats service");
        let (dashboard, tracking_events) = Dashboard::new(Arc::new(api), store, settings, config.export_dir());
        let dashboard = Arc::new(Mutex::new(dashboard));

        Ok(Self {
            components: vec![
                Box::new(Logs::new(args.debug)),
                Box::new(ChartView::new(dashboard.clone())),
                Box::new(ControlsForm::new(dashboard.clone())),
                Box::new(NavTabs::new(dashboard.clone())),
                Box::new(NoticePopup::default()),
            ],
            should_quit: false,
            should_suspend: false,
            last_tick_key_events: Vec::new(),
            global_keymap: keybindings.get(&FocusedTopLevelComponent::Dashboard).cloned(),
            title: String::new(),
            tracking_events,
            dashboard,
            config,
            keybindings,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?.tick_rate(4.0).frame_rate(30.0);
        tui.enter()?;

        let (action_tx, mut action_rx) = mpsc::unbounded_channel();

        for component in self.components.iter_mut() {
            component.register_action_handler(action_tx.clone())?;
        }
        for component in self.components.iter_mut() {
            component.register_config_handler(self.config.clone(), self.keybindings.clone())?;
        }
        for component in self.components.iter_mut() {
            component.init(tui.size()?)?;
        }

        loop {
            self.handle_events(&mut tui, action_tx.clone()).await?;
            self.handle_tracking_events(action_tx.clone())?;
            self.handle_actions(&mut tui, action_tx.clone(), &mut action_rx)?;
            self.update_title(&mut tui)?;
            if self.should_suspend {
                tui.suspend()?;
                action_tx.send(Action::Resume)?;
                action_tx.send(Action::ClearScreen)?;
                tui.enter()?;
            } else if self.should_quit {
                tui.stop()?;
                break;
            }
        }
        tui.exit()?;

        let shutdown = lock(&self.dashboard).shutdown(self.config.shutdown_on_exit);
        shutdown.await;

        Ok(())
    }

    async fn handle_events(&mut self, tui: &mut Tui, action_tx: ActionSender) -> Result<()> {
        let Some(event) = tui.next_event().await else {
            return Ok(());
        };
        match event {
            Event::Tick => action_tx.send(Action::Tick)?,
            Event::Render => action_tx.send(Action::Render)?,
            Event::Resize(x, y) => action_tx.send(Action::Resize(x, y))?,
            Event::Key(key) => self.handle_key_event(key, action_tx.clone())?,
            _ => {}
        }

        for component in self.components.iter_mut() {
            if component.is_focused() {
                if let Some(action) = component.handle_events(Some(event.clone()))? {
                    action_tx.send(action)?;
                }
            }
        }

        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent, action_tx: ActionSender) -> Result<()> {
        let Some(keymap) = &self.global_keymap else {
            return Ok(());
        };

        match keymap.get(&vec![key]) {
            Some(action) => {
                action_tx.send(action.clone())?;
            }
            _ => {
                // If the key was not handled as a single key action,
                // then consider it for multi-key combinations.
                self.last_tick_key_events.push(key);

                if let Some(action) = keymap.get(&self.last_tick_key_events) {
                    action_tx.send(action.clone())?;
                }
            }
        }
        Ok(())
    }

    /// Samples from the polling task land in the chart here, on the UI side.
    fn handle_tracking_events(&mut self, action_tx: ActionSender) -> Result<()> {
        while let Ok(event) = self.tracking_events.try_recv() {
            trace!(?event, "Tracking event");
            if let Some(notice) = lock(&self.dashboard).apply_tracking_event(event) {
                action_tx.send(Action::ShowNotice(notice))?;
            }
        }
        Ok(())
    }

    fn handle_actions(&mut self, tui: &mut Tui, action_tx: ActionSender, action_rx: &mut ActionReceiver) -> Result<()> {
        while let Ok(action) = action_rx.try_recv() {
            if action != Action::Tick && action != Action::Render {
                trace!("{action:?}");
            }
            match &action {
                Action::Tick => self.last_tick_key_events.clear(),
                Action::Quit => self.should_quit = true,
                Action::Suspend => self.should_suspend = true,
                Action::Resume => self.should_suspend = false,
                Action::ClearScreen => tui.terminal.clear()?,
                Action::Resize(w, h) => self.handle_resize(tui, *w, *h)?,
                Action::Render => self.render(tui)?,
                Action::UpdateGlobalKeybindings(keymap) => {
                    self.global_keymap = Some(keymap.clone());
                }
                Action::Dispatch(intent) => {
                    if let Some(notice) = lock(&self.dashboard).dispatch(intent.clone()) {
                        action_tx.send(Action::ShowNotice(notice))?;
                    }
                }
                _ => {}
            };

            for component in self.components.iter_mut() {
                if let Some(action) = component.update(action.clone())? {
                    action_tx.send(action)?
                };
            }
        }
        Ok(())
    }

    fn update_title(&mut self, tui: &mut Tui) -> Result<()> {
        let title = lock(&self.dashboard).title();
        if title != self.title {
            tui.set_title(&title)?;
            self.title = title;
        }
        Ok(())
    }

    fn handle_resize(&mut self, tui: &mut Tui, w: u16, h: u16) -> Result<()> {
        tui.resize(Rect::new(0, 0, w, h))?;
        self.render(tui)?;
        Ok(())
    }

    fn render(&mut self, tui: &mut Tui) -> Result<()> {
        tui.draw(|frame| {
            // Set uniform background and foreground colors
            frame.render_widget(
                ratatui::widgets::Block::default().style(crate::tui::theme::Theme::default().default),
                frame.area(),
            );

            for component in self.components.iter_mut() {
                if component.is_visible() {
                    if let Err(err) = component.draw(frame, frame.area()) {
                        error!("Failed to draw: {:?}", err);
                    }
                }
            }
        })?;
        Ok(())
    }
}
