use clap::{Parser, ValueEnum};
use crossterm::{
    cursor::{Hide, Show},
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use journey_sim::{
    config::SimConfig,
    content::Route,
    data::{Color, ControlInput, Poi},
    game_session::{GameSession, Interaction, SessionObserver, SessionOptions},
    narration::{FallbackNarrator, NarrationDispatcher},
    render::{sprites::wrap_text, terminal::TerminalSurface, DisplayList},
    replay::InputRecording,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to journey-sim.toml configuration file
    #[arg(short, long, default_value = "./journey-sim.toml")]
    config: String,

    /// Override log level (trace|debug|info|warn|error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Mode::Drive)]
    mode: Mode,

    /// Ticks to simulate in headless mode (holding forward)
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Save the inputs of this run to a replay file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Drive the headless session from a replay file instead
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write the final frame as a JSON display list
    #[arg(long)]
    dump_frame: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Interactive terminal rendering
    Drive,
    /// Simulate without a display
    Headless,
}

/// Keys without release events count as held this long after the last repeat
const KEY_HOLD_WINDOW: Duration = Duration::from_millis(500);

/// Narration stays on screen for this many ticks
const NARRATION_TICKS: u32 = 300;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging depends on the config, so report a bad config once tracing is up
    let loaded = SimConfig::load(&args.config);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    let _log_guard = init_tracing(&args, &config)?;

    info!("Starting Journey Sim v{}", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(_) => info!("Configuration loaded from: {}", args.config),
        Err(e) => warn!("Failed to load config {}: {}, using defaults", args.config, e),
    }
    info!("Tick rate: {}Hz", config.session.tick_rate_hz);

    let route = load_route(&config);
    let mut narration = NarrationDispatcher::new(Arc::new(FallbackNarrator), config.narration_timeout());
    narration.set_enabled(config.narration.enabled);

    let replay = match (args.mode, &args.replay) {
        (Mode::Headless, Some(path)) => Some(InputRecording::load(path).await?),
        _ => None,
    };
    let options = match &replay {
        Some(replay) => {
            if replay.header.seed != config.session.seed {
                info!(
                    "Using replay seed {} instead of configured seed {}",
                    replay.header.seed, config.session.seed
                );
            }
            replay.session_options(SessionOptions::from(&config))
        }
        None => SessionOptions::from(&config),
    };
    let session = GameSession::new(route, options, narration);

    match args.mode {
        Mode::Headless => run_headless(&args, &config, session, replay).await,
        Mode::Drive => run_drive(&args, &config, session).await,
    }
}

fn init_tracing(args: &Args, config: &SimConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let log_level = args.log_level.as_deref().unwrap_or(config.logging.level.as_str());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    // The terminal belongs to the renderer in drive mode
    let to_file = args.mode == Mode::Drive || !config.logging.console_enabled;
    if !to_file {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    }

    let Some(dir) = config.logging.dir.clone().or_else(|| {
        (args.mode == Mode::Drive).then(|| PathBuf::from("./logs"))
    }) else {
        return Ok(None);
    };
    std::fs::create_dir_all(&dir)?;
    let appender = tracing_appender::rolling::never(&dir, "journey-sim.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // JSON lines, one event per line
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn load_route(config: &SimConfig) -> Route {
    let Some(path) = &config.content.route else {
        info!("Using built-in route");
        return Route::builtin();
    };

    info!("Loading route from {:?}...", path);
    match Route::load_from_file(path) {
        Ok(route) => {
            info!("Loaded {} POI(s):", route.pois.len());
            for poi in &route.pois {
                info!("  - {} ({}) at x={}", poi.title, poi.category, poi.x_position);
            }
            route
        }
        Err(e) => {
            warn!("Failed to load route from {:?}: {}, using built-in route", path, e);
            Route::builtin()
        }
    }
}

/// Log-only observer for headless runs
#[derive(Default)]
struct HeadlessObserver {
    nearby: Option<String>,
    narrations: usize,
    finished: bool,
}

impl SessionObserver for HeadlessObserver {
    fn on_proximity_change(&mut self, poi: Option<&Poi>) {
        let id = poi.map(|p| p.id.clone());
        if id != self.nearby {
            if let Some(poi) = poi {
                info!("Near {} (press Enter to interact)", poi.title);
            }
            self.nearby = id;
        }
    }

    fn on_narration(&mut self, text: &str) {
        self.narrations += 1;
        info!("Narration: {}", text);
    }

    fn on_finish(&mut self) {
        self.finished = true;
        info!("Journey complete");
    }
}

async fn run_headless(
    args: &Args,
    config: &SimConfig,
    mut session: GameSession,
    replay: Option<InputRecording>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut observer = HeadlessObserver::default();

    let recording = match replay {
        Some(replay) => {
            replay.check_route(session.route())?;
            replay.play(&mut session, &mut observer);
            replay
        }
        None => {
            let mut recording =
                InputRecording::new(config.session.seed, session.route(), config.session.tick_rate_hz);
            for _ in 0..args.ticks {
                recording.record(ControlInput::FORWARD);
                session.tick(ControlInput::FORWARD, &mut observer);
                if session.is_finished() {
                    break;
                }
            }
            recording
        }
    };

    let vehicle = session.vehicle();
    info!(
        "Simulated {} ticks: x={:.1}, velocity={:.2}, particles={}, narrations={}, finished={}",
        session.ticks(),
        vehicle.x,
        vehicle.velocity,
        session.particles().len(),
        observer.narrations,
        observer.finished
    );

    if let Some(path) = &args.record {
        recording.save(path).await?;
    }

    if let Some(path) = &args.dump_frame {
        let mut frame = DisplayList::new();
        session.render(&mut frame);
        tokio::fs::write(path, frame.to_json()?).await?;
        info!("Wrote {} draw commands to {:?}", frame.len(), path);
    }

    Ok(())
}

/// Observer feeding the terminal HUD
#[derive(Default)]
struct HudObserver {
    narration: Option<(String, u32)>,
}

impl SessionObserver for HudObserver {
    fn on_narration(&mut self, text: &str) {
        self.narration = Some((text.to_string(), NARRATION_TICKS));
    }

    fn on_finish(&mut self) {
        debug!("Finish banner shown");
    }
}

/// Arrow keys as held pedals
#[derive(Default)]
struct Pedals {
    release_events: bool,
    forward: Option<Instant>,
    backward: Option<Instant>,
}

impl Pedals {
    fn press(&mut self, key: &KeyEvent, now: Instant) {
        let slot = match key.code {
            KeyCode::Right | KeyCode::Up => &mut self.forward,
            KeyCode::Left | KeyCode::Down => &mut self.backward,
            _ => return,
        };
        *slot = match key.kind {
            KeyEventKind::Release => None,
            _ => Some(now),
        };
    }

    fn input(&mut self, now: Instant) -> ControlInput {
        if !self.release_events {
            for slot in [&mut self.forward, &mut self.backward] {
                if slot.is_some_and(|at| now.duration_since(at) > KEY_HOLD_WINDOW) {
                    *slot = None;
                }
            }
        }
        ControlInput {
            forward: self.forward.is_some(),
            backward: self.backward.is_some(),
        }
    }

    fn release_all(&mut self) {
        self.forward = None;
        self.backward = None;
    }
}

async fn run_drive(
    args: &Args,
    config: &SimConfig,
    mut session: GameSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let result = drive_loop(config, &mut session, release_events, &mut stdout).await;

    if release_events {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;

    let recording = result?;
    if let Some(path) = &args.record {
        recording.save(path).await?;
    }
    info!("Session ended after {} ticks at x={:.0}", session.ticks(), session.vehicle().x);
    Ok(())
}

async fn drive_loop(
    config: &SimConfig,
    session: &mut GameSession,
    release_events: bool,
    stdout: &mut io::Stdout,
) -> Result<InputRecording, Box<dyn std::error::Error>> {
    let (cols, rows) = terminal::size()?;
    let mut surface = TerminalSurface::new(cols, rows, session.viewport());
    let mut observer = HudObserver::default();
    let mut pedals = Pedals {
        release_events,
        ..Pedals::default()
    };
    let mut details: Option<Poi> = None;
    let mut recording = InputRecording::new(config.session.seed, session.route(), config.session.tick_rate_hz);
    let mut ticker = interval(config.tick_interval());

    loop {
        ticker.tick().await;
        let now = Instant::now();

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Release {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(recording),
                            KeyCode::Char('r') | KeyCode::Char('R') => {
                                session.restart();
                                pedals.release_all();
                                details = None;
                                observer.narration = None;
                                recording = InputRecording::new(
                                    config.session.seed,
                                    session.route(),
                                    config.session.tick_rate_hz,
                                );
                            }
                            KeyCode::Enter => match session.interact() {
                                Some(Interaction::OpenLink(url)) => {
                                    info!("Link: {}", url);
                                    observer.narration = Some((url, NARRATION_TICKS));
                                }
                                Some(Interaction::ShowDetails(poi)) => {
                                    pedals.release_all();
                                    details = Some(poi);
                                }
                                None => {}
                            },
                            KeyCode::Esc | KeyCode::Backspace => {
                                session.close_details();
                                details = None;
                            }
                            _ => {}
                        }
                    }
                    pedals.press(&key, now);
                }
                Event::Resize(cols, rows) => {
                    surface = TerminalSurface::new(cols, rows, session.viewport());
                }
                _ => {}
            }
        }

        let input = pedals.input(now);
        if !session.is_paused() {
            recording.record(input);
        }
        session.tick(input, &mut observer);

        if let Some((_, remaining)) = &mut observer.narration {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                observer.narration = None;
            }
        }

        surface.clear();
        session.render(&mut surface);
        draw_hud(&mut surface, session, &observer, details.as_ref());
        surface.present(stdout)?;
        stdout.flush()?;
    }
}

fn draw_hud(surface: &mut TerminalSurface, session: &GameSession, observer: &HudObserver, details: Option<&Poi>) {
    let ink = Color::WHITE;
    let panel = Color::rgb(0x1E, 0x29, 0x3B);
    let accent = Color::rgb(0xFA, 0xCC, 0x15);
    let cols = surface.cols() as usize;
    let rows = surface.rows();

    let vehicle = session.vehicle();
    let progress = vehicle.x / session.route().world_width * 100.0;
    let status = format!(
        " Speed {:>3.0}  Progress {:>3.0}%   [<-/->] drive  [Enter] interact  [r] restart  [q] quit ",
        vehicle.velocity.abs(),
        progress
    );
    surface.overlay_text(0, 0, &status, ink, panel);

    if let Some(poi) = session.nearby_poi() {
        let prompt = format!(" Press Enter: {} ", poi.title);
        surface.overlay_text(0, 1, &prompt, Color::BLACK, accent);
    }

    if let Some((text, _)) = &observer.narration {
        for (i, line) in wrap_text(text, cols.saturating_sub(4) as f32, 1.0 / 0.55).iter().take(2).enumerate() {
            surface.overlay_text(1, rows.saturating_sub(3) + i as u16, line, ink, panel);
        }
    }

    if let Some(poi) = details {
        let mut lines = vec![poi.title.clone(), String::new()];
        let width = cols.saturating_sub(8).max(10) as f32;
        for paragraph in [Some(&poi.description), poi.details.as_ref(), poi.stats.as_ref()]
            .into_iter()
            .flatten()
        {
            lines.extend(wrap_text(paragraph, width, 1.0 / 0.55));
        }
        if !poi.tech.is_empty() {
            lines.push(format!("Tech: {}", poi.tech.join(", ")));
        }
        lines.push(String::new());
        lines.push("[Esc] close".to_string());

        for (i, line) in lines.iter().enumerate() {
            surface.overlay_text(3, 3 + i as u16, &format!(" {:<1$} ", line, width as usize), ink, panel);
        }
    }

    if session.is_finished() {
        let banner = " You reached the finish line! [r] drive again  [q] quit ";
        let col = (cols.saturating_sub(banner.len()) / 2) as u16;
        surface.overlay_text(col, rows / 2, banner, Color::BLACK, accent);
    }
}
