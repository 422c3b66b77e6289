//! TUI application state and event loop.
//!
//! Single-threaded: one timer drives generation at the generator's tick
//! period, a second drifts the heart rate every five seconds. Each frame
//! redraws from a fresh snapshot of the live buffer.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::prelude::*;
use serde_json::{Map, Value, json};

use ecgwave_core::heart_rate::DRIFT_PERIOD;
use ecgwave_core::{
    ChartSeries, EcgRecord, HeartRateDriver, Lead, LiveBuffer, RecordStore, SignalGenerator,
    now_ms, project,
};

/// Heart-rate change per `+`/`-` key press.
const MANUAL_STEP: i32 = 5;

pub struct App {
    generator: Box<dyn SignalGenerator>,
    heart_rate: HeartRateDriver,
    rng: StdRng,
    buffer: LiveBuffer,
    patient: String,
    store: Option<Arc<dyn RecordStore>>,

    running: bool,
    paused: bool,
    status: Option<String>,
    saved: usize,
}

impl App {
    pub fn new(
        mut generator: Box<dyn SignalGenerator>,
        heart_rate: HeartRateDriver,
        patient: String,
        store: Option<Arc<dyn RecordStore>>,
    ) -> Self {
        generator.set_heart_rate(heart_rate.bpm());
        Self {
            generator,
            heart_rate,
            rng: StdRng::from_os_rng(),
            buffer: LiveBuffer::default(),
            patient,
            store,
            running: true,
            paused: false,
            status: None,
            saved: 0,
        }
    }

    /// Run the TUI until the user quits.
    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before a panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        if self.saved > 0 {
            println!("Saved {} recording(s) for {}", self.saved, self.patient);
        }

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        let tick_period = self.generator.tick_period();
        let mut last_tick = Instant::now();
        let mut last_drift = Instant::now();
        self.step(now_ms());

        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            let wait = tick_period
                .saturating_sub(last_tick.elapsed())
                .max(Duration::from_millis(1));
            if event::poll(wait)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            if last_tick.elapsed() >= tick_period {
                if !self.paused {
                    self.step(now_ms());
                }
                last_tick = Instant::now();
            }

            if last_drift.elapsed() >= DRIFT_PERIOD {
                if !self.paused {
                    self.drift();
                }
                last_drift = Instant::now();
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char(' ') => {
                self.paused = !self.paused;
                self.status = Some(if self.paused { "paused" } else { "resumed" }.into());
            }
            KeyCode::Char('c') => {
                self.buffer.clear();
                self.status = Some("buffers cleared".into());
            }
            KeyCode::Char('s') => self.status = Some(self.save_window()),
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_heart_rate(MANUAL_STEP),
            KeyCode::Char('-') => self.nudge_heart_rate(-MANUAL_STEP),
            _ => {}
        }
    }

    /// Generate one sample at `timestamp_ms` and append it.
    pub fn step(&mut self, timestamp_ms: u64) {
        let sample = self.generator.generate(timestamp_ms);
        self.buffer.append(&sample);
    }

    /// One random heart-rate step, fed to the generator.
    pub fn drift(&mut self) -> u32 {
        let bpm = self.heart_rate.drift(&mut self.rng);
        self.generator.set_heart_rate(bpm);
        bpm
    }

    fn nudge_heart_rate(&mut self, delta: i32) {
        let bpm = self.heart_rate.apply_step(delta);
        self.generator.set_heart_rate(bpm);
        self.status = Some(format!("heart rate set to {bpm} bpm"));
    }

    /// Current window as a JSON signal document: timestamps plus per-lead values.
    fn window_signal(&self) -> Value {
        let snapshot = self.buffer.snapshot();
        let leads: Map<String, Value> = Lead::ALL
            .iter()
            .map(|&lead| {
                let values: Vec<f64> = snapshot.points(lead).iter().map(|p| p.value).collect();
                (lead.name().to_string(), Value::from(values))
            })
            .collect();
        let timestamps: Vec<u64> = snapshot
            .points(Lead::I)
            .iter()
            .map(|p| p.timestamp)
            .collect();

        json!({
            "generator": self.generator.name(),
            "heartRate": self.heart_rate.bpm(),
            "timestamps": timestamps,
            "leads": leads,
        })
    }

    /// Save the visible window for the current patient. Returns a status line.
    fn save_window(&mut self) -> String {
        let Some(store) = &self.store else {
            return "no store configured (start with --store)".into();
        };
        if self.buffer.samples_seen() == 0 {
            return "nothing to save yet".into();
        }

        let record = EcgRecord::new(self.window_signal(), self.patient.clone());
        let id = record.id_ecg;
        match store.insert(record) {
            Ok(()) => {
                self.saved += 1;
                log::debug!("saved ECG {id} for {}", self.patient);
                format!("ECG {id} saved")
            }
            Err(e) => format!("save failed: {e}"),
        }
    }

    // ---- accessors for ui ----

    pub fn charts(&self) -> Vec<ChartSeries> {
        project(&self.buffer.snapshot())
    }

    pub fn patient(&self) -> &str {
        &self.patient
    }

    pub fn heart_rate(&self) -> u32 {
        self.heart_rate.bpm()
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub fn tick_period(&self) -> Duration {
        self.generator.tick_period()
    }

    pub fn samples_seen(&self) -> u64 {
        self.buffer.samples_seen()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Live when samples are flowing.
    pub fn is_connected(&self) -> bool {
        !self.paused && self.buffer.samples_seen() > 0
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
