use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Context;
use chip8_vm::Chip8;
use chip8_vm::Key;
use chip8_vm::chip8::{ON_COLOR, PIXEL_COUNT};
use chip8_vm::state::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::{info, warn};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use rodio::{OutputStream, Sink, Source, source::SineWave};

use crate::settings::Settings;

/// Sine tone gated by the sound timer.
pub struct Tone {
    sink: Sink,
    // Dropping the stream silences the sink.
    _stream: OutputStream,
}

impl Tone {
    pub fn new(freq: f32) -> anyhow::Result<Self> {
        let (_stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.append(SineWave::new(freq).repeat_infinite());
        sink.pause();
        Ok(Tone { sink, _stream })
    }

    pub fn set_playing(&self, playing: bool) {
        match (playing, self.sink.is_paused()) {
            (true, true) => self.sink.play(),
            (false, false) => self.sink.pause(),
            _ => {}
        }
    }
}

/// Physical layout:     Hex keypad:
/// 1 2 3 4         ->   1 2 3 C
/// Q W E R         ->   4 5 6 D
/// A S D F         ->   7 8 9 E
/// Z X C V         ->   A 0 B F
pub fn map_key(code: KeyCode) -> Option<Key> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let key = match c.to_ascii_lowercase() {
        '1' => Key::Key1,
        '2' => Key::Key2,
        '3' => Key::Key3,
        '4' => Key::KeyC,
        'q' => Key::Key4,
        'w' => Key::Key5,
        'e' => Key::Key6,
        'r' => Key::KeyD,
        'a' => Key::Key7,
        's' => Key::Key8,
        'd' => Key::Key9,
        'f' => Key::KeyE,
        'z' => Key::KeyA,
        'x' => Key::Key0,
        'c' => Key::KeyB,
        'v' => Key::KeyF,
        _ => return None,
    };
    Some(key)
}

pub struct Emulator {
    chip8: Chip8,
    settings: Settings,
    tone: Option<Tone>,
    pixels: Vec<u32>,
}

impl Emulator {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let mut chip8 = match settings.seed {
            Some(seed) => Chip8::with_seed(seed),
            None => Chip8::new(),
        };
        chip8
            .load_rom(&settings.rom)
            .context("Could not start emulation")?;

        // No audio device is not fatal, the ROM just runs silently.
        let tone = Tone::new(settings.beep_frequency)
            .inspect_err(|e| warn!("Sound disabled: {e}"))
            .ok();

        Ok(Emulator {
            chip8,
            settings,
            tone,
            pixels: vec![0; PIXEL_COUNT],
        })
    }

    fn rom_name(&self) -> String {
        self.settings
            .rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown ROM".to_string())
    }

    fn draw(&self, frame: &mut ratatui::Frame, rom_name: &str) {
        // Exact size for the 64x32 display plus borders
        let game_width = (DISPLAY_WIDTH as u16) + 2;
        let game_height = (DISPLAY_HEIGHT as u16) + 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(game_height),
                Constraint::Length(7),
                Constraint::Min(0),
            ])
            .split(frame.area());

        let game_area = if chunks[0].width > game_width {
            let horizontal_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Min(0),
                    Constraint::Length(game_width),
                    Constraint::Min(0),
                ])
                .split(chunks[0]);
            horizontal_chunks[1]
        } else {
            chunks[0]
        };

        let mut screen = String::with_capacity(PIXEL_COUNT + DISPLAY_HEIGHT);
        for row in self.pixels.chunks(DISPLAY_WIDTH) {
            screen.extend(row.iter().map(|&p| if p == ON_COLOR { '█' } else { ' ' }));
            screen.push('\n');
        }
        let game_paragraph = Paragraph::new(screen)
            .block(Block::default().borders(Borders::ALL).title(rom_name))
            .style(Style::default().fg(Color::White));
        frame.render_widget(game_paragraph, game_area);

        let key_mapping = "Key Mapping (Esc quits):\n\
    1 2 3 4    →    1 2 3 C\n\
    Q W E R    →    4 5 6 D\n\
    A S D F    →    7 8 9 E\n\
    Z X C V    →    A 0 B F";
        let key_paragraph = Paragraph::new(key_mapping)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Keypad"))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(key_paragraph, chunks[1]);
    }

    /// Forwards pending key events to the keypad. Returns false once Esc is pressed.
    fn poll_input(&mut self) -> anyhow::Result<bool> {
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.code == KeyCode::Esc {
                return Ok(false);
            }
            if let Some(hex_key) = map_key(key.code) {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => self.chip8.press_key(hex_key),
                    KeyEventKind::Release => self.chip8.release_key(hex_key),
                }
            }
        }
        Ok(true)
    }

    fn update_sound(&self) {
        if let Some(tone) = &self.tone {
            tone.set_playing(self.chip8.sound_timer() > 0);
        }
    }

    fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.settings.frame_rate as f64);
        let rom_name = self.rom_name();

        loop {
            let frame_start = Instant::now();

            if !self.poll_input()? {
                info!("Emulation stopped by user");
                return Ok(());
            }

            for _ in 0..self.settings.cycles {
                let pc = self.chip8.pc();
                self.chip8
                    .execute()
                    .with_context(|| format!("Emulation halted at {pc:#05X}"))?;
            }

            self.chip8.render_to(&mut self.pixels);
            terminal.draw(|frame| self.draw(frame, &rom_name))?;

            self.update_sound();
            self.chip8.tick_timers();

            // Terminals rarely report key releases.
            self.chip8.release_all_keys();

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.main_loop(&mut terminal);

        if let Some(tone) = &self.tone {
            tone.set_playing(false);
        }
        terminal.clear()?;
        disable_raw_mode()?;
        result
    }
}
