use crate::runtime::{Countdown, SessionEvent};
use crate::session::{Phase, SessionEngine};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the caller should do after an event was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Redraw,
    Finished,
    Quit,
}

/// Maps terminal events onto a session and owns its countdown: armed while the
/// session runs, disarmed the moment it finishes or restarts.
#[derive(Debug)]
pub struct PracticeController {
    pub engine: SessionEngine,
    pub countdown: Countdown,
}

impl PracticeController {
    pub fn new(engine: SessionEngine) -> Self {
        Self::with_countdown(engine, Countdown::every_second())
    }

    pub fn with_countdown(engine: SessionEngine, countdown: Countdown) -> Self {
        Self { engine, countdown }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Flow {
        let flow = match event {
            SessionEvent::Closed => Flow::Quit,
            SessionEvent::Resize => Flow::Redraw,
            SessionEvent::Tick { epoch } => {
                let before = self.engine.phase();
                match self.engine.tick_epoch(epoch) {
                    Phase::Finished if before == Phase::Running => Flow::Finished,
                    _ => Flow::Redraw,
                }
            }
            SessionEvent::Key(key) => self.on_key(key),
        };
        self.sync_countdown();
        flow
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        match key.code {
            KeyCode::Tab => {
                self.engine.reset();
                Flow::Redraw
            }
            _ if self.engine.has_finished() => Flow::Continue,
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.engine.commit_word();
                Flow::Redraw
            }
            KeyCode::Backspace => {
                let mut input = self.engine.state().current_input.clone();
                input.pop();
                self.engine.update_input(&input);
                Flow::Redraw
            }
            KeyCode::Char(c) => {
                let mut input = self.engine.state().current_input.clone();
                input.push(c);
                self.engine.update_input(&input);
                Flow::Redraw
            }
            _ => Flow::Continue,
        }
    }

    fn sync_countdown(&mut self) {
        match self.engine.phase() {
            Phase::Running => self.countdown.arm(self.engine.epoch()),
            Phase::Idle | Phase::Finished => self.countdown.disarm(),
        }
    }
}
