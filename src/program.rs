use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::time::Duration;

use smol::channel::{Receiver, Sender};
use termwiz::caps::Capabilities;
use termwiz::color::ColorAttribute;
use termwiz::input::{InputEvent, KeyEvent, Modifiers as TwModifiers};
use termwiz::surface::{Change, CursorVisibility, Surface};
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{Terminal, new_terminal};
use tracing::debug;

use crate::error::ProgramError;
use crate::event::{Event, Key, KeyCode, Size};

/// Asynchronous work whose output is fed back into `update`.
pub type TaskFn<Msg> = Pin<Box<dyn Future<Output = Msg> + Send + 'static>>;

pub type UpdateFn<Model, Msg> = Box<dyn FnMut(&mut Model, Msg) -> Transition<Msg>>;
pub type ViewFn<Model> = Box<dyn Fn(&Model, &mut Surface)>;
pub type EventFn<Msg> = Box<dyn Fn(Event) -> Option<Msg>>;

pub enum Transition<Msg> {
    Continue,
    Quit,
    Task(TaskFn<Msg>),
    Batch(Vec<TaskFn<Msg>>),
}

impl<Msg> std::fmt::Debug for Transition<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Continue => f.write_str("Continue"),
            Transition::Quit => f.write_str("Quit"),
            Transition::Task(_) => f.write_str("Task"),
            Transition::Batch(tasks) => write!(f, "Batch({})", tasks.len()),
        }
    }
}

/// Elm-style runtime: one model, one `update`, one `view`.
///
/// Messages are applied strictly one at a time. Task results travel through
/// a single FIFO channel and are applied in the order they complete.
pub struct Program<Model, Msg> {
    model: Model,
    update: UpdateFn<Model, Msg>,
    view: ViewFn<Model>,
    event_mapper: EventFn<Msg>,
    init: Option<Msg>,
    sender: Sender<Msg>,
    receiver: Receiver<Msg>,
}

impl<Model, Msg: Send + 'static> Program<Model, Msg> {
    pub fn new(
        model: Model,
        update: impl FnMut(&mut Model, Msg) -> Transition<Msg> + 'static,
        view: impl Fn(&Model, &mut Surface) + 'static,
    ) -> Self {
        let (sender, receiver) = smol::channel::unbounded();
        Self {
            model,
            update: Box::new(update),
            view: Box::new(view),
            event_mapper: Box::new(|_| None),
            init: None,
            sender,
            receiver,
        }
    }

    pub fn map_event(mut self, event_mapper: impl Fn(Event) -> Option<Msg> + 'static) -> Self {
        self.event_mapper = Box::new(event_mapper);
        self
    }

    /// Message applied once before the first frame.
    pub fn with_init(mut self, msg: Msg) -> Self {
        self.init = Some(msg);
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn run(mut self) -> Result<(), ProgramError> {
        let caps = Capabilities::new_from_env().map_err(ProgramError::from)?;
        let terminal = new_terminal(caps).map_err(ProgramError::from)?;
        let mut terminal = BufferedTerminal::new(terminal).map_err(ProgramError::from)?;

        // Enter alternate screen and raw mode for the duration of the loop.
        {
            let term = terminal.terminal();
            term.enter_alternate_screen().map_err(ProgramError::from)?;
            term.set_raw_mode().map_err(ProgramError::from)?;
        }

        let result = self.event_loop(&mut terminal);

        // Always attempt to restore terminal state.
        {
            let term = terminal.terminal();
            let _ = term.set_cooked_mode();
            let _ = term.exit_alternate_screen();
        }

        result
    }

    /// Feed a terminal event through the mapper and `update`.
    pub fn send(&mut self, event: Event) -> ControlFlow<()> {
        self.handle_event(event)
    }

    /// Apply a message directly, bypassing the event mapper.
    pub fn dispatch(&mut self, msg: Msg) -> ControlFlow<()> {
        self.apply(msg)
    }

    /// Wait for the next task result and apply it. Returns `None` once no
    /// more results can arrive.
    pub fn settle(&mut self) -> Option<ControlFlow<()>> {
        let msg = smol::block_on(self.receiver.recv()).ok()?;
        Some(self.apply(msg))
    }

    pub fn render_to(&self, surface: &mut Surface) {
        surface.add_change(Change::ClearScreen(ColorAttribute::Default));
        (self.view)(&self.model, surface);
    }

    fn event_loop<T: Terminal>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
    ) -> Result<(), ProgramError> {
        let (width, height) = terminal.dimensions();
        if self
            .handle_event(Event::Resize(Size::new(
                clamp_to_u16(width),
                clamp_to_u16(height),
            )))
            .is_break()
        {
            return Ok(());
        }
        if let Some(init) = self.init.take()
            && self.apply(init).is_break()
        {
            return Ok(());
        }

        terminal
            .terminal()
            .render(&[Change::CursorVisibility(CursorVisibility::Hidden)])?;
        self.render_to(terminal);
        terminal.flush()?;

        loop {
            let mut needs_render = false;
            let mut should_quit = false;

            if terminal.check_for_resize()? {
                let (width, height) = terminal.dimensions();
                let size = Size::new(clamp_to_u16(width), clamp_to_u16(height));
                should_quit |= self.handle_event(Event::Resize(size)).is_break();
                needs_render = true;
            }

            let mut input = terminal
                .terminal()
                .poll_input(Some(POLL_INTERVAL))
                .map_err(ProgramError::from)?;
            while let Some(event) = input {
                if let Some(event) = convert_input_event(event) {
                    should_quit |= self.handle_event(event).is_break();
                    needs_render = true;
                }
                if should_quit {
                    break;
                }
                input = terminal
                    .terminal()
                    .poll_input(Some(Duration::ZERO))
                    .map_err(ProgramError::from)?;
            }

            while !should_quit && let Ok(msg) = self.receiver.try_recv() {
                should_quit |= self.apply(msg).is_break();
                needs_render = true;
            }

            if should_quit {
                break;
            }

            if needs_render {
                // raw escape codes for `Synchronized Output` start
                terminal
                    .terminal()
                    .render(&[Change::Text("\x1b[?2026h".to_owned())])?;
                self.render_to(terminal);
                terminal.flush()?;
                // raw escape codes for `Synchronized Output` end
                terminal
                    .terminal()
                    .render(&[Change::Text("\x1b[?2026l".to_owned())])?;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> ControlFlow<()> {
        match (self.event_mapper)(event) {
            Some(msg) => self.apply(msg),
            None => ControlFlow::Continue(()),
        }
    }

    fn apply(&mut self, msg: Msg) -> ControlFlow<()> {
        match (self.update)(&mut self.model, msg) {
            Transition::Continue => {}
            Transition::Quit => return ControlFlow::Break(()),
            Transition::Task(task) => self.spawn(task),
            Transition::Batch(tasks) => tasks.into_iter().for_each(|task| self.spawn(task)),
        }
        ControlFlow::Continue(())
    }

    fn spawn(&self, task: TaskFn<Msg>) {
        let sender = self.sender.clone();
        smol::spawn(async move {
            let msg = task.await;
            // The receiver only goes away when the program has stopped.
            let _ = sender.send(msg).await;
        })
        .detach();
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(25);

fn convert_input_event(input: InputEvent) -> Option<Event> {
    debug!("termwiz input event: {:?}", input);
    match input {
        InputEvent::Key(key) => map_key_event(key),
        InputEvent::Resized { cols, rows } => Some(Event::Resize(Size::new(
            clamp_to_u16(cols),
            clamp_to_u16(rows),
        ))),
        _ => None,
    }
}

fn map_key_event(key: KeyEvent) -> Option<Event> {
    let code = map_key_code(key.key)?;
    let modifiers = key.modifiers;
    Some(Event::Key(Key::with_modifiers(
        code,
        modifiers.contains(TwModifiers::CTRL),
        modifiers.contains(TwModifiers::ALT),
        modifiers.contains(TwModifiers::SHIFT),
    )))
}

fn map_key_code(code: termwiz::input::KeyCode) -> Option<KeyCode> {
    use termwiz::input::KeyCode as TwKeyCode;

    match code {
        TwKeyCode::Char(c) => Some(KeyCode::Char(c)),
        TwKeyCode::Enter => Some(KeyCode::Enter),
        TwKeyCode::Escape => Some(KeyCode::Esc),
        TwKeyCode::Tab => Some(KeyCode::Tab),
        TwKeyCode::Backspace => Some(KeyCode::Backspace),
        TwKeyCode::Delete => Some(KeyCode::Delete),
        TwKeyCode::LeftArrow => Some(KeyCode::Left),
        TwKeyCode::RightArrow => Some(KeyCode::Right),
        TwKeyCode::UpArrow => Some(KeyCode::Up),
        TwKeyCode::DownArrow => Some(KeyCode::Down),
        TwKeyCode::Home => Some(KeyCode::Home),
        TwKeyCode::End => Some(KeyCode::End),
        TwKeyCode::PageUp => Some(KeyCode::PageUp),
        TwKeyCode::PageDown => Some(KeyCode::PageDown),
        _ => None,
    }
}

fn clamp_to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
