pub mod command;
pub mod error;
pub mod event;
pub mod explorer;
pub mod gateway;
pub mod input;
pub mod modal;
pub mod program;
pub mod render;
pub mod rows;
pub mod viewport;

pub use crate::command::{Command, Dispatcher, Snapshot};
pub use crate::error::{ErrorInfo, ErrorKind, GatewayError, ProgramError, ValidationError};
pub use crate::event::{Event, Key, KeyCode, Size};
pub use crate::explorer::{Explorer, ExplorerConfig, Focus, Mode, Msg};
pub use crate::gateway::{FileStatusEntry, GitGateway, StatusGateway};
pub use crate::program::{Program, TaskFn, Transition};
