mod command_input;
mod confirm;
mod entry_form;
mod input;
mod key_result;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{ConfirmEvent, ConfirmPrompt};
pub use entry_form::{EntryForm, FormEvent};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
