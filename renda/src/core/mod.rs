mod config;
mod hotkey;
mod position;
mod position_list;
mod state;

pub use config::*;
pub use hotkey::*;
pub use position::*;
pub use position_list::*;
pub use state::*;
