mod accessibility;
mod alert;
mod hotkey;
mod pointer;

pub use accessibility::*;
pub use alert::*;
pub use hotkey::*;
pub use pointer::*;
