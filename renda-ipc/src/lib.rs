pub mod button;
pub mod command;

pub use button::ClickButton;
pub use command::{Command, PositionInfo, Response, StateInfo};
