pub(crate) mod ball;
mod client_bot;
mod core;
pub(crate) mod input;
mod network;
pub(crate) mod players;

pub use core::CorePlugin;
pub(crate) use core::UpdateSet;
pub use input::InputPlugin;
pub use network::NetworkPlugin;
pub use players::PlayersPlugin;
