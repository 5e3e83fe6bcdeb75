mod construction;
mod register;
mod train_troops;
mod troop_actions;

pub use construction::ConstructionCommandHandler;
pub use register::{RegisterPlayer, RegisterPlayerCommandHandler};
pub use train_troops::TrainTroopsCommandHandler;
pub use troop_actions::TroopActionCommandHandler;
