mod troop_action_repository;
mod troop_repository;
mod user_repository;
mod village_repository;

pub use troop_action_repository::TroopActionRepository;
pub use troop_repository::TroopRepository;
pub use user_repository::UserRepository;
pub use village_repository::VillageRepository;
