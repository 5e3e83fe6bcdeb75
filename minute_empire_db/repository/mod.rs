mod troop_action_repository;
mod troop_repository;
mod user_repository;
mod village_repository;

pub use troop_action_repository::PostgresTroopActionRepository;
pub use troop_repository::PostgresTroopRepository;
pub use user_repository::PostgresUserRepository;
pub use village_repository::PostgresVillageRepository;
