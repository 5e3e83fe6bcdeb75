#[cfg(any(test, feature = "test-utils"))]
#[cfg(not(tarpaulin_include))]
pub mod tests {
    use async_trait::async_trait;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use minute_empire_game::models::village::Village;
    use minute_empire_types::common::{DocId, User};
    use minute_empire_types::errors::{ApplicationError, DbError};
    use minute_empire_types::map::Location;
    use minute_empire_types::tasks::TroopAction;
    use minute_empire_types::troops::Troop;

    use crate::bus::AppBus;
    use crate::context::HandlerContext;
    use crate::repository::{
        TroopActionRepository, TroopRepository, UserRepository, VillageRepository,
    };
    use crate::scheduler::TaskScheduler;
    use crate::sockets::SocketRegistry;

    #[derive(Default, Clone)]
    pub struct MockUserRepository {
        users: Arc<Mutex<Vec<User>>>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn get_by_id(&self, id: &DocId) -> Result<User, ApplicationError> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.id == id)
                .cloned()
                .ok_or_else(|| ApplicationError::Db(DbError::UserNotFound(id.clone())))
        }

        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<User>, ApplicationError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn insert(&self, user: &User) -> Result<(), ApplicationError> {
            self.users.lock().unwrap().push(user.clone());
            Ok(())
        }

        async fn delete(&self, id: &DocId) -> Result<(), ApplicationError> {
            self.users.lock().unwrap().retain(|u| &u.id != id);
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct MockVillageRepository {
        villages: Arc<Mutex<HashMap<DocId, Village>>>,
    }

    #[async_trait]
    impl VillageRepository for MockVillageRepository {
        async fn get_by_id(&self, id: &DocId) -> Result<Village, ApplicationError> {
            self.villages
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ApplicationError::Db(DbError::VillageNotFound(id.clone())))
        }

        async fn list_by_owner(&self, owner_id: &DocId) -> Result<Vec<Village>, ApplicationError> {
            Ok(self
                .villages
                .lock()
                .unwrap()
                .values()
                .filter(|v| &v.owner_id == owner_id)
                .cloned()
                .collect())
        }

        async fn find_by_location(
            &self,
            location: Location,
        ) -> Result<Option<Village>, ApplicationError> {
            Ok(self
                .villages
                .lock()
                .unwrap()
                .values()
                .find(|v| v.location == location)
                .cloned())
        }

        async fn list_all(&self) -> Result<Vec<Village>, ApplicationError> {
            let mut villages: Vec<Village> =
                self.villages.lock().unwrap().values().cloned().collect();
            villages.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(villages)
        }

        async fn insert(&self, village: &Village) -> Result<(), ApplicationError> {
            self.villages
                .lock()
                .unwrap()
                .insert(village.id.clone(), village.clone());
            Ok(())
        }

        async fn save(&self, village: &Village) -> Result<(), ApplicationError> {
            self.villages
                .lock()
                .unwrap()
                .insert(village.id.clone(), village.clone());
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct MockTroopRepository {
        troops: Arc<Mutex<HashMap<DocId, Troop>>>,
    }

    #[async_trait]
    impl TroopRepository for MockTroopRepository {
        async fn get_by_id(&self, id: &DocId) -> Result<Troop, ApplicationError> {
            self.troops
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ApplicationError::Db(DbError::TroopNotFound(id.clone())))
        }

        async fn list_by_home(&self, village_id: &DocId) -> Result<Vec<Troop>, ApplicationError> {
            let mut troops: Vec<Troop> = self
                .troops
                .lock()
                .unwrap()
                .values()
                .filter(|t| &t.home_id == village_id)
                .cloned()
                .collect();
            troops.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(troops)
        }

        async fn list_at_location(
            &self,
            location: Location,
        ) -> Result<Vec<Troop>, ApplicationError> {
            let mut troops: Vec<Troop> = self
                .troops
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.location == location)
                .cloned()
                .collect();
            troops.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(troops)
        }

        async fn list_all(&self) -> Result<Vec<Troop>, ApplicationError> {
            let mut troops: Vec<Troop> = self.troops.lock().unwrap().values().cloned().collect();
            troops.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(troops)
        }

        async fn insert(&self, troop: &Troop) -> Result<(), ApplicationError> {
            self.troops
                .lock()
                .unwrap()
                .insert(troop.id.clone(), troop.clone());
            Ok(())
        }

        async fn save(&self, troop: &Troop) -> Result<(), ApplicationError> {
            self.troops
                .lock()
                .unwrap()
                .insert(troop.id.clone(), troop.clone());
            Ok(())
        }

        async fn delete(&self, id: &DocId) -> Result<(), ApplicationError> {
            self.troops.lock().unwrap().remove(id);
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct MockTroopActionRepository {
        actions: Arc<Mutex<HashMap<DocId, TroopAction>>>,
    }

    #[async_trait]
    impl TroopActionRepository for MockTroopActionRepository {
        async fn get_by_id(&self, id: &DocId) -> Result<TroopAction, ApplicationError> {
            self.actions
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ApplicationError::Db(DbError::TroopActionNotFound(id.clone())))
        }

        async fn list_unprocessed(&self) -> Result<Vec<TroopAction>, ApplicationError> {
            let mut actions: Vec<TroopAction> = self
                .actions
                .lock()
                .unwrap()
                .values()
                .filter(|a| !a.processed)
                .cloned()
                .collect();
            actions.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(actions)
        }

        async fn list_unprocessed_for_troop(
            &self,
            troop_id: &DocId,
        ) -> Result<Vec<TroopAction>, ApplicationError> {
            Ok(self
                .actions
                .lock()
                .unwrap()
                .values()
                .filter(|a| !a.processed && &a.troop_id == troop_id)
                .cloned()
                .collect())
        }

        async fn insert(&self, action: &TroopAction) -> Result<(), ApplicationError> {
            self.actions
                .lock()
                .unwrap()
                .insert(action.id.clone(), action.clone());
            Ok(())
        }

        async fn mark_processed(&self, id: &DocId) -> Result<(), ApplicationError> {
            let mut actions = self.actions.lock().unwrap();
            match actions.get_mut(id) {
                Some(action) => {
                    action.processed = true;
                    Ok(())
                }
                None => Err(ApplicationError::Db(DbError::TroopActionNotFound(
                    id.clone(),
                ))),
            }
        }
    }

    /// A fresh context over empty in-memory stores.
    pub fn mock_context() -> HandlerContext {
        HandlerContext {
            users: Arc::new(MockUserRepository::default()),
            villages: Arc::new(MockVillageRepository::default()),
            troops: Arc::new(MockTroopRepository::default()),
            troop_actions: Arc::new(MockTroopActionRepository::default()),
            scheduler: Arc::new(TaskScheduler::new()),
        }
    }

    pub fn mock_bus(ctx: HandlerContext) -> AppBus {
        AppBus::new(ctx, Arc::new(SocketRegistry::new()))
    }
}
