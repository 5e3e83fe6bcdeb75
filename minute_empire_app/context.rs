use std::sync::Arc;

use crate::repository::{
    TroopActionRepository, TroopRepository, UserRepository, VillageRepository,
};
use crate::resources::ResourceService;
use crate::scheduler::TaskScheduler;

/// Dependencies handed to command and task handlers: the four repositories
/// and the scheduler. Constructed once by the bus.
#[derive(Clone)]
pub struct HandlerContext {
    pub users: Arc<dyn UserRepository>,
    pub villages: Arc<dyn VillageRepository>,
    pub troops: Arc<dyn TroopRepository>,
    pub troop_actions: Arc<dyn TroopActionRepository>,
    pub scheduler: Arc<TaskScheduler>,
}

impl HandlerContext {
    pub fn resource_service(&self) -> ResourceService {
        ResourceService::new(self.villages.clone())
    }
}
