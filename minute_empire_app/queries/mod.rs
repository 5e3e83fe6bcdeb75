mod map_info;

pub use map_info::{
    MapBounds, MapInfo, MapTroop, MapVillage, OwnerInfo, ResourceInfo, VillageResources,
    map_info,
};
