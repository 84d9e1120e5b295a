//! Repository layer for data access

pub mod campaigns;
pub mod events;
pub mod recipients;

// Re-export concrete repository implementations
pub use campaigns::DbCampaignRepository;
pub use events::DbEventRepository;
pub use recipients::DbRecipientRepository;

// Re-export repository traits
pub use campaigns::CampaignRepository;
pub use events::EventRepository;
pub use recipients::RecipientRepository;
