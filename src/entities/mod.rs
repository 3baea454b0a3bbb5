//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod donation_contract;
pub mod member;
pub mod notification;
pub mod payout_queue;
pub mod reward_history;
pub mod reward_pool;

// Re-export specific types to avoid conflicts
pub use donation_contract::{
    Column as DonationContractColumn, Entity as DonationContract, Model as DonationContractModel,
};
pub use member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
};
pub use payout_queue::{Column as PayoutQueueColumn, Entity as PayoutQueue, Model as PayoutQueueModel};
pub use reward_history::{
    Column as RewardHistoryColumn, Entity as RewardHistory, Model as RewardHistoryModel,
};
pub use reward_pool::{Column as RewardPoolColumn, Entity as RewardPool, Model as RewardPoolModel};
