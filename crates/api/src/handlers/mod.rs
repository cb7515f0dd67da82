pub mod admin;
pub mod applications;
pub mod auth;
pub mod brands;
pub mod campaigns;
pub mod disputes;
pub mod me;
pub mod notifications;
pub mod payments;
pub mod push;
pub mod shipments;
pub mod storage;
pub mod tasks;
