pub mod messages;
pub mod world;
