//! SeaORM entities shared between the migration crate and the application.

pub mod click_event;
pub mod click_visitor;
pub mod custom_domain;
pub mod link;
pub mod organization;
