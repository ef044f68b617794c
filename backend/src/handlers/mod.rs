pub mod attendees;
pub mod email_templates;
pub mod events;
pub mod users;
