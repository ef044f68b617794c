pub mod bulk;
pub mod import;
pub mod invitations;
