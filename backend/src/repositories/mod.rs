pub mod attendee;
pub mod email_template;
pub mod event;
pub mod user;

pub use attendee::{AttendeeStore, PgAttendeeStore};
pub use email_template::{EmailTemplateStore, PgEmailTemplateStore};
pub use event::{EventStore, PgEventStore};
pub use user::{PgUserStore, UserStore};
