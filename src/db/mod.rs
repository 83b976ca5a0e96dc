pub mod abstracts;
pub mod announcement;
pub mod author;
pub mod meeting;
pub mod page;
pub mod profile;
mod setup;
pub mod user;

pub use abstracts::{
    AbstractData, AbstractFilter, AbstractId, AbstractListUpdate, AbstractWithAuthors,
    PresentationType,
};
pub use announcement::{AnnouncementData, AnnouncementId};
pub use author::{AuthorData, AuthorFilter};
pub use meeting::{Meeting, MeetingData, MeetingId};
pub use page::{Page, PageId, titles};
pub use profile::ProfileData;
pub use user::{User, UserId};
