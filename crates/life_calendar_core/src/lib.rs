pub mod domain;
pub mod entries;
pub mod ports;
pub mod query;
pub mod story;
pub mod summary;

pub use domain::{
    DailyEntry, EntryContent, EntryPatch, Meeting, Mood, NewStory, Story, Summary, Task, User,
    UserCredentials,
};
pub use ports::{DatabaseService, DateOrder, NarrativeService, PortError, PortResult};
pub use summary::{SummaryOutcome, SummaryRefresh};
