pub mod event;
pub mod pgevents;
