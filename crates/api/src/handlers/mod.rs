pub mod documents;
pub mod published;
pub mod versions;
