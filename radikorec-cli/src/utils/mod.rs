pub mod program_url;
pub mod time;
