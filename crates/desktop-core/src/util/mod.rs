// Utility modules

pub mod detect;
pub mod downloads;
pub mod encode;
pub mod temp_files;
