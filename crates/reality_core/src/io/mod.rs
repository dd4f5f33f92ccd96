pub mod frame;
pub mod prefs;
