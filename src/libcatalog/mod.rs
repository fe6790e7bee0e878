pub mod assets;
pub mod carousel;
pub mod choices;
pub mod db;
pub mod slug;
pub mod trivia;
