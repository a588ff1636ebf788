pub mod db;
pub mod sink;
