pub mod cli;
pub mod config;
pub mod favourites;
pub mod models;
pub mod storage;
pub mod tmdb;
