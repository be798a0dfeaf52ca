pub mod auth {
    pub mod models;
    pub mod session;
}
pub mod cache {
    pub mod models;
    pub mod offline;
}
pub mod config;
pub mod db {
    pub mod memory;
    pub mod models;
    pub mod repository;
    pub mod user_repository;
}
pub mod demo_seeder;
pub mod error;
pub mod export {
    pub mod format;
    pub mod pdf;
    pub mod share;
    pub mod text;
    pub mod word;
}
pub mod rendering {
    pub mod content;
}
pub mod search {
    pub mod filter;
}
pub mod service {
    pub mod documents;
    pub mod setup;
}
pub mod state;
