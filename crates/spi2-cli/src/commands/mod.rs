pub mod evaluate;
pub mod optimize;
