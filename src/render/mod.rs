pub mod composite;
pub mod compositor;
pub mod hit_test;
pub mod viewport;
