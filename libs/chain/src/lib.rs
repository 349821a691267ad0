pub mod model;
pub mod source {
    pub mod file;
    pub mod handle;
}
