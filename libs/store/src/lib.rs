pub mod client;
pub mod utils;
pub mod account {
    pub mod model;
    pub mod store;
}
pub mod block {
    pub mod adapter;
    pub mod model;
    pub mod store;
}
pub mod checkpoint {
    pub mod model;
    pub mod pretty;
    pub mod store;
}
pub mod transaction {
    pub mod adapter;
    pub mod model;
    pub mod store;
}
pub mod transfer {
    pub mod model;
    pub mod pretty;
    pub mod store;
}
