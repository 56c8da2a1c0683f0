pub mod dispatcher;
pub mod events;
pub mod info;
pub mod model;
pub mod reporter;
pub mod store;
pub mod worker;
