mod memory;
mod models;
mod postgres;
mod querier;
mod store;

pub use self::{
    memory::MemoryStore,
    postgres::{DBPool, init_db, migrate},
    querier::{Direction, Querier},
    store::Store,
};
